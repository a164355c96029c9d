use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{BOARD_WIDTH, Coordinate, Piece, PieceKind, Side};

const BOARD_SIZE: usize = BOARD_WIDTH as usize;
const EMPTY_TOKEN: &str = "-";
const DARK_MARK: char = '\'';
const BACK_RANK: [PieceKind; BOARD_SIZE] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown square token {0:?}")]
    UnknownToken(String),
    #[error("board must have 8 rows, got {0}")]
    RowCount(usize),
    #[error("board row {row} must have 8 squares, got {found}")]
    RowLength { row: usize, found: usize },
}

/// Chess position as the server reports it.
/// Decoded from and encoded to the `Board` token matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct Position {
    squares: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Position {
    pub fn empty() -> Self {
        Self {
            squares: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Creates the standard starting layout:
    /// dark pieces on rows 0-1, light pieces on rows 6-7.
    pub fn starting() -> Self {
        let mut position = Self::empty();
        for (col, kind) in BACK_RANK.into_iter().enumerate() {
            position.squares[0][col] = Some(Piece::new(kind, Side::Dark));
            position.squares[1][col] = Some(Piece::new(PieceKind::Pawn, Side::Dark));
            position.squares[6][col] = Some(Piece::new(PieceKind::Pawn, Side::Light));
            position.squares[7][col] = Some(Piece::new(kind, Side::Light));
        }
        position
    }

    pub fn piece_at(&self, coord: Coordinate) -> Option<Piece> {
        self.squares[coord.row() as usize][coord.col() as usize]
    }

    pub fn set(&mut self, coord: Coordinate, piece: Option<Piece>) {
        self.squares[coord.row() as usize][coord.col() as usize] = piece;
    }

    /// Returns `(coordinate, piece)` for every occupied square, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (Coordinate, Piece)> + '_ {
        Coordinate::all().filter_map(|coord| self.piece_at(coord).map(|piece| (coord, piece)))
    }

    pub fn to_tokens(&self) -> Vec<Vec<String>> {
        self.squares
            .iter()
            .map(|row| row.iter().map(|square| encode_square(*square)).collect())
            .collect()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl TryFrom<Vec<Vec<String>>> for Position {
    type Error = DecodeError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        if rows.len() != BOARD_SIZE {
            return Err(DecodeError::RowCount(rows.len()));
        }

        let mut position = Self::empty();
        for (row, tokens) in rows.iter().enumerate() {
            if tokens.len() != BOARD_SIZE {
                return Err(DecodeError::RowLength {
                    row,
                    found: tokens.len(),
                });
            }
            for (col, token) in tokens.iter().enumerate() {
                position.squares[row][col] = decode_square(token)?;
            }
        }
        Ok(position)
    }
}

impl From<Position> for Vec<Vec<String>> {
    fn from(position: Position) -> Self {
        position.to_tokens()
    }
}

/// Decodes one square token: `"-"` is empty, `"K"` a light king, `"K'"` a dark king.
pub fn decode_square(token: &str) -> Result<Option<Piece>, DecodeError> {
    if token == EMPTY_TOKEN {
        return Ok(None);
    }

    let unknown = || DecodeError::UnknownToken(token.to_string());
    let mut chars = token.chars();
    let kind = chars.next().and_then(PieceKind::from_letter).ok_or_else(unknown)?;
    let side = match chars.next() {
        None => Side::Light,
        Some(DARK_MARK) => Side::Dark,
        Some(_) => return Err(unknown()),
    };
    if chars.next().is_some() {
        return Err(unknown());
    }

    Ok(Some(Piece::new(kind, side)))
}

pub fn encode_square(square: Option<Piece>) -> String {
    match square {
        None => EMPTY_TOKEN.to_string(),
        Some(Piece {
            kind,
            side: Side::Light,
        }) => kind.letter().to_string(),
        Some(Piece {
            kind,
            side: Side::Dark,
        }) => format!("{}{DARK_MARK}", kind.letter()),
    }
}
