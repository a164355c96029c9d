use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Position;

pub const BOARD_WIDTH: u8 = 8;

/// A board coordinate. Row 0 is the dark back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    row: u8,
    col: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("coordinate ({row}, {col}) is off the board")]
pub struct CoordError {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    pub fn new(row: u8, col: u8) -> Result<Self, CoordError> {
        if row >= BOARD_WIDTH || col >= BOARD_WIDTH {
            return Err(CoordError {
                row: row as i32,
                col: col as i32,
            });
        }
        Ok(Self { row, col })
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// Parses the two-digit square element id (`"64"` is row 6, col 4).
    pub fn from_square_id(id: &str) -> Option<Self> {
        let mut digits = id.chars().map(|ch| ch.to_digit(10));
        let row = digits.next()??;
        let col = digits.next()??;
        if digits.next().is_some() {
            return None;
        }
        Self::new(row as u8, col as u8).ok()
    }

    pub fn square_id(self) -> String {
        format!("{}{}", self.row, self.col)
    }

    /// Iterates every square in row-major order.
    pub fn all() -> impl Iterator<Item = Coordinate> {
        (0..BOARD_WIDTH).flat_map(|row| (0..BOARD_WIDTH).map(move |col| Coordinate { row, col }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Light,
    Dark,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Light => Side::Dark,
            Side::Dark => Side::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'K' => Some(PieceKind::King),
            'Q' => Some(PieceKind::Queen),
            'R' => Some(PieceKind::Rook),
            'B' => Some(PieceKind::Bishop),
            'N' => Some(PieceKind::Knight),
            'P' => Some(PieceKind::Pawn),
            _ => None,
        }
    }

    fn asset_name(self) -> &'static str {
        match self {
            PieceKind::King => "king",
            PieceKind::Queen => "queen",
            PieceKind::Rook => "rook",
            PieceKind::Bishop => "bishop",
            PieceKind::Knight => "knight",
            PieceKind::Pawn => "pawn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub const fn new(kind: PieceKind, side: Side) -> Self {
        Self { kind, side }
    }

    /// Image asset shown for this piece, e.g. `1x/w_pawn_1x.png`.
    pub fn image_src(self) -> String {
        let prefix = match self.side {
            Side::Light => 'w',
            Side::Dark => 'b',
        };
        format!("1x/{prefix}_{}_1x.png", self.kind.asset_name())
    }

    /// Reverse of [`Piece::image_src`]; accepts absolute URLs as the DOM reports them.
    pub fn from_image_src(src: &str) -> Option<Self> {
        let file = src.rsplit('/').next()?;
        let mut parts = file.split('_');
        let side = match parts.next()? {
            "w" => Side::Light,
            "b" => Side::Dark,
            _ => return None,
        };
        let kind = match parts.next()? {
            "king" => PieceKind::King,
            "queen" => PieceKind::Queen,
            "rook" => PieceKind::Rook,
            "bishop" => PieceKind::Bishop,
            "knight" => PieceKind::Knight,
            "pawn" => PieceKind::Pawn,
            _ => return None,
        };
        Some(Self { kind, side })
    }
}

/// Body of `POST <endpoint>?id=<game>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "FromRow")]
    pub from_row: u8,
    #[serde(rename = "FromCol")]
    pub from_col: u8,
    #[serde(rename = "ToRow")]
    pub to_row: u8,
    #[serde(rename = "ToCol")]
    pub to_col: u8,
}

impl MoveRequest {
    pub fn new(from: Coordinate, to: Coordinate) -> Self {
        Self {
            from_row: from.row(),
            from_col: from.col(),
            to_row: to.row(),
            to_col: to.col(),
        }
    }
}

/// 200 body of both `GET` and `POST`. `GET` replies carry no check/mate flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoardReply {
    #[serde(rename = "Board")]
    pub board: Position,
    #[serde(rename = "Check", default)]
    pub check: bool,
    #[serde(rename = "Mate", default)]
    pub mate: bool,
}

/// Raw status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Public session state returned from WASM APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub game_id: String,
    /// Square tokens of the last server-confirmed position.
    pub board: Vec<Vec<String>>,
    pub focus: Option<Coordinate>,
    /// Contract:
    /// - `true` while a move submission or board load is in flight.
    /// - clicks are ignored while `true`.
    pub busy: bool,
}
