use std::collections::HashSet;

use crate::types::{BOARD_WIDTH, Coordinate, Piece};

const BOARD_SIZE: usize = BOARD_WIDTH as usize;

/// User-visible notifications raised by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Server refused the move (403, 406, 206); carries the server text.
    Rejected(String),
    /// Server accepted the request but returned no position (204).
    NoContent(String),
    MalformedRequest,
    UnexpectedResponse,
    LoadFailed,
    Check,
    Mate,
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Rejected(message) | Notice::NoContent(message) => message,
            Notice::MalformedRequest => "Oops something went wrong in the request",
            Notice::UnexpectedResponse => "Oops ! Cannot handle unexpected response",
            Notice::LoadFailed => "Cannot handle unexpected response",
            Notice::Check => "CHECK !",
            Notice::Mate => "And Mate :| ",
        }
    }

    /// Check and mate are shown after a short delay so the committed board paints first.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Notice::Check | Notice::Mate)
    }
}

/// Rendered board surface. Piece imagery and square backgrounds are separate
/// layers: piece operations never touch backgrounds and vice versa.
pub trait BoardView {
    /// Top piece image shown on `at`.
    fn piece(&self, at: Coordinate) -> Option<Piece>;
    /// Adds one piece image on `at` above whatever is there.
    fn place_piece(&mut self, at: Coordinate, piece: Piece);
    /// Removes every piece image on `at`.
    fn remove_piece(&mut self, at: Coordinate);
    /// Removes every piece image on the board.
    fn clear_pieces(&mut self);
    fn set_highlight(&mut self, at: Coordinate, on: bool);
    fn set_busy(&mut self, busy: bool);
    fn notify(&mut self, notice: Notice);

    fn set_piece(&mut self, at: Coordinate, piece: Option<Piece>) {
        self.remove_piece(at);
        if let Some(piece) = piece {
            self.place_piece(at, piece);
        }
    }
}

/// In-memory view used off-browser and by tests. Records every busy toggle
/// and notice so callers can inspect what a user would have seen.
#[derive(Debug, Clone, Default)]
pub struct MemoryView {
    layers: [[Vec<Piece>; BOARD_SIZE]; BOARD_SIZE],
    highlighted: HashSet<Coordinate>,
    busy: bool,
    busy_history: Vec<bool>,
    notices: Vec<Notice>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of piece images stacked on `at`.
    pub fn layer_count(&self, at: Coordinate) -> usize {
        self.layers[at.row() as usize][at.col() as usize].len()
    }

    pub fn highlighted(&self) -> Vec<Coordinate> {
        let mut squares: Vec<_> = self.highlighted.iter().copied().collect();
        squares.sort_by_key(|coord| (coord.row(), coord.col()));
        squares
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn busy_history(&self) -> &[bool] {
        &self.busy_history
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl BoardView for MemoryView {
    fn piece(&self, at: Coordinate) -> Option<Piece> {
        self.layers[at.row() as usize][at.col() as usize].last().copied()
    }

    fn place_piece(&mut self, at: Coordinate, piece: Piece) {
        self.layers[at.row() as usize][at.col() as usize].push(piece);
    }

    fn remove_piece(&mut self, at: Coordinate) {
        self.layers[at.row() as usize][at.col() as usize].clear();
    }

    fn clear_pieces(&mut self) {
        self.layers.iter_mut().flatten().for_each(Vec::clear);
    }

    fn set_highlight(&mut self, at: Coordinate, on: bool) {
        if on {
            self.highlighted.insert(at);
        } else {
            self.highlighted.remove(&at);
        }
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.busy_history.push(busy);
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
