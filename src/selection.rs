use thiserror::Error;

use crate::board::Position;
use crate::types::{Coordinate, Side};
use crate::view::BoardView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("cannot focus empty square {0:?}")]
    EmptySquare(Coordinate),
}

/// What a board click means given the current focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickIntent {
    Move { from: Coordinate, to: Coordinate },
    Select(Coordinate),
    Cancel,
}

/// Focused source square. At most one square is highlighted at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    focus: Option<Coordinate>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Option<Coordinate> {
        self.focus
    }

    /// Focuses `at`. Turn order is left to the server; only emptiness is checked.
    pub fn select<V: BoardView + ?Sized>(
        &mut self,
        view: &mut V,
        position: &Position,
        at: Coordinate,
    ) -> Result<(), SelectionError> {
        if position.piece_at(at).is_none() {
            return Err(SelectionError::EmptySquare(at));
        }
        self.clear(view);
        self.focus = Some(at);
        view.set_highlight(at, true);
        Ok(())
    }

    pub fn clear<V: BoardView + ?Sized>(&mut self, view: &mut V) {
        if let Some(at) = self.focus.take() {
            view.set_highlight(at, false);
        }
    }

    pub fn refocus<V: BoardView + ?Sized>(
        &mut self,
        view: &mut V,
        position: &Position,
        at: Coordinate,
    ) -> Result<(), SelectionError> {
        self.clear(view);
        self.select(view, position, at)
    }

    /// Classifies a click on `at` for a player moving `player` pieces.
    /// This is not legality checking: illegal moves still reach the server.
    pub fn intent(&self, position: &Position, at: Coordinate, player: Side) -> ClickIntent {
        let own_piece = position
            .piece_at(at)
            .is_some_and(|piece| piece.side == player);

        match self.focus {
            Some(from) if !own_piece => ClickIntent::Move { from, to: at },
            _ if own_piece => ClickIntent::Select(at),
            _ => ClickIntent::Cancel,
        }
    }
}
