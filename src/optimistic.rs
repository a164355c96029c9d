use crate::types::{Coordinate, Piece};
use crate::view::BoardView;

/// What a speculative move overwrote, enough to put both squares back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoSnapshot {
    pub from: Coordinate,
    pub to: Coordinate,
    /// Piece carried away from `from`.
    pub moved: Option<Piece>,
    /// Piece shown on `to` before the move, `None` when it was empty.
    pub displaced: Option<Piece>,
}

/// Moves the piece image on `from` onto `to` before the server has confirmed
/// anything. Only the view changes; the confirmed position is untouched.
pub fn apply<V: BoardView + ?Sized>(view: &mut V, from: Coordinate, to: Coordinate) -> UndoSnapshot {
    let snapshot = UndoSnapshot {
        from,
        to,
        moved: view.piece(from),
        displaced: view.piece(to),
    };

    view.set_piece(to, snapshot.moved);
    view.remove_piece(from);
    snapshot
}

/// Reverses exactly the mutation recorded in `snapshot`.
pub fn rollback<V: BoardView + ?Sized>(view: &mut V, snapshot: UndoSnapshot) {
    view.set_piece(snapshot.to, snapshot.displaced);
    view.set_piece(snapshot.from, snapshot.moved);
}
