use crate::board::Position;
use crate::view::BoardView;

/// Replaces all piece imagery with `position`. Backgrounds, including the
/// focus highlight, are left alone.
pub fn render<V: BoardView + ?Sized>(view: &mut V, position: &Position) {
    view.clear_pieces();
    for (at, piece) in position.occupied() {
        view.place_piece(at, piece);
    }
}
