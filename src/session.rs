use crate::board::Position;
use crate::client::TransportError;
use crate::optimistic::{self, UndoSnapshot};
use crate::reconcile::{self, Reconciliation};
use crate::render::render;
use crate::selection::{ClickIntent, Selection};
use crate::types::{Coordinate, HttpReply, SessionState, Side};
use crate::view::{BoardView, Notice};

/// Identifies one move submission. A reply is only applied when its ticket
/// still names the live pending move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTicket {
    epoch: u64,
    serial: u64,
    from: Coordinate,
    to: Coordinate,
}

impl MoveTicket {
    pub fn from(&self) -> Coordinate {
        self.from
    }

    pub fn to(&self) -> Coordinate {
        self.to
    }
}

/// Identifies one board load; superseded by any later load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A request is in flight; the click had no effect.
    Ignored,
    Selected(Coordinate),
    Cleared,
    Submitted(MoveTicket),
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    ticket: MoveTicket,
    undo: UndoSnapshot,
}

/// View state of one game: confirmed position, focus, and the single
/// in-flight request. Every method runs to completion without suspending,
/// so callers may hold it in a `RefCell` across awaits as long as they do not
/// keep the borrow alive over one.
pub struct GameSession<V> {
    view: V,
    position: Position,
    selection: Selection,
    player: Side,
    pending: Option<PendingMove>,
    loading: Option<LoadTicket>,
    epoch: u64,
    next_serial: u64,
}

impl<V: BoardView> GameSession<V> {
    /// Creates a session showing the starting layout until the server answers.
    pub fn new(mut view: V, player: Side) -> Self {
        let position = Position::starting();
        render(&mut view, &position);
        view.set_busy(false);
        Self {
            view,
            position,
            selection: Selection::new(),
            player,
            pending: None,
            loading: None,
            epoch: 0,
            next_serial: 0,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Last position confirmed by the server.
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn focus(&self) -> Option<Coordinate> {
        self.selection.focus()
    }

    pub fn player(&self) -> Side {
        self.player
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.loading.is_some()
    }

    pub fn state(&self, game_id: &str) -> SessionState {
        SessionState {
            game_id: game_id.to_string(),
            board: self.position.to_tokens(),
            focus: self.focus(),
            busy: self.is_busy(),
        }
    }

    pub fn click(&mut self, at: Coordinate) -> ClickOutcome {
        if self.is_busy() {
            log::debug!("click on {} ignored while a request is in flight", at.square_id());
            return ClickOutcome::Ignored;
        }

        match self.selection.intent(&self.position, at, self.player) {
            ClickIntent::Move { from, to } => {
                self.selection.clear(&mut self.view);
                match self.begin_move(from, to) {
                    Some(ticket) => ClickOutcome::Submitted(ticket),
                    None => ClickOutcome::Ignored,
                }
            }
            ClickIntent::Select(at) => match self.selection.refocus(&mut self.view, &self.position, at) {
                Ok(()) => ClickOutcome::Selected(at),
                Err(err) => {
                    log::warn!("{err}");
                    ClickOutcome::Cleared
                }
            },
            ClickIntent::Cancel => {
                self.selection.clear(&mut self.view);
                ClickOutcome::Cleared
            }
        }
    }

    /// Applies `from -> to` to the view and opens a submission cycle.
    /// Returns `None` while another request is in flight.
    pub fn begin_move(&mut self, from: Coordinate, to: Coordinate) -> Option<MoveTicket> {
        if self.is_busy() {
            return None;
        }

        self.next_serial += 1;
        let ticket = MoveTicket {
            epoch: self.epoch,
            serial: self.next_serial,
            from,
            to,
        };
        let undo = optimistic::apply(&mut self.view, from, to);
        self.pending = Some(PendingMove { ticket, undo });
        self.sync_busy();
        Some(ticket)
    }

    /// Resolves the submission named by `ticket`. Returns the action taken,
    /// or `None` when the reply was stale and dropped.
    pub fn complete_move(
        &mut self,
        ticket: MoveTicket,
        result: Result<HttpReply, TransportError>,
    ) -> Option<Reconciliation> {
        let pending = match self.pending {
            Some(pending) if pending.ticket == ticket => pending,
            _ => {
                log::info!(
                    "dropping stale reply for move {} -> {}",
                    ticket.from.square_id(),
                    ticket.to.square_id()
                );
                return None;
            }
        };
        self.pending = None;

        let action = reconcile::reconcile_result(result);
        match &action {
            Reconciliation::Commit(reply) => {
                self.position = reply.board;
                render(&mut self.view, &self.position);
                if reply.check {
                    self.view.notify(Notice::Check);
                }
                if reply.mate {
                    self.view.notify(Notice::Mate);
                }
            }
            Reconciliation::Reject { status, message } => {
                log::info!("move rejected with {status}: {message}");
                optimistic::rollback(&mut self.view, pending.undo);
                self.view.notify(Notice::Rejected(message.clone()));
            }
            Reconciliation::NoContent { message } => {
                self.view.notify(Notice::NoContent(message.clone()));
            }
            Reconciliation::MalformedRequest => {
                log::warn!("server reported a malformed move request");
                self.view.notify(Notice::MalformedRequest);
            }
            Reconciliation::Unhandled(err) => {
                log::error!("move submission failed: {err}");
                self.view.notify(Notice::UnexpectedResponse);
            }
        }

        self.sync_busy();
        Some(action)
    }

    /// Starts a fresh board fetch. Any pending move is rolled back and its
    /// eventual reply will be dropped.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.epoch += 1;
        if let Some(pending) = self.pending.take() {
            optimistic::rollback(&mut self.view, pending.undo);
        }
        self.selection.clear(&mut self.view);

        let ticket = LoadTicket { epoch: self.epoch };
        self.loading = Some(ticket);
        self.sync_busy();
        ticket
    }

    /// Returns `true` when the fetched board replaced the position.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<HttpReply, TransportError>,
    ) -> bool {
        if self.loading != Some(ticket) {
            log::info!("dropping superseded board load");
            return false;
        }
        self.loading = None;

        let loaded = match reconcile::reconcile_load(result) {
            Ok(reply) => {
                self.position = reply.board;
                render(&mut self.view, &self.position);
                true
            }
            Err(err) => {
                log::error!("board load failed: {err}");
                self.view.notify(Notice::LoadFailed);
                false
            }
        };

        self.sync_busy();
        loaded
    }

    fn sync_busy(&mut self) {
        let busy = self.is_busy();
        self.view.set_busy(busy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Piece, PieceKind};
    use crate::view::MemoryView;

    fn at(row: u8, col: u8) -> Coordinate {
        Coordinate::new(row, col).unwrap()
    }

    fn session() -> GameSession<MemoryView> {
        GameSession::new(MemoryView::new(), Side::Light)
    }

    fn ok_body(position: &Position, check: bool, mate: bool) -> HttpReply {
        let board = serde_json::to_string(position).unwrap();
        HttpReply::new(
            200,
            format!(r#"{{"Board":{board},"Check":{check},"Mate":{mate}}}"#),
        )
    }

    fn submit(session: &mut GameSession<MemoryView>, from: Coordinate, to: Coordinate) -> MoveTicket {
        assert_eq!(session.click(from), ClickOutcome::Selected(from));
        match session.click(to) {
            ClickOutcome::Submitted(ticket) => ticket,
            other => panic!("expected submission, got {other:?}"),
        }
    }

    fn assert_view_matches(session: &GameSession<MemoryView>, position: &Position) {
        for coord in Coordinate::all() {
            assert_eq!(session.view().piece(coord), position.piece_at(coord), "square {coord:?}");
            assert!(session.view().layer_count(coord) <= 1, "square {coord:?}");
        }
    }

    #[test]
    fn accepted_move_renders_server_position() {
        let mut session = session();
        let ticket = submit(&mut session, at(6, 4), at(4, 4));

        let mut confirmed = Position::starting();
        confirmed.set(at(4, 4), confirmed.piece_at(at(6, 4)));
        confirmed.set(at(6, 4), None);
        confirmed.set(at(3, 4), confirmed.piece_at(at(1, 4)));
        confirmed.set(at(1, 4), None);

        let action = session.complete_move(ticket, Ok(ok_body(&confirmed, false, false)));

        assert!(matches!(action, Some(Reconciliation::Commit(_))));
        assert_eq!(session.position(), &confirmed);
        assert_view_matches(&session, &confirmed);
        assert!(session.view().notices().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn move_view_changes_but_position_waits_for_server() {
        let mut session = session();
        submit(&mut session, at(6, 4), at(4, 4));

        assert_eq!(session.position(), &Position::starting());
        assert_eq!(session.view().piece(at(6, 4)), None);
        assert_eq!(
            session.view().piece(at(4, 4)),
            Some(Piece::new(PieceKind::Pawn, Side::Light))
        );
        assert!(session.is_busy());
        assert!(session.view().is_busy());
        assert_eq!(session.focus(), None);
        assert!(session.view().highlighted().is_empty());
    }

    #[test]
    fn every_rejection_status_rolls_back() {
        for status in [403u16, 406, 206] {
            let mut session = session();
            let ticket = submit(&mut session, at(7, 3), at(1, 3));

            session.complete_move(ticket, Ok(HttpReply::new(status, "Not a valid move\n")));

            assert_view_matches(&session, &Position::starting());
            assert_eq!(
                session.view().notices(),
                &[Notice::Rejected("Not a valid move".to_string())],
                "status {status}"
            );
            assert!(!session.view().is_busy());
        }
    }

    #[test]
    fn rejected_move_to_empty_square_leaves_it_empty() {
        let mut session = session();
        let ticket = submit(&mut session, at(7, 1), at(4, 4));

        session.complete_move(ticket, Ok(HttpReply::new(406, "Not a valid move")));

        assert_eq!(session.view().piece(at(4, 4)), None);
        assert_eq!(
            session.view().piece(at(7, 1)),
            Some(Piece::new(PieceKind::Knight, Side::Light))
        );
    }

    #[test]
    fn no_content_and_errors_leave_view_as_is() {
        let cases = [
            (
                Ok(HttpReply::new(204, "No moves left for me :( ")),
                Notice::NoContent("No moves left for me :(".to_string()),
            ),
            (Ok(HttpReply::new(400, "")), Notice::MalformedRequest),
            (Ok(HttpReply::new(502, "")), Notice::UnexpectedResponse),
            (
                Err(TransportError::Network("offline".to_string())),
                Notice::UnexpectedResponse,
            ),
        ];

        for (result, notice) in cases {
            let mut session = session();
            let ticket = submit(&mut session, at(6, 4), at(4, 4));

            let action = session.complete_move(ticket, result).unwrap();

            assert!(!action.rolls_back());
            assert!(!action.replaces_board());
            assert_eq!(session.view().piece(at(6, 4)), None);
            assert!(session.view().piece(at(4, 4)).is_some());
            assert_eq!(session.position(), &Position::starting());
            assert_eq!(session.view().notices(), &[notice]);
            assert!(!session.view().is_busy());
            assert!(!session.is_busy());
        }
    }

    #[test]
    fn check_and_mate_notices_fire_independently() {
        let mut session = session();
        let ticket = submit(&mut session, at(6, 4), at(4, 4));

        session.complete_move(ticket, Ok(ok_body(&Position::starting(), true, true)));

        assert_eq!(session.view().notices(), &[Notice::Check, Notice::Mate]);
        assert!(session.view().notices().iter().all(Notice::is_deferred));
    }

    #[test]
    fn clicks_are_ignored_while_move_is_in_flight() {
        let mut session = session();
        let ticket = submit(&mut session, at(6, 4), at(4, 4));

        assert_eq!(session.click(at(6, 3)), ClickOutcome::Ignored);
        assert_eq!(session.click(at(4, 3)), ClickOutcome::Ignored);
        assert_eq!(session.begin_move(at(6, 3), at(4, 3)), None);
        assert_eq!(session.focus(), None);

        session.complete_move(ticket, Ok(HttpReply::new(406, "Not a valid move")));

        assert_view_matches(&session, &Position::starting());
        assert_eq!(session.click(at(6, 3)), ClickOutcome::Selected(at(6, 3)));
    }

    #[test]
    fn stale_ticket_does_not_consume_live_snapshot() {
        let mut session = session();
        let first = submit(&mut session, at(6, 4), at(4, 4));
        session.complete_move(first, Ok(HttpReply::new(406, "no")));
        let second = submit(&mut session, at(6, 3), at(4, 3));

        assert_eq!(
            session.complete_move(first, Ok(HttpReply::new(406, "late"))),
            None
        );
        assert!(session.is_busy());

        session.complete_move(second, Ok(HttpReply::new(403, "wrong turn")));
        assert_view_matches(&session, &Position::starting());
    }

    #[test]
    fn reload_rolls_back_and_drops_late_move_reply() {
        let mut session = session();
        let ticket = submit(&mut session, at(6, 4), at(4, 4));

        let load = session.begin_load();
        assert_view_matches(&session, &Position::starting());
        assert!(session.is_busy());

        let mut moved = Position::starting();
        moved.set(at(4, 4), moved.piece_at(at(6, 4)));
        moved.set(at(6, 4), None);
        assert_eq!(
            session.complete_move(ticket, Ok(ok_body(&moved, false, false))),
            None
        );
        assert_eq!(session.position(), &Position::starting());

        assert!(session.complete_load(load, Ok(ok_body(&Position::starting(), false, false))));
        assert!(!session.is_busy());
    }

    #[test]
    fn superseded_load_is_dropped() {
        let mut session = session();
        let first = session.begin_load();
        let second = session.begin_load();

        assert!(!session.complete_load(first, Ok(ok_body(&Position::empty(), false, false))));
        assert!(session.is_busy());
        assert!(session.complete_load(second, Ok(ok_body(&Position::empty(), false, false))));
        assert_eq!(session.position(), &Position::empty());
        assert_view_matches(&session, &Position::empty());
    }

    #[test]
    fn failed_load_notifies_and_keeps_board() {
        let mut session = session();
        let load = session.begin_load();

        assert!(!session.complete_load(load, Ok(HttpReply::new(500, "boom"))));

        assert_eq!(session.view().notices(), &[Notice::LoadFailed]);
        assert_eq!(session.position(), &Position::starting());
        assert_eq!(session.view().busy_history().last(), Some(&false));
    }

    #[test]
    fn at_most_one_square_is_ever_highlighted() {
        let mut session = session();
        let clicks = [
            at(6, 0),
            at(6, 1),
            at(7, 6),
            at(3, 3),
            at(1, 1),
            at(7, 7),
            at(7, 7),
            at(0, 0),
        ];

        for click in clicks {
            if let ClickOutcome::Submitted(ticket) = session.click(click) {
                session.complete_move(ticket, Ok(HttpReply::new(406, "no")));
            }
            assert!(session.view().highlighted().len() <= 1, "after {click:?}");
        }
    }

    #[test]
    fn state_reports_confirmed_board_and_focus() {
        let mut session = session();
        session.click(at(6, 4));

        let state = session.state("1700000000000");

        assert_eq!(state.game_id, "1700000000000");
        assert_eq!(state.focus, Some(at(6, 4)));
        assert_eq!(state.board[6][4], "P");
        assert_eq!(state.board[0][4], "K'");
        assert!(!state.busy);
    }
}
