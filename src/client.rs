use std::cell::RefCell;

use thiserror::Error;

use crate::game_id::GameId;
use crate::reconcile::Reconciliation;
use crate::session::{ClickOutcome, GameSession, MoveTicket};
use crate::types::{Coordinate, HttpReply, MoveRequest};
use crate::view::BoardView;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request could not be built: {0}")]
    Request(String),
    #[error("network failure: {0}")]
    Network(String),
}

/// HTTP round trips against the game endpoint.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// `GET <endpoint>?id=<game>`
    async fn fetch_board(&self, game: &GameId) -> Result<HttpReply, TransportError>;
    /// `POST <endpoint>?id=<game>` with a JSON move body.
    async fn post_move(&self, game: &GameId, request: &MoveRequest) -> Result<HttpReply, TransportError>;
}

/// Builds `<endpoint>?id=<game>`, appending when the endpoint already has a query.
pub fn game_url(endpoint: &str, game: &GameId) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}id={game}")
}

/// Drives submissions for one game. The session borrow is only taken in the
/// synchronous halves, never across the network await.
pub struct MoveClient<T> {
    transport: T,
    game_id: GameId,
}

impl<T: Transport> MoveClient<T> {
    pub fn new(transport: T, game_id: GameId) -> Self {
        Self { transport, game_id }
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handles one board click, submitting when it completes a move.
    pub async fn click<V: BoardView>(
        &self,
        session: &RefCell<GameSession<V>>,
        at: Coordinate,
    ) -> ClickOutcome {
        let outcome = session.borrow_mut().click(at);
        if let ClickOutcome::Submitted(ticket) = outcome {
            self.submit(session, ticket).await;
        }
        outcome
    }

    pub async fn submit<V: BoardView>(
        &self,
        session: &RefCell<GameSession<V>>,
        ticket: MoveTicket,
    ) -> Option<Reconciliation> {
        let request = MoveRequest::new(ticket.from(), ticket.to());
        log::debug!("game {}: submitting {request:?}", self.game_id);

        let result = self.transport.post_move(&self.game_id, &request).await;
        session.borrow_mut().complete_move(ticket, result)
    }

    /// Fetches the current board and replaces the session position with it.
    pub async fn load<V: BoardView>(&self, session: &RefCell<GameSession<V>>) -> bool {
        let ticket = session.borrow_mut().begin_load();
        log::debug!("game {}: loading board", self.game_id);

        let result = self.transport.fetch_board(&self.game_id).await;
        session.borrow_mut().complete_load(ticket, result)
    }
}
