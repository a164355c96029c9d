use thiserror::Error;

use crate::client::TransportError;
use crate::types::{BoardReply, HttpReply};

pub const STATUS_OK: u16 = 200;
pub const STATUS_NO_CONTENT: u16 = 204;
pub const STATUS_PARTIAL: u16 = 206;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_FORBIDDEN: u16 = 403;
pub const STATUS_NOT_ACCEPTABLE: u16 = 406;

/// Failures the client cannot recover from locally; surfaced generically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("unexpected response status {0}")]
    UnexpectedStatus(u16),
    #[error("undecodable board reply: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// UI action owed for one move response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// 200: server truth replaces the board.
    Commit(BoardReply),
    /// 403, 406, 206: undo the speculative move.
    Reject { status: u16, message: String },
    /// 204: server has no position to give back.
    NoContent { message: String },
    /// 400
    MalformedRequest,
    Unhandled(ClientError),
}

impl Reconciliation {
    pub fn rolls_back(&self) -> bool {
        matches!(self, Reconciliation::Reject { .. })
    }

    pub fn replaces_board(&self) -> bool {
        matches!(self, Reconciliation::Commit(_))
    }

    pub fn notifies(&self) -> bool {
        match self {
            Reconciliation::Commit(reply) => reply.check || reply.mate,
            _ => true,
        }
    }
}

/// Maps a move response to its action. Pure: no view or network access.
pub fn reconcile(status: u16, body: &str) -> Reconciliation {
    match status {
        STATUS_OK => match serde_json::from_str::<BoardReply>(body) {
            Ok(reply) => Reconciliation::Commit(reply),
            Err(err) => Reconciliation::Unhandled(ClientError::InvalidBody(err.to_string())),
        },
        STATUS_NOT_ACCEPTABLE | STATUS_FORBIDDEN | STATUS_PARTIAL => Reconciliation::Reject {
            status,
            message: body.trim_end().to_string(),
        },
        STATUS_NO_CONTENT => Reconciliation::NoContent {
            message: body.trim_end().to_string(),
        },
        STATUS_BAD_REQUEST => Reconciliation::MalformedRequest,
        other => Reconciliation::Unhandled(ClientError::UnexpectedStatus(other)),
    }
}

pub fn reconcile_result(result: Result<HttpReply, TransportError>) -> Reconciliation {
    match result {
        Ok(reply) => reconcile(reply.status, &reply.body),
        Err(err) => Reconciliation::Unhandled(err.into()),
    }
}

/// Decodes the reply to a board fetch. Only 200 with a valid board is usable.
pub fn reconcile_load(result: Result<HttpReply, TransportError>) -> Result<BoardReply, ClientError> {
    let reply = result?;
    if reply.status != STATUS_OK {
        return Err(ClientError::UnexpectedStatus(reply.status));
    }
    serde_json::from_str(&reply.body).map_err(|err| ClientError::InvalidBody(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;

    fn board_body(check: bool, mate: bool) -> String {
        let board = serde_json::to_string(&Position::starting()).unwrap();
        format!(r#"{{"Board":{board},"Check":{check},"Mate":{mate}}}"#)
    }

    #[test]
    fn status_table_maps_to_rollback_notify_replace() {
        // (status, body, rolls_back, notifies, replaces_board)
        let cases = [
            (200, board_body(false, false), false, false, true),
            (200, board_body(true, false), false, true, true),
            (204, "No moves left for me :( \n".to_string(), false, true, false),
            (206, "No element found\n".to_string(), true, true, false),
            (400, String::new(), false, true, false),
            (403, "Cannot move here, King will be in CHECK state\n".to_string(), true, true, false),
            (406, "Not a valid move\n".to_string(), true, true, false),
            (404, "404 not found.".to_string(), false, true, false),
            (500, String::new(), false, true, false),
        ];

        for (status, body, rolls_back, notifies, replaces) in cases {
            let action = reconcile(status, &body);
            assert_eq!(action.rolls_back(), rolls_back, "status {status}");
            assert_eq!(action.notifies(), notifies, "status {status}");
            assert_eq!(action.replaces_board(), replaces, "status {status}");
        }
    }

    #[test]
    fn rejections_keep_server_message() {
        assert_eq!(
            reconcile(406, "Not a valid move\n"),
            Reconciliation::Reject {
                status: 406,
                message: "Not a valid move".to_string()
            }
        );
        assert_eq!(
            reconcile(204, "No moves left for me :( \n"),
            Reconciliation::NoContent {
                message: "No moves left for me :(".to_string()
            }
        );
    }

    #[test]
    fn commit_carries_check_and_mate_flags() {
        let Reconciliation::Commit(reply) = reconcile(200, &board_body(true, true)) else {
            panic!("expected commit");
        };
        assert!(reply.check);
        assert!(reply.mate);
        assert_eq!(reply.board, Position::starting());
    }

    #[test]
    fn undecodable_ok_body_is_unhandled() {
        let action = reconcile(200, r#"{"Board":[["X"]]}"#);

        assert!(matches!(
            action,
            Reconciliation::Unhandled(ClientError::InvalidBody(_))
        ));
        assert!(!action.rolls_back());
        assert!(!action.replaces_board());
    }

    #[test]
    fn transport_failure_is_unhandled() {
        let err = TransportError::Network("offline".to_string());

        assert_eq!(
            reconcile_result(Err(err.clone())),
            Reconciliation::Unhandled(ClientError::Transport(err))
        );
    }

    #[test]
    fn load_accepts_board_without_flags() {
        let board = serde_json::to_string(&Position::starting()).unwrap();
        let body = format!(r#"{{"Board":{board}}}"#);

        let reply = reconcile_load(Ok(HttpReply::new(200, body))).unwrap();
        assert_eq!(reply.board, Position::starting());
        assert!(!reply.check && !reply.mate);

        assert_eq!(
            reconcile_load(Ok(HttpReply::new(500, ""))),
            Err(ClientError::UnexpectedStatus(500))
        );
    }
}
