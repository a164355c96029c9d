use std::fmt;

use thiserror::Error;
use web_time::{SystemTime, UNIX_EPOCH};

pub const GAME_ID_MAX_LEN: usize = 64;

pub fn is_game_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// Opaque token tying requests to one server-side game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameId(String);

impl GameId {
    pub fn parse(value: &str) -> Result<Self, GameIdError> {
        if value.is_empty() {
            return Err(GameIdError::Empty);
        }
        if value.len() > GAME_ID_MAX_LEN {
            return Err(GameIdError::TooLong {
                max: GAME_ID_MAX_LEN,
                found: value.len(),
            });
        }
        for (idx, ch) in value.chars().enumerate() {
            if !is_game_id_char(ch) {
                return Err(GameIdError::InvalidCharacter { ch, index: idx });
            }
        }
        Ok(Self(value.to_string()))
    }

    /// Game id made of the unix time in milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.to_string())
    }

    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        Self::from_millis(millis)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for GameId {
    type Err = GameIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameIdError {
    #[error("game id is empty")]
    Empty,
    #[error("game id must be at most {max} chars, got {found}")]
    TooLong { max: usize, found: usize },
    #[error("invalid character '{ch}' at position {index}")]
    InvalidCharacter { ch: char, index: usize },
}

/// Game id chosen at startup and whether it must be written back to the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub game_id: GameId,
    pub rewrite_url: bool,
}

/// Picks the game id from the `id` query parameter, or mints one from the clock.
pub fn resolve(param: Option<&str>) -> Bootstrap {
    resolve_with(param, GameId::generate)
}

pub fn resolve_with(param: Option<&str>, mint: impl FnOnce() -> GameId) -> Bootstrap {
    let Some(raw) = param.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Bootstrap {
            game_id: mint(),
            rewrite_url: true,
        };
    };

    match GameId::parse(raw) {
        Ok(game_id) => Bootstrap {
            game_id,
            rewrite_url: false,
        },
        Err(err) => {
            log::warn!("ignoring game id {raw:?}: {err}");
            Bootstrap {
                game_id: mint(),
                rewrite_url: true,
            }
        }
    }
}
