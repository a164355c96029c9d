use once_cell::sync::Lazy;

use crate::types::Side;

pub const FALLBACK_ENDPOINT: &str = "https://sdscoep.club/engine/api/";
pub const DEFAULT_NOTICE_DELAY_MS: u32 = 500;
pub const DEFAULT_CONTAINER_ID: &str = "chess-container";
pub const DEFAULT_LOADER_ID: &str = "loader";

/// Build-time endpoint override, falling back to the public server.
pub static DEFAULT_ENDPOINT: Lazy<String> = Lazy::new(|| {
    option_env!("REMOTE_CHESS_ENDPOINT")
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .unwrap_or(FALLBACK_ENDPOINT)
        .to_string()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    /// Side whose pieces a click may focus.
    pub player: Side,
    /// Delay before check/mate notices are shown.
    pub notice_delay_ms: u32,
    pub container_id: String,
    pub loader_id: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: (*DEFAULT_ENDPOINT).clone(),
            player: Side::Light,
            notice_delay_ms: DEFAULT_NOTICE_DELAY_MS,
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            loader_id: DEFAULT_LOADER_ID.to_string(),
        }
    }
}

impl ClientConfig {
    /// Replaces the endpoint with a page-supplied one; blank values are ignored.
    pub fn with_endpoint(mut self, endpoint: Option<&str>) -> Self {
        if let Some(endpoint) = endpoint.map(str::trim).filter(|raw| !raw.is_empty()) {
            self.endpoint = endpoint.to_string();
        }
        self
    }
}
