//! Connection lifecycle hints from the client front end.

use serde::{Deserialize, Serialize};

/// The front end's connection state as far as the map cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuiState {
    /// The client window was opened.
    Start,
    /// The server selection screen is shown.
    Metaserver,
    /// About to connect to a server.
    PreConnecting(String),
    /// Connecting to a server.
    Connecting(String),
    Connected,
    ConnectFailed(String),
}

impl GuiState {
    /// States that start a fresh session; the visible map must not carry
    /// over into them.
    pub fn resets_map(&self) -> bool {
        matches!(
            self,
            GuiState::Start | GuiState::Metaserver | GuiState::Connecting(_)
        )
    }

    /// Animation ids are per connection and are forgotten when connecting.
    pub fn resets_animations(&self) -> bool {
        matches!(self, GuiState::Connecting(_))
    }
}
