// Cache empty notification entities
// Wire shape shared by every transport binding

use serde::{Deserialize, Serialize};

/// Asks the backend whether it wants to repopulate the cache of `channel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub channel: String,
}

impl NotifyRequest {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResult {
    /// Backend published messages into the channel cache.
    #[serde(default)]
    pub populated: bool,
}

/// Backend answer. Also synthesized as the default when no backend is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResponse {
    #[serde(default)]
    pub result: NotifyResult,
}

impl NotifyResponse {
    pub fn populated(populated: bool) -> Self {
        Self {
            result: NotifyResult { populated },
        }
    }

    pub fn is_populated(&self) -> bool {
        self.result.populated
    }
}
