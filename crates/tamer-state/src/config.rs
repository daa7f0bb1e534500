//! Manager configuration

use std::time::Duration;
use tamer_protocol::MessageHeaders;

/// Wait applied by `PetInventoryManager::fetch`
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a pet inventory manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Timeout used when the caller does not pick one (zero waits forever)
    pub default_timeout: Duration,
    /// Header ids of the connected client build
    pub headers: MessageHeaders,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            headers: MessageHeaders::default(),
        }
    }
}

impl ManagerConfig {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_headers(mut self, headers: MessageHeaders) -> Self {
        self.headers = headers;
        self
    }
}
