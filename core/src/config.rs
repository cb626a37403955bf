//! Construction-time settings for a [`FleetLockClient`](crate::FleetLockClient).

use std::fmt;
use std::sync::Arc;

use crate::transport::Transport;

/// Group used when none is configured.
pub const DEFAULT_GROUP: &str = "default";

/// Settings validated once by `FleetLockClient::new`.
#[derive(Clone, Default)]
pub struct Config {
    /// Base URL of the FleetLock server. Required.
    pub url: String,
    /// Reboot group of the instance. Defaults to `"default"`.
    pub group: String,
    /// Instance identifier; must be unique and should persist across
    /// reboots. Required.
    pub id: String,
    /// Transport to send requests through, e.g. one wrapped with
    /// authentication. Defaults to `ReqwestTransport`.
    pub transport: Option<Arc<dyn Transport>>,
}

impl Config {
    pub fn new(url: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(transport);
        self.transport = Some(transport);
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("group", &self.group)
            .field("id", &self.id)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .finish()
    }
}
