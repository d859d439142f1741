//! Hub simulator configuration

use hublink_core::ConfirmationResult;
use serde::{Deserialize, Serialize};

/// Behavior knobs for a [`SimHub`](crate::SimHub)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimHubConfig {
    /// Whether new connections are accepted
    pub accept_connections: bool,
    /// Option keys the hub refuses (e.g. `"MinimumPollingTime"`)
    pub rejected_options: Vec<String>,
    /// Maximum unresolved sends per connection
    pub queue_capacity: usize,
    /// Outcome applied to each batch as it is flushed; `None` leaves sends
    /// in flight until [`SimHub::resolve_pending`](crate::SimHub::resolve_pending)
    pub auto_resolve: Option<ConfirmationResult>,
    /// Whether cloud-to-device messages can be enabled
    pub supports_inbound: bool,
    /// Refuse every submission outright
    pub refuse_submissions: bool,
}

impl Default for SimHubConfig {
    fn default() -> Self {
        Self {
            accept_connections: true,
            rejected_options: Vec::new(),
            queue_capacity: 64,
            auto_resolve: Some(ConfirmationResult::Ok),
            supports_inbound: true,
            refuse_submissions: false,
        }
    }
}

impl SimHubConfig {
    /// Sends stay in flight until resolved by hand
    pub fn manual_resolution() -> Self {
        Self {
            auto_resolve: None,
            ..Default::default()
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn rejecting_option(mut self, key: impl Into<String>) -> Self {
        self.rejected_options.push(key.into());
        self
    }
}
