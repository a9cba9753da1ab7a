//! Coordinator configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::visibility::{DEFAULT_EVENT_CAPACITY, DEFAULT_MESSAGE};

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Message used when a session doesn't specify one
    #[serde(rename = "default-message", default = "default_message")]
    pub default_message: String,

    /// Buffer size of the visibility event channel
    #[serde(rename = "event-capacity", default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_message() -> String {
    debug!("default_message: called");
    DEFAULT_MESSAGE.to_string()
}

fn default_event_capacity() -> usize {
    debug!("default_event_capacity: called");
    DEFAULT_EVENT_CAPACITY
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_message: default_message(),
            event_capacity: default_event_capacity(),
        }
    }
}
