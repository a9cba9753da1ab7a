//! Route policy table
//!
//! Static configuration deciding whether a navigation opens a loading
//! session, and with which message and floor duration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Key in [`RoutePolicy::durations`] holding the table-wide fallback
pub const DEFAULT_DURATION_KEY: &str = "default";

/// Floor used when the table has no `default` entry
pub const DEFAULT_ROUTE_DURATION_MS: u64 = 800;

/// Length of the simulated "preparing view" work
pub const DEFAULT_PREPARE_DELAY_MS: u64 = 150;

/// Invalid route policy
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Trigger prefix must not be empty")]
    EmptyPrefix,

    #[error("Route '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("Custom message for '{0}' is empty")]
    EmptyMessage(String),
}

/// Message and floor chosen for a matching path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteResolution {
    pub path: String,
    pub message: String,
    pub min_duration: Duration,
}

/// Per-route loading configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RoutePolicy {
    /// Paths (and everything beneath them) that open a session
    pub trigger_prefixes: Vec<String>,

    /// Exact path -> custom message
    pub messages: BTreeMap<String, String>,

    /// Exact path -> floor in milliseconds; `default` is the fallback
    pub durations: BTreeMap<String, u64>,

    /// Simulated view preparation time in milliseconds
    pub prepare_delay_ms: u64,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        let messages = [
            ("/dashboard", "Loading dashboard..."),
            ("/analytics", "Crunching analytics..."),
            ("/reports", "Generating reports..."),
            ("/settings", "Loading settings..."),
        ]
        .into_iter()
        .map(|(path, message)| (path.to_string(), message.to_string()))
        .collect();

        let durations = [
            (DEFAULT_DURATION_KEY, DEFAULT_ROUTE_DURATION_MS),
            ("/dashboard", 1000),
            ("/analytics", 1200),
            ("/reports", 1500),
        ]
        .into_iter()
        .map(|(path, ms)| (path.to_string(), ms))
        .collect();

        Self {
            trigger_prefixes: ["/dashboard", "/analytics", "/reports", "/settings"]
                .into_iter()
                .map(String::from)
                .collect(),
            messages,
            durations,
            prepare_delay_ms: DEFAULT_PREPARE_DELAY_MS,
        }
    }
}

impl RoutePolicy {
    /// A policy that never triggers
    pub fn empty() -> Self {
        Self {
            trigger_prefixes: Vec::new(),
            messages: BTreeMap::new(),
            durations: BTreeMap::new(),
            prepare_delay_ms: DEFAULT_PREPARE_DELAY_MS,
        }
    }

    /// Check the table is well formed
    pub fn validate(&self) -> Result<(), RouteError> {
        debug!(prefixes = self.trigger_prefixes.len(), "RoutePolicy::validate: called");
        for prefix in &self.trigger_prefixes {
            if prefix.is_empty() {
                return Err(RouteError::EmptyPrefix);
            }
            if !prefix.starts_with('/') {
                return Err(RouteError::NotAbsolute(prefix.clone()));
            }
        }
        for (path, message) in &self.messages {
            if !path.starts_with('/') {
                return Err(RouteError::NotAbsolute(path.clone()));
            }
            if message.trim().is_empty() {
                return Err(RouteError::EmptyMessage(path.clone()));
            }
        }
        if let Some(path) = self
            .durations
            .keys()
            .find(|k| k.as_str() != DEFAULT_DURATION_KEY && !k.starts_with('/'))
        {
            return Err(RouteError::NotAbsolute(path.clone()));
        }
        Ok(())
    }

    /// Whether `path` falls under any trigger prefix
    pub fn matches(&self, path: &str) -> bool {
        let matched = self.trigger_prefixes.iter().any(|prefix| prefix_matches(prefix, path));
        debug!(%path, matched, "RoutePolicy::matches: called");
        matched
    }

    /// Custom message for exactly `path`
    pub fn message_for(&self, path: &str) -> Option<&str> {
        self.messages.get(path).map(String::as_str)
    }

    /// Floor for `path`: exact entry, then `default`, then the built-in value
    pub fn duration_for(&self, path: &str) -> Duration {
        let ms = self
            .durations
            .get(path)
            .or_else(|| self.durations.get(DEFAULT_DURATION_KEY))
            .copied()
            .unwrap_or(DEFAULT_ROUTE_DURATION_MS);
        Duration::from_millis(ms)
    }

    pub fn prepare_delay(&self) -> Duration {
        Duration::from_millis(self.prepare_delay_ms)
    }

    /// Resolve `path` to a session, or `None` if it shouldn't trigger one
    pub fn resolve(&self, path: &str, default_message: &str) -> Option<RouteResolution> {
        if !self.matches(path) {
            return None;
        }
        Some(RouteResolution {
            path: path.to_string(),
            message: self.message_for(path).unwrap_or(default_message).to_string(),
            min_duration: self.duration_for(path),
        })
    }
}

/// Prefix match on whole path segments
///
/// `/reports` covers `/reports` and `/reports/q3`, not `/reportsarchive`.
/// The root prefix `/` only matches the root itself.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path == "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
