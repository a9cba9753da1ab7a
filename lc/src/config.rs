//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinator::CoordinatorConfig;
use crate::route::RoutePolicy;
use crate::visibility::MAX_EVENT_CAPACITY;

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = ".loadcoord.yml";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Coordinator settings
    pub coordinator: CoordinatorConfig,

    /// Route policy table
    pub routes: RoutePolicy,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        self.routes.validate().context("Invalid route policy")?;
        if self.coordinator.default_message.trim().is_empty() {
            return Err(eyre::eyre!("coordinator.default-message must not be empty"));
        }
        let capacity = self.coordinator.event_capacity;
        if !(1..=MAX_EVENT_CAPACITY).contains(&capacity) {
            return Err(eyre::eyre!(
                "coordinator.event-capacity must be between 1 and {}, got {}",
                MAX_EVENT_CAPACITY,
                capacity
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.loadcoord.yml`, then
    /// `~/.config/loadcoord/loadcoord.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, for use before logging is set up
    ///
    /// Errors are swallowed; full loading reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::candidate_paths(),
        };
        paths
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|config| config.log_level)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("loadcoord").join("loadcoord.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lc.yml");
        fs::write(
            &path,
            r#"
log-level: debug
coordinator:
  default-message: "One moment..."
routes:
  trigger-prefixes: ["/app"]
  durations:
    default: 300
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.coordinator.default_message, "One moment...");
        assert_eq!(config.coordinator.event_capacity, 256);
        assert!(config.routes.matches("/app/home"));
        assert!(!config.routes.matches("/dashboard"));
        assert_eq!(config.routes.duration_for("/app"), Duration::from_millis(300));
        assert!(config.validate().is_ok());

        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("debug"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_invalid_routes_fail_validation() {
        let config: Config = serde_yaml::from_str("routes:\n  trigger-prefixes: [\"reports\"]\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("must start with '/'"));
    }

    #[test]
    fn test_event_capacity_out_of_range_rejected() {
        let config: Config = serde_yaml::from_str("coordinator:\n  event-capacity: 18446744073709551615\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("event-capacity must be between 1 and 65536"));

        let config: Config = serde_yaml::from_str("coordinator:\n  event-capacity: 0\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = serde_yaml::from_str("coordinator:\n  event-capacity: 65536\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_default_message_rejected() {
        let config: Config = serde_yaml::from_str("coordinator:\n  default-message: \"\"\n").unwrap();
        assert!(config.validate().is_err());
    }
}
