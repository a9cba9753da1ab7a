//! Navigation targets and trigger detection

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Where a navigation event points: a path plus an optional query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub path: String,
    pub query: Option<String>,
}

impl NavigationTarget {
    /// Split `target` into path and query, dropping any `#fragment`
    ///
    /// An empty path becomes `/`; a trailing slash is removed from
    /// non-root paths; an empty query is treated as none.
    pub fn parse(target: &str) -> Self {
        let without_fragment = target.split_once('#').map_or(target, |(before, _)| before);
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };

        Self {
            path,
            query: query.filter(|q| !q.is_empty()).map(String::from),
        }
    }
}

impl FromStr for NavigationTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for NavigationTarget {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Why a navigation event is being evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// First event after mount
    Mount,
    /// The path portion changed
    PathChanged,
    /// Same path, different query
    QueryChanged,
}

/// Decide whether moving from `previous` to `next` should be evaluated
pub fn detect_trigger(previous: Option<&NavigationTarget>, next: &NavigationTarget) -> Option<Trigger> {
    match previous {
        None => Some(Trigger::Mount),
        Some(prev) if prev.path != next.path => Some(Trigger::PathChanged),
        Some(prev) if prev.query != next.query => Some(Trigger::QueryChanged),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_and_query() {
        let target = NavigationTarget::parse("/dashboard?tab=usage#chart");
        assert_eq!(target.path, "/dashboard");
        assert_eq!(target.query.as_deref(), Some("tab=usage"));
        assert_eq!(target.to_string(), "/dashboard?tab=usage");
    }

    #[test]
    fn test_parse_normalizes_path() {
        assert_eq!(NavigationTarget::parse("").path, "/");
        assert_eq!(NavigationTarget::parse("/").path, "/");
        assert_eq!(NavigationTarget::parse("/reports/").path, "/reports");
        assert_eq!(NavigationTarget::parse("settings").path, "/settings");
        assert_eq!(NavigationTarget::parse("/a?").query, None);
    }

    #[test]
    fn test_detect_trigger() {
        let dashboard = NavigationTarget::from("/dashboard");
        let dashboard_tab = NavigationTarget::from("/dashboard?tab=2");
        let reports = NavigationTarget::from("/reports?tab=2");

        assert_eq!(detect_trigger(None, &dashboard), Some(Trigger::Mount));
        assert_eq!(detect_trigger(Some(&dashboard), &reports), Some(Trigger::PathChanged));
        assert_eq!(detect_trigger(Some(&dashboard), &dashboard_tab), Some(Trigger::QueryChanged));
        assert_eq!(detect_trigger(Some(&dashboard_tab), &dashboard), Some(Trigger::QueryChanged));
        assert_eq!(detect_trigger(Some(&dashboard), &dashboard.clone()), None);
    }
}
