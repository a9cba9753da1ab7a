//! loadcoord - Loading Operation Coordinator
//!
//! Lets any number of independent async operations share one loading
//! indicator that never flickers and never gets stuck behind a balanced
//! acquire/release protocol.
//!
//! # Core Concepts
//!
//! - **One Signal**: the indicator is visible iff at least one operation holds a ledger token
//! - **Floor Durations**: a session stays up for a minimum time, even if the work is instant or fails fast
//! - **Ordered Sequences**: multi-step work runs serially under a single session
//! - **Route Sessions**: navigation events open sessions according to a static policy table
//! - **Escape Hatch**: `force_hide` clears everything when an external check finds the UI wedged
//!
//! # Modules
//!
//! - [`visibility`] - Visibility Store and change events
//! - [`ledger`] - Operation Ledger and tokens
//! - [`enforcer`] - Minimum-duration hold and session configuration
//! - [`coordinator`] - Shared handle tying ledger and store together
//! - [`route`] - Route policy table and route-triggered sessions
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//!
//! # Usage
//!
//! ```rust,no_run
//! use loadcoord::{LoadingCoordinator, SessionConfig};
//!
//! # async fn example() -> eyre::Result<()> {
//! let coordinator = LoadingCoordinator::default();
//! let users = coordinator
//!     .run_with_loading(
//!         async { Ok::<_, eyre::Report>(vec!["ada", "grace"]) },
//!         SessionConfig::with_min_ms("Loading users...", 500),
//!     )
//!     .await?;
//! assert_eq!(users.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod enforcer;
pub mod ledger;
mod recovery;
pub mod route;
mod sequence;
pub mod visibility;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{CoordinatorConfig, LoadingCoordinator, OperationGuard};
pub use enforcer::{FailureHandler, SessionConfig, hold_for_at_least};
pub use ledger::{LedgerStats, OperationLedger, OperationToken};
pub use route::{NavigationTarget, RouteError, RoutePolicy, RouteSession, RouteState, RouteView};
pub use visibility::{DEFAULT_MESSAGE, VisibilityEvent, VisibilitySession, VisibilityStore};
