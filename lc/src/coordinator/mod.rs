//! Loading coordinator handle
//!
//! [`LoadingCoordinator`] owns one Visibility Store and one Operation Ledger
//! behind a single lock. It is cheap to clone; every clone talks to the same
//! state, so an application creates one and hands clones to its views.

mod config;
mod core;
mod guard;

pub use config::CoordinatorConfig;
pub use core::LoadingCoordinator;
pub use guard::OperationGuard;
