//! Route-triggered loading sessions
//!
//! - [`RoutePolicy`] - which paths open a session, with what message and floor
//! - [`NavigationTarget`] - parsed path + query of a navigation event
//! - [`RouteSession`] - consumes navigation events and drives the coordinator

mod navigation;
mod policy;
mod session;

pub use navigation::{NavigationTarget, Trigger, detect_trigger};
pub use policy::{
    DEFAULT_DURATION_KEY, DEFAULT_PREPARE_DELAY_MS, DEFAULT_ROUTE_DURATION_MS, RouteError, RoutePolicy,
    RouteResolution,
};
pub use session::{RouteSession, RouteState, RouteView};
