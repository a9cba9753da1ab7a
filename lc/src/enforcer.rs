//! Minimum-Duration Enforcer
//!
//! Keeps a loading session on screen for at least a floor duration, even when
//! the wrapped work finishes instantly. The hold applies to failures as well
//! as successes so a fast error doesn't make the indicator flash.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

/// Callback that turns a failure into the session's result
pub type FailureHandler<T, E> = Box<dyn FnOnce(E) -> Result<T, E> + Send>;

/// Per-invocation settings for a loading session
pub struct SessionConfig<T, E> {
    /// Text shown while the session is open
    pub message: String,

    /// Floor duration; zero disables the hold
    pub min_duration: Duration,

    on_failure: Option<FailureHandler<T, E>>,
}

impl<T, E> SessionConfig<T, E> {
    pub fn new(message: impl Into<String>, min_duration: Duration) -> Self {
        Self {
            message: message.into(),
            min_duration,
            on_failure: None,
        }
    }

    /// Same as [`SessionConfig::new`] with the floor given in milliseconds
    pub fn with_min_ms(message: impl Into<String>, min_duration_ms: u64) -> Self {
        Self::new(message, Duration::from_millis(min_duration_ms))
    }

    /// Install a failure handler
    ///
    /// The handler runs after the floor hold. Returning `Ok` absorbs the
    /// failure; returning `Err` passes a (possibly different) error on.
    pub fn on_failure<H>(mut self, handler: H) -> Self
    where
        H: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        self.on_failure = Some(Box::new(handler));
        self
    }

    pub fn has_failure_handler(&self) -> bool {
        self.on_failure.is_some()
    }

    pub(crate) fn into_handler(self) -> Option<FailureHandler<T, E>> {
        self.on_failure
    }
}

impl<T, E> fmt::Debug for SessionConfig<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("message", &self.message)
            .field("min_duration", &self.min_duration)
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// Await `work`, then sleep until at least `min_duration` has passed since the call
///
/// The output of `work` is returned unchanged, whatever it is.
pub async fn hold_for_at_least<F>(min_duration: Duration, work: F) -> F::Output
where
    F: Future,
{
    let started = Instant::now();
    let output = work.await;

    if min_duration.is_zero() {
        return output;
    }

    let elapsed = started.elapsed();
    if let Some(remaining) = min_duration.checked_sub(elapsed).filter(|r| !r.is_zero()) {
        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            remaining_ms = remaining.as_millis() as u64,
            "hold_for_at_least: holding"
        );
        sleep(remaining).await;
    }
    output
}

/// Apply a session's failure handler to an outcome, if there is one
pub(crate) fn settle<T, E>(outcome: Result<T, E>, handler: Option<FailureHandler<T, E>>) -> Result<T, E> {
    match (outcome, handler) {
        (Err(e), Some(handler)) => {
            debug!("settle: invoking failure handler");
            handler(e)
        }
        (outcome, _) => outcome,
    }
}
