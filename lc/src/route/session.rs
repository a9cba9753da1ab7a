//! Route-Triggered Session
//!
//! Consumes a stream of navigation targets and, for each one that matches
//! the [`RoutePolicy`], opens a loading session through the coordinator
//! while a full-screen loading view replaces the page.
//!
//! ```text
//!   Idle ──navigation──▶ Evaluating ──match──▶ Active ──work + floor done──▶ Idle
//!                             │
//!                             └──no match──▶ Idle
//! ```
//!
//! Sessions from successive navigations may overlap (the ledger keeps the
//! indicator up until all of them finish). Only the most recent navigation
//! decides which view is published.

use std::pin::pin;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info};

use super::navigation::{NavigationTarget, Trigger, detect_trigger};
use super::policy::{RoutePolicy, RouteResolution};
use crate::coordinator::LoadingCoordinator;
use crate::enforcer::SessionConfig;

/// Where the route session's state machine is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    Idle,
    Evaluating,
    Active,
}

/// What the renderer should display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RouteView {
    /// Nothing has navigated yet
    Unmounted,
    /// Full-screen loading view
    Loading { message: String },
    /// The page for the current target
    Content { path: String, query: Option<String> },
}

impl RouteView {
    fn content(target: &NavigationTarget) -> Self {
        Self::Content {
            path: target.path.clone(),
            query: target.query.clone(),
        }
    }
}

struct CompletedSession {
    generation: u64,
    target: NavigationTarget,
}

/// Opens loading sessions in response to navigation events
pub struct RouteSession {
    coordinator: LoadingCoordinator,
    policy: RoutePolicy,
    view_tx: watch::Sender<RouteView>,
    state_tx: watch::Sender<RouteState>,
    last_target: Option<NavigationTarget>,
    // Bumped on every evaluated navigation; stale completions don't touch the view
    generation: u64,
}

impl RouteSession {
    pub fn new(coordinator: LoadingCoordinator, policy: RoutePolicy) -> Self {
        debug!(prefixes = ?policy.trigger_prefixes, "RouteSession::new: called");
        let (view_tx, _) = watch::channel(RouteView::Unmounted);
        let (state_tx, _) = watch::channel(RouteState::Idle);
        Self {
            coordinator,
            policy,
            view_tx,
            state_tx,
            last_target: None,
            generation: 0,
        }
    }

    /// Receiver for the view the renderer should show
    pub fn view(&self) -> watch::Receiver<RouteView> {
        self.view_tx.subscribe()
    }

    /// Receiver for state machine transitions
    pub fn states(&self) -> watch::Receiver<RouteState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> RouteState {
        *self.state_tx.borrow()
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Drive the session until `events` ends and every open session finishes
    pub async fn run<S>(mut self, events: S)
    where
        S: Stream<Item = NavigationTarget>,
    {
        debug!("RouteSession::run: called");
        let mut events = pin!(events);
        let mut in_flight: FuturesUnordered<BoxFuture<'static, CompletedSession>> = FuturesUnordered::new();
        let mut events_done = false;

        loop {
            tokio::select! {
                next = events.next(), if !events_done => match next {
                    Some(target) => {
                        if let Some(session) = self.on_navigation(target) {
                            in_flight.push(session);
                        }
                    }
                    None => {
                        debug!(open = in_flight.len(), "RouteSession::run: navigation stream ended");
                        events_done = true;
                    }
                },
                Some(done) = in_flight.next(), if !in_flight.is_empty() => self.on_session_complete(done),
                else => break,
            }
        }
        debug!("RouteSession::run: finished");
    }

    fn on_navigation(&mut self, target: NavigationTarget) -> Option<BoxFuture<'static, CompletedSession>> {
        debug!(%target, "RouteSession::on_navigation: called");
        let Some(trigger) = detect_trigger(self.last_target.as_ref(), &target) else {
            debug!(%target, "RouteSession::on_navigation: target unchanged, skipping");
            return None;
        };
        self.last_target = Some(target.clone());
        self.generation += 1;
        self.set_state(RouteState::Evaluating);

        match self.policy.resolve(&target.path, self.coordinator.default_message()) {
            Some(resolution) => {
                info!(
                    %target,
                    ?trigger,
                    message = %resolution.message,
                    min_duration_ms = resolution.min_duration.as_millis() as u64,
                    "Route session opened"
                );
                self.view_tx.send_replace(RouteView::Loading {
                    message: resolution.message.clone(),
                });
                self.set_state(RouteState::Active);
                Some(self.open_session(self.generation, target, resolution, trigger))
            }
            None => {
                debug!(%target, ?trigger, "RouteSession::on_navigation: no policy match");
                self.view_tx.send_replace(RouteView::content(&target));
                self.set_state(RouteState::Idle);
                None
            }
        }
    }

    fn open_session(
        &self,
        generation: u64,
        target: NavigationTarget,
        resolution: RouteResolution,
        trigger: Trigger,
    ) -> BoxFuture<'static, CompletedSession> {
        let coordinator = self.coordinator.clone();
        let prepare_delay = self.policy.prepare_delay();
        async move {
            let config = SessionConfig::new(resolution.message, resolution.min_duration);
            let preparing = async {
                sleep(prepare_delay).await;
                Ok(())
            };
            let Ok(()) = coordinator
                .run_with_loading::<(), std::convert::Infallible, _>(preparing, config)
                .await;
            debug!(%target, ?trigger, generation, "RouteSession: view prepared");
            CompletedSession { generation, target }
        }
        .boxed()
    }

    fn on_session_complete(&mut self, done: CompletedSession) {
        if done.generation != self.generation {
            debug!(
                target = %done.target,
                generation = done.generation,
                current = self.generation,
                "RouteSession::on_session_complete: superseded, leaving view alone"
            );
            return;
        }
        info!(target = %done.target, "Route session closed");
        self.view_tx.send_replace(RouteView::content(&done.target));
        self.set_state(RouteState::Idle);
    }

    fn set_state(&self, state: RouteState) {
        debug!(?state, "RouteSession::set_state");
        self.state_tx.send_replace(state);
    }
}
