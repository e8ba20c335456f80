//! The on-join welcome message poster.
//!
//! One `WelcomeMessagePoster` is built per client session and invoked on
//! every route change. It owns the session's [`ExecutionGuard`]; everything
//! else comes from injected collaborators.
//!
//! ```text
//! route change
//!     │
//!     ▼
//! on_navigate ── no channel / not a channel route ──▶ NotInChannel
//!     │
//!     ├── guard: same channel ───────────────────────▶ SameChannel
//!     ├── guard: evaluated earlier ──────────────────▶ AlreadyEvaluated
//!     ├── viewed store says viewed ──────────────────▶ AlreadyViewed
//!     ▼
//! fetch_channel_actions(new_member_joins)      (await, may fail)
//!     ├── no enabled welcome message ────────────────▶ NoWelcomeAction
//!     ▼
//! check_and_send_message_on_join               (await, may fail)
//!     ├── false ─────────────────────────────────────▶ NotSent
//!     ▼
//! mark_channel_viewed ───────────────────────────────▶ Sent
//! ```
//!
//! The guard is updated before the first await and never rolled back, so a
//! failed attempt still counts as evaluated for the session.

use std::sync::{Mutex, MutexGuard};
use std::task::Poll;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::action::TriggerType;
use crate::error::Result;
use crate::guard::{ExecutionGuard, GuardDecision, RevisitPolicy};
use crate::host::{ChannelActionsApi, NavigationState, ViewedStore};
use crate::matcher::{match_actions, TriggerEvent};
use crate::navigation::RouteChanges;
use crate::route::ChannelRoute;

// ---------------------------------------------------------------------------
// NavigationOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    NotInChannel,
    SameChannel { channel_id: String },
    AlreadyEvaluated { channel_id: String },
    AlreadyViewed { channel_id: String },
    NoWelcomeAction { channel_id: String },
    NotSent { channel_id: String },
    Sent { channel_id: String },
}

impl NavigationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationOutcome::NotInChannel => "not_in_channel",
            NavigationOutcome::SameChannel { .. } => "same_channel",
            NavigationOutcome::AlreadyEvaluated { .. } => "already_evaluated",
            NavigationOutcome::AlreadyViewed { .. } => "already_viewed",
            NavigationOutcome::NoWelcomeAction { .. } => "no_welcome_action",
            NavigationOutcome::NotSent { .. } => "not_sent",
            NavigationOutcome::Sent { .. } => "sent",
        }
    }

    pub fn channel_id(&self) -> Option<&str> {
        match self {
            NavigationOutcome::NotInChannel => None,
            NavigationOutcome::SameChannel { channel_id }
            | NavigationOutcome::AlreadyEvaluated { channel_id }
            | NavigationOutcome::AlreadyViewed { channel_id }
            | NavigationOutcome::NoWelcomeAction { channel_id }
            | NavigationOutcome::NotSent { channel_id }
            | NavigationOutcome::Sent { channel_id } => Some(channel_id),
        }
    }
}

/// Counters reported when a [`WelcomeMessagePoster::listen`] loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListenSummary {
    pub navigations: usize,
    pub sent: usize,
    pub failures: usize,
    /// Distinct channels the guard let through during the session.
    pub channels_evaluated: usize,
}

impl ListenSummary {
    fn record(&mut self, result: Result<NavigationOutcome>) {
        match result {
            Ok(outcome) => {
                if matches!(outcome, NavigationOutcome::Sent { .. }) {
                    self.sent += 1;
                }
                debug!(
                    outcome = outcome.as_str(),
                    channel_id = outcome.channel_id().unwrap_or(""),
                    "navigation handled"
                );
            }
            Err(e) => {
                self.failures += 1;
                warn!("welcome message automation failed: {e}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// WelcomeMessagePoster
// ---------------------------------------------------------------------------

pub struct WelcomeMessagePoster<N, A, V> {
    navigation: N,
    api: A,
    viewed: V,
    route: ChannelRoute,
    guard: Mutex<ExecutionGuard>,
}

impl<N, A, V> WelcomeMessagePoster<N, A, V>
where
    N: NavigationState,
    A: ChannelActionsApi,
    V: ViewedStore,
{
    pub fn new(navigation: N, api: A, viewed: V) -> Self {
        Self {
            navigation,
            api,
            viewed,
            route: ChannelRoute::default(),
            guard: Mutex::new(ExecutionGuard::default()),
        }
    }

    pub fn with_route(mut self, route: ChannelRoute) -> Self {
        self.route = route;
        self
    }

    pub fn with_policy(mut self, policy: RevisitPolicy) -> Self {
        self.guard = Mutex::new(ExecutionGuard::new(policy));
        self
    }

    fn guard(&self) -> MutexGuard<'_, ExecutionGuard> {
        self.guard.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enter(&self, channel_id: &str) -> GuardDecision {
        self.guard().enter(channel_id)
    }

    pub fn current_channel(&self) -> Option<String> {
        self.guard().current_channel().map(str::to_string)
    }

    pub fn is_evaluated(&self, channel_id: &str) -> bool {
        self.guard().is_evaluated(channel_id)
    }

    /// Handle one route change.
    ///
    /// Errors from the viewed store or the server are returned unchanged.
    pub async fn on_navigate(&self) -> Result<NavigationOutcome> {
        let Some(channel) = self.navigation.current_channel() else {
            return Ok(NavigationOutcome::NotInChannel);
        };
        if channel.id.is_empty() {
            return Ok(NavigationOutcome::NotInChannel);
        }
        let path = self.navigation.current_path();
        if !self.route.matches_channel_route(&path) {
            debug!(%path, "not a channel route");
            return Ok(NavigationOutcome::NotInChannel);
        }

        let channel_id = channel.id;
        match self.enter(&channel_id) {
            GuardDecision::SameChannel => {
                return Ok(NavigationOutcome::SameChannel { channel_id });
            }
            GuardDecision::AlreadyEvaluated => {
                debug!(%channel_id, "on-join automation already evaluated this session");
                return Ok(NavigationOutcome::AlreadyEvaluated { channel_id });
            }
            GuardDecision::Proceed => {}
        }

        if self.viewed.has_viewed(&channel_id)? {
            debug!(%channel_id, "channel already viewed");
            return Ok(NavigationOutcome::AlreadyViewed { channel_id });
        }

        let actions = self
            .api
            .fetch_channel_actions(&channel_id, TriggerType::NewMemberJoins)
            .await?;
        if match_actions(&actions, &TriggerEvent::NewMemberJoins).is_empty() {
            debug!(%channel_id, fetched = actions.len(), "no enabled welcome message");
            return Ok(NavigationOutcome::NoWelcomeAction { channel_id });
        }

        if !self.api.check_and_send_message_on_join(&channel_id).await? {
            debug!(%channel_id, "server did not send the welcome message");
            return Ok(NavigationOutcome::NotSent { channel_id });
        }

        self.viewed.mark_channel_viewed(&channel_id)?;
        info!(%channel_id, "welcome message sent");
        Ok(NavigationOutcome::Sent { channel_id })
    }

    /// Run [`on_navigate`](Self::on_navigate) for every route change until
    /// `changes` closes. Failures are logged and listening continues.
    ///
    /// Each navigation starts as soon as its change is observed, while
    /// earlier ones may still be waiting on the server. Navigations still
    /// in flight when `changes` closes are awaited before returning.
    pub async fn listen<R: RouteChanges>(&self, mut changes: R) -> ListenSummary {
        let mut summary = ListenSummary::default();
        let mut in_flight = FuturesUnordered::new();
        loop {
            tokio::select! {
                biased;
                Some(result) = in_flight.next(), if !in_flight.is_empty() => summary.record(result),
                open = changes.next_change() => {
                    if !open {
                        break;
                    }
                    summary.navigations += 1;
                    // The first poll reads the location and enters the guard,
                    // before a later change can replace the location.
                    let mut navigation = Box::pin(self.on_navigate());
                    match futures::poll!(&mut navigation) {
                        Poll::Ready(result) => summary.record(result),
                        Poll::Pending => in_flight.push(navigation),
                    }
                }
            }
        }
        while let Some(result) = in_flight.next().await {
            summary.record(result);
        }
        summary.channels_evaluated = self.guard().evaluated_count();
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
