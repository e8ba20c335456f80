//! In-memory host navigation model and route-change subscriptions.
//!
//! The host publishes its location through a `watch` channel. Readers see
//! the latest location only; rapid changes may coalesce, the same way the
//! host re-renders coalesce.

use crate::host::{Channel, NavigationState};
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub channel: Option<Channel>,
}

impl Location {
    pub fn new(path: impl Into<String>, channel: Option<Channel>) -> Self {
        Self {
            path: path.into(),
            channel,
        }
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// Publishes the host's current location. Dropping it closes every
/// subscription.
#[derive(Debug)]
pub struct Navigator {
    tx: watch::Sender<Location>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Location::default());
        Self { tx }
    }

    pub fn navigate(&self, path: impl Into<String>, channel: Option<Channel>) {
        self.tx.send_replace(Location::new(path, channel));
    }

    /// Move to a view that is not a channel.
    pub fn leave(&self, path: impl Into<String>) {
        self.navigate(path, None);
    }

    /// Signal a change without moving, like a re-render in place.
    pub fn rerender(&self) {
        self.tx.send_modify(|_| {});
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.tx.subscribe()
    }
}

impl NavigationState for Navigator {
    fn current_channel(&self) -> Option<Channel> {
        self.tx.borrow().channel.clone()
    }

    fn current_path(&self) -> String {
        self.tx.borrow().path.clone()
    }
}

impl NavigationState for watch::Receiver<Location> {
    fn current_channel(&self) -> Option<Channel> {
        self.borrow().channel.clone()
    }

    fn current_path(&self) -> String {
        self.borrow().path.clone()
    }
}

// ---------------------------------------------------------------------------
// RouteChanges
// ---------------------------------------------------------------------------

/// A stream of "the route changed" signals.
#[async_trait]
pub trait RouteChanges: Send {
    /// Wait for the next change. Returns `false` once the source is closed.
    ///
    /// Must be cancel safe: dropping the future before it completes loses no change.
    async fn next_change(&mut self) -> bool;
}

#[async_trait]
impl<T: Send + Sync> RouteChanges for watch::Receiver<T> {
    async fn next_change(&mut self) -> bool {
        self.changed().await.is_ok()
    }
}

#[async_trait]
impl<T: Send> RouteChanges for mpsc::Receiver<T> {
    async fn next_change(&mut self) -> bool {
        self.recv().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ChannelType;

    #[test]
    fn navigator_reports_latest_location() {
        let nav = Navigator::new();
        assert_eq!(nav.current_channel(), None);
        assert_eq!(nav.current_path(), "");

        nav.navigate("/ops/channels/c1", Some(Channel::new("C1", ChannelType::Open)));
        assert_eq!(nav.current_channel().unwrap().id, "C1");
        assert_eq!(nav.current_path(), "/ops/channels/c1");

        nav.leave("/playbooks/runs");
        assert_eq!(nav.current_channel(), None);
        assert_eq!(nav.current_path(), "/playbooks/runs");
    }

    #[test]
    fn receiver_reads_same_state() {
        let nav = Navigator::new();
        let rx = nav.subscribe();
        nav.navigate("/ops/messages/@bob", Some(Channel::new("D1", ChannelType::Direct)));
        assert_eq!(rx.current_channel().unwrap().channel_type, ChannelType::Direct);
        assert_eq!(rx.current_path(), "/ops/messages/@bob");
    }

    #[tokio::test]
    async fn subscription_signals_changes_and_closes_on_drop() {
        let nav = Navigator::new();
        let mut rx = nav.subscribe();
        nav.rerender();
        assert!(rx.next_change().await);
        drop(nav);
        assert!(!rx.next_change().await);
    }

    #[tokio::test]
    async fn mpsc_receiver_is_a_change_source() {
        let (tx, mut rx) = mpsc::channel::<()>(4);
        tx.send(()).await.unwrap();
        drop(tx);
        assert!(rx.next_change().await);
        assert!(!rx.next_change().await);
    }
}
