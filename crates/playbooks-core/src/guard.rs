//! Per-channel execution guard.
//!
//! Tracks, for one client session, which channels have already had their
//! on-join automation evaluated, plus the channel captured at the last
//! navigation. Each channel moves `Unevaluated → Evaluated` at most once;
//! there is no reset.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Whether leaving a channel and coming back re-runs the on-join check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisitPolicy {
    /// A channel is evaluated once per session.
    #[default]
    Once,
    /// Only consecutive visits to the same channel are suppressed.
    PerNavigation,
}

impl RevisitPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RevisitPolicy::Once => "once",
            RevisitPolicy::PerNavigation => "per_navigation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// First evaluation of this visit; the caller should run the check.
    Proceed,
    /// The channel has not changed since the last navigation.
    SameChannel,
    /// The channel was already evaluated earlier in this session.
    AlreadyEvaluated,
}

#[derive(Debug, Default)]
pub struct ExecutionGuard {
    policy: RevisitPolicy,
    current: Option<String>,
    evaluated: HashSet<String>,
}

impl ExecutionGuard {
    pub fn new(policy: RevisitPolicy) -> Self {
        Self {
            policy,
            current: None,
            evaluated: HashSet::new(),
        }
    }

    /// Record a navigation into `channel_id` and decide whether the on-join
    /// check should run.
    ///
    /// The channel is marked evaluated before the caller does any work, so a
    /// failed check still counts as evaluated.
    pub fn enter(&mut self, channel_id: &str) -> GuardDecision {
        if self.current.as_deref() == Some(channel_id) {
            return GuardDecision::SameChannel;
        }
        self.current = Some(channel_id.to_string());

        let first_visit = self.evaluated.insert(channel_id.to_string());
        if !first_visit && self.policy == RevisitPolicy::Once {
            return GuardDecision::AlreadyEvaluated;
        }
        GuardDecision::Proceed
    }

    pub fn policy(&self) -> RevisitPolicy {
        self.policy
    }

    pub fn current_channel(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_evaluated(&self, channel_id: &str) -> bool {
        self.evaluated.contains(channel_id)
    }

    pub fn evaluated_count(&self) -> usize {
        self.evaluated.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_visit_proceeds_and_marks_evaluated() {
        let mut guard = ExecutionGuard::new(RevisitPolicy::Once);
        assert!(!guard.is_evaluated("C1"));
        assert_eq!(guard.enter("C1"), GuardDecision::Proceed);
        assert!(guard.is_evaluated("C1"));
        assert_eq!(guard.current_channel(), Some("C1"));
    }

    #[test]
    fn repeated_entry_is_same_channel() {
        let mut guard = ExecutionGuard::new(RevisitPolicy::Once);
        guard.enter("C1");
        for _ in 0..5 {
            assert_eq!(guard.enter("C1"), GuardDecision::SameChannel);
        }
        assert_eq!(guard.evaluated_count(), 1);
    }

    #[test]
    fn once_policy_never_reevaluates() {
        let mut guard = ExecutionGuard::new(RevisitPolicy::Once);
        assert_eq!(guard.enter("C1"), GuardDecision::Proceed);
        assert_eq!(guard.enter("C2"), GuardDecision::Proceed);
        assert_eq!(guard.enter("C1"), GuardDecision::AlreadyEvaluated);
        assert_eq!(guard.enter("C2"), GuardDecision::AlreadyEvaluated);
        assert_eq!(guard.current_channel(), Some("C2"));
    }

    #[test]
    fn per_navigation_policy_reevaluates_after_leaving() {
        let mut guard = ExecutionGuard::new(RevisitPolicy::PerNavigation);
        assert_eq!(guard.enter("C1"), GuardDecision::Proceed);
        assert_eq!(guard.enter("C1"), GuardDecision::SameChannel);
        assert_eq!(guard.enter("C2"), GuardDecision::Proceed);
        assert_eq!(guard.enter("C1"), GuardDecision::Proceed);
        assert!(guard.is_evaluated("C1"));
    }

    #[test]
    fn default_policy_is_once() {
        assert_eq!(ExecutionGuard::default().policy(), RevisitPolicy::Once);
    }
}
