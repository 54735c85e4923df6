//! Approval Gate
//!
//! Coarse admission control evaluated before any role-based decision.
//! `PendingApproval` has no self-service exit; only an administrator moves an
//! identity to `Active`.

use std::sync::Arc;
use std::time::Duration;

use shared::models::Identity;

use crate::error::LookupError;
use crate::source::ApprovalSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalState {
    /// Profile not fetched yet
    Unknown,
    PendingApproval,
    Active,
    /// Lookup failed; neither pending nor active
    Failed(LookupError),
}

impl ApprovalState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<bool> for ApprovalState {
    fn from(approved: bool) -> Self {
        if approved {
            Self::Active
        } else {
            Self::PendingApproval
        }
    }
}

#[derive(Clone)]
pub struct ApprovalGate {
    source: Arc<dyn ApprovalSource>,
    timeout: Duration,
}

impl ApprovalGate {
    pub fn new(source: Arc<dyn ApprovalSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Fetch the approval state of `identity`
    pub async fn check(&self, identity: &Identity) -> ApprovalState {
        let result =
            match tokio::time::timeout(self.timeout, self.source.approval_for(identity.id)).await {
                Ok(result) => result,
                Err(_) => Err(LookupError::TimedOut(self.timeout)),
            };

        match result {
            Ok(true) => ApprovalState::Active,
            Ok(false) => {
                tracing::info!(user_id = %identity.id, "Identity awaiting approval");
                ApprovalState::PendingApproval
            }
            Err(e) => {
                security_log!(WARN, "approval_lookup_failed", user_id = %identity.id, error = %e);
                ApprovalState::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDirectory;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_new_identity_is_pending() {
        let dir = Arc::new(InMemoryDirectory::new());
        let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
        dir.register(&ana);
        let gate = ApprovalGate::new(dir.clone(), Duration::from_secs(1));

        assert_eq!(gate.check(&ana).await, ApprovalState::PendingApproval);

        dir.approve(ana.id);
        assert_eq!(gate.check(&ana).await, ApprovalState::Active);
    }

    #[tokio::test]
    async fn test_missing_profile_is_pending() {
        let dir = Arc::new(InMemoryDirectory::new());
        let gate = ApprovalGate::new(dir, Duration::from_secs(1));
        let ghost = Identity::new(Uuid::new_v4(), "ghost@example.com");

        assert_eq!(gate.check(&ghost).await, ApprovalState::PendingApproval);
    }

    #[tokio::test]
    async fn test_failure_is_neither_pending_nor_active() {
        let dir = Arc::new(InMemoryDirectory::new());
        let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
        dir.register(&ana);
        dir.approve(ana.id);
        dir.set_offline(true);
        let gate = ApprovalGate::new(dir, Duration::from_secs(1));

        let state = gate.check(&ana).await;
        assert!(matches!(state, ApprovalState::Failed(LookupError::Transient(_))));
        assert!(!state.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_profile_times_out() {
        let dir = Arc::new(InMemoryDirectory::new());
        let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
        dir.register(&ana);
        dir.set_delay(ana.id, Duration::from_secs(30));
        let gate = ApprovalGate::new(dir, Duration::from_secs(2));

        assert_eq!(
            gate.check(&ana).await,
            ApprovalState::Failed(LookupError::TimedOut(Duration::from_secs(2)))
        );
    }
}
