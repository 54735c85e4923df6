//! Access controller
//!
//! Background task that follows the session identity, runs the approval and
//! role lookups, and publishes an [`AccessSnapshot`] on a watch channel.
//! Guards read the latest snapshot synchronously through an [`AccessHandle`].

use std::sync::Arc;

use shared::models::Identity;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

use crate::approval::{ApprovalGate, ApprovalState};
use crate::config::AccessConfig;
use crate::evaluator::{AccessDecision, AccessSnapshot, PermissionEvaluator, Ticket};
use crate::resolver::{RoleResolution, RoleResolver};
use crate::source::{ApprovalSource, RoleSource};

type LookupOutcome = (Ticket, ApprovalState, Option<RoleResolution>);

pub struct AccessController {
    roles: RoleResolver,
    approvals: ApprovalGate,
    identity_rx: watch::Receiver<Option<Identity>>,
    evaluator: PermissionEvaluator,
    snapshot_tx: watch::Sender<AccessSnapshot>,
    refresh: Arc<Notify>,
}

/// Read side of the controller, cheap to clone
#[derive(Debug, Clone)]
pub struct AccessHandle {
    snapshot_rx: watch::Receiver<AccessSnapshot>,
    refresh: Arc<Notify>,
}

impl AccessController {
    pub fn new(
        roles: Arc<dyn RoleSource>,
        approvals: Arc<dyn ApprovalSource>,
        identity_rx: watch::Receiver<Option<Identity>>,
        config: &AccessConfig,
    ) -> (Self, AccessHandle) {
        let (snapshot_tx, snapshot_rx) = watch::channel(AccessSnapshot::default());
        let refresh = Arc::new(Notify::new());

        let controller = Self {
            roles: RoleResolver::new(roles, config.lookup_timeout),
            approvals: ApprovalGate::new(approvals, config.lookup_timeout),
            identity_rx,
            evaluator: PermissionEvaluator::new(),
            snapshot_tx,
            refresh: refresh.clone(),
        };
        let handle = AccessHandle {
            snapshot_rx,
            refresh,
        };
        (controller, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drive resolution until the identity channel closes
    pub async fn run(mut self) {
        let initial = self.identity_rx.borrow_and_update().clone();
        let mut ticket = self.evaluator.begin(initial);
        self.publish();

        loop {
            let roles = self.roles.clone();
            let approvals = self.approvals.clone();
            let work = async move {
                match ticket {
                    Some(ticket) => lookup(roles, approvals, ticket).await,
                    None => std::future::pending::<LookupOutcome>().await,
                }
            };

            tokio::select! {
                biased;

                changed = self.identity_rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Identity channel closed, access controller stopping");
                        break;
                    }
                    let next = self.identity_rx.borrow_and_update().clone();
                    ticket = if next.is_some() && next.as_ref() == self.evaluator.snapshot().identity() {
                        self.evaluator.begin_refresh()
                    } else {
                        match &next {
                            Some(identity) => tracing::info!(user_id = %identity.id, "Session identity changed"),
                            None => tracing::info!("Session signed out"),
                        }
                        self.evaluator.begin(next)
                    };
                    self.publish();
                }
                _ = self.refresh.notified() => {
                    tracing::debug!("Access refresh requested");
                    ticket = self.evaluator.begin_refresh();
                    self.publish();
                }
                (done, approval, role) = work => {
                    if self.evaluator.apply(&done, approval, role) {
                        self.publish();
                    }
                    ticket = None;
                }
            }
        }
    }

    fn publish(&self) {
        let snapshot = self.evaluator.snapshot().clone();
        match snapshot.decision() {
            AccessDecision::Granted { permissions } => {
                tracing::debug!(generation = snapshot.generation, ?permissions, "Access granted");
            }
            AccessDecision::Unavailable { error } => {
                tracing::warn!(generation = snapshot.generation, error = %error, "Access unavailable");
            }
            other => {
                tracing::trace!(generation = snapshot.generation, decision = ?other, "Access state");
            }
        }
        self.snapshot_tx.send_replace(snapshot);
    }
}

/// Approval first; role only for active identities
async fn lookup(roles: RoleResolver, approvals: ApprovalGate, ticket: Ticket) -> LookupOutcome {
    let approval = approvals.check(ticket.identity()).await;
    let role = if approval.is_active() {
        Some(roles.resolve(Some(ticket.identity())).await)
    } else {
        None
    };
    (ticket, approval, role)
}

impl AccessHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> AccessSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn decision(&self) -> AccessDecision {
        self.snapshot_rx.borrow().decision()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccessSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Re-run the lookups for the current identity
    ///
    /// Used after an administrator changes a role or approves an account.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Wait for the first snapshot that is no longer loading
    ///
    /// Returns `None` if the controller stopped first.
    pub async fn settled(&self) -> Option<AccessSnapshot> {
        let mut rx = self.snapshot_rx.clone();
        rx.wait_for(|snapshot| !snapshot.loading())
            .await
            .ok()
            .map(|snapshot| snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDirectory;
    use crate::permissions::Permissions;
    use shared::models::Role;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_resolves_initial_identity() {
        let dir = Arc::new(InMemoryDirectory::new());
        let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
        dir.register_with_role(&ana, Role::Standard);
        dir.approve(ana.id);

        let (_identity_tx, identity_rx) = watch::channel(Some(ana));
        let (controller, handle) =
            AccessController::new(dir.clone(), dir, identity_rx, &AccessConfig::default());
        controller.spawn();

        let snapshot = handle.settled().await.unwrap();
        assert_eq!(snapshot.permissions(), Permissions::for_role(Role::Standard));
    }

    #[tokio::test]
    async fn test_unapproved_identity_skips_role_lookup() {
        let dir = Arc::new(InMemoryDirectory::new());
        let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
        dir.register_with_role(&ana, Role::Admin);

        let (_identity_tx, identity_rx) = watch::channel(Some(ana));
        let (controller, handle) =
            AccessController::new(dir.clone(), dir.clone(), identity_rx, &AccessConfig::default());
        controller.spawn();

        let snapshot = handle.settled().await.unwrap();
        assert_eq!(snapshot.decision(), AccessDecision::AwaitingApproval);
        assert_eq!(dir.role_lookups(), 0);
    }

    #[tokio::test]
    async fn test_stops_when_session_closes() {
        let dir = Arc::new(InMemoryDirectory::new());
        let (identity_tx, identity_rx) = watch::channel(None);
        let (controller, handle) =
            AccessController::new(dir.clone(), dir, identity_rx, &AccessConfig::default());
        let task = controller.spawn();

        let snapshot = handle.settled().await.unwrap();
        assert_eq!(snapshot.decision(), AccessDecision::SignInRequired);

        drop(identity_tx);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
