//! Administration console
//!
//! Account management actions, exposed only to sessions that hold
//! `canManageUsers`. The backend enforces the same rule again; this layer
//! decides what the interface offers and refuses early.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use shared::models::{Member, Profile, Role};
use uuid::Uuid;

use crate::controller::AccessHandle;
use crate::error::AccessError;
use crate::permissions::Capability;
use crate::source::AdminDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    ListPending,
    ListMembers,
    RoleSummary,
    ApproveIdentity(Uuid),
    SetRole(Uuid, Role),
    DeleteIdentity(Uuid),
}

impl AdminAction {
    pub fn required(&self) -> Capability {
        Capability::MANAGE_USERS
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListPending => "list_pending",
            Self::ListMembers => "list_members",
            Self::RoleSummary => "role_summary",
            Self::ApproveIdentity(_) => "approve_identity",
            Self::SetRole(..) => "set_role",
            Self::DeleteIdentity(_) => "delete_identity",
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApproveIdentity(id) | Self::DeleteIdentity(id) => write!(f, "{} {id}", self.name()),
            Self::SetRole(id, role) => write!(f, "{} {id} {role}", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// Account counts, per role and by approval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub total: usize,
    pub pending: usize,
    pub admin: usize,
    pub standard: usize,
    pub read_only: usize,
    /// Accounts without a role record
    pub unassigned: usize,
}

impl RoleSummary {
    pub fn from_members(members: &[Member]) -> Self {
        members.iter().fold(Self::default(), |mut summary, member| {
            summary.total += 1;
            if !member.approved {
                summary.pending += 1;
            }
            match member.role {
                Some(Role::Admin) => summary.admin += 1,
                Some(Role::Standard) => summary.standard += 1,
                Some(Role::ReadOnly) => summary.read_only += 1,
                None => summary.unassigned += 1,
            }
            summary
        })
    }

    pub fn count(&self, role: Role) -> usize {
        match role {
            Role::Admin => self.admin,
            Role::Standard => self.standard,
            Role::ReadOnly => self.read_only,
        }
    }
}

pub struct AdminConsole {
    directory: Arc<dyn AdminDirectory>,
    access: AccessHandle,
}

impl AdminConsole {
    pub fn new(directory: Arc<dyn AdminDirectory>, access: AccessHandle) -> Self {
        Self { directory, access }
    }

    /// Whether the console should be shown at all
    pub fn is_exposed(&self) -> bool {
        self.access
            .decision()
            .permissions()
            .grants(Capability::MANAGE_USERS)
    }

    fn authorize(&self, action: &AdminAction) -> Result<(), AccessError> {
        let snapshot = self.access.snapshot();
        let actor = snapshot.identity().map(|i| i.id);
        match snapshot.require(action.required()) {
            Ok(_) => Ok(()),
            Err(AccessError::Denied { .. }) => {
                security_log!(WARN, "admin_action_refused", action = %action, actor = ?actor);
                Err(AccessError::AdminRequired)
            }
            Err(AccessError::Unassigned) => {
                security_log!(WARN, "admin_action_refused", action = %action, actor = ?actor, reason = "unassigned");
                Err(AccessError::Unassigned)
            }
            Err(e) => {
                tracing::debug!(action = %action, error = %e, "Admin action not authorized");
                Err(e)
            }
        }
    }

    pub async fn pending(&self) -> Result<Vec<Profile>, AccessError> {
        self.authorize(&AdminAction::ListPending)?;
        self.directory
            .pending_profiles()
            .await
            .map_err(AccessError::Directory)
    }

    pub async fn members(&self) -> Result<Vec<Member>, AccessError> {
        self.authorize(&AdminAction::ListMembers)?;
        self.directory.members().await.map_err(AccessError::Directory)
    }

    pub async fn summary(&self) -> Result<RoleSummary, AccessError> {
        self.authorize(&AdminAction::RoleSummary)?;
        let members = self.directory.members().await.map_err(AccessError::Directory)?;
        Ok(RoleSummary::from_members(&members))
    }

    /// Approve `user_id`; approving an approved identity succeeds
    pub async fn approve(&self, user_id: Uuid) -> Result<(), AccessError> {
        let action = AdminAction::ApproveIdentity(user_id);
        self.authorize(&action)?;
        self.directory
            .approve_identity(user_id)
            .await
            .map_err(AccessError::Directory)?;
        security_log!(INFO, "identity_approved", user_id = %user_id);
        self.access.refresh();
        Ok(())
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<(), AccessError> {
        let action = AdminAction::SetRole(user_id, role);
        self.authorize(&action)?;
        self.directory
            .set_role(user_id, role)
            .await
            .map_err(AccessError::Directory)?;
        security_log!(INFO, "role_changed", user_id = %user_id, role = %role);
        self.access.refresh();
        Ok(())
    }

    /// Permanently remove `user_id`
    pub async fn delete_identity(&self, user_id: Uuid) -> Result<(), AccessError> {
        let action = AdminAction::DeleteIdentity(user_id);
        self.authorize(&action)?;
        self.directory
            .delete_identity(user_id)
            .await
            .map_err(AccessError::Directory)?;
        security_log!(WARN, "identity_deleted", user_id = %user_id);
        self.access.refresh();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessConfig;
    use crate::controller::AccessController;
    use crate::error::LookupError;
    use crate::memory::InMemoryDirectory;
    use shared::models::Identity;
    use tokio::sync::watch;

    async fn console_for(
        dir: &Arc<InMemoryDirectory>,
        identity: Identity,
    ) -> (AdminConsole, watch::Sender<Option<Identity>>) {
        let (identity_tx, identity_rx) = watch::channel(Some(identity));
        let (controller, handle) =
            AccessController::new(dir.clone(), dir.clone(), identity_rx, &AccessConfig::default());
        controller.spawn();
        handle.settled().await.unwrap();
        (AdminConsole::new(dir.clone(), handle), identity_tx)
    }

    fn active(dir: &InMemoryDirectory, email: &str, role: Role) -> Identity {
        let identity = Identity::new(Uuid::new_v4(), email);
        dir.register_with_role(&identity, role);
        dir.approve(identity.id);
        identity
    }

    #[tokio::test]
    async fn test_admin_approves_twice() {
        let dir = Arc::new(InMemoryDirectory::new());
        let admin = active(&dir, "admin@example.com", Role::Admin);
        let newcomer = Identity::new(Uuid::new_v4(), "new@example.com");
        dir.register(&newcomer);

        let (console, _tx) = console_for(&dir, admin).await;
        assert!(console.is_exposed());
        assert_eq!(console.pending().await.unwrap().len(), 1);

        console.approve(newcomer.id).await.unwrap();
        console.approve(newcomer.id).await.unwrap();
        assert_eq!(dir.is_approved(newcomer.id), Some(true));
        assert!(console.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_standard_user_is_refused() {
        let dir = Arc::new(InMemoryDirectory::new());
        let user = active(&dir, "user@example.com", Role::Standard);
        let target = Identity::new(Uuid::new_v4(), "target@example.com");
        dir.register(&target);

        let (console, _tx) = console_for(&dir, user).await;
        assert!(!console.is_exposed());
        assert_eq!(console.approve(target.id).await, Err(AccessError::AdminRequired));
        assert_eq!(
            console.set_role(target.id, Role::Admin).await,
            Err(AccessError::AdminRequired)
        );
        assert_eq!(dir.is_approved(target.id), Some(false));
    }

    #[tokio::test]
    async fn test_unassigned_identity_is_told_so() {
        let dir = Arc::new(InMemoryDirectory::new());
        let blank = Identity::new(Uuid::new_v4(), "blank@example.com");
        dir.register(&blank);
        dir.approve(blank.id);

        let (console, _tx) = console_for(&dir, blank).await;
        assert!(!console.is_exposed());
        assert!(matches!(console.members().await, Err(AccessError::Unassigned)));
    }

    #[tokio::test]
    async fn test_unapproved_admin_is_refused() {
        let dir = Arc::new(InMemoryDirectory::new());
        let admin = Identity::new(Uuid::new_v4(), "admin@example.com");
        dir.register_with_role(&admin, Role::Admin);

        let (console, _tx) = console_for(&dir, admin).await;
        assert!(!console.is_exposed());
        assert!(matches!(
            console.members().await,
            Err(AccessError::ApprovalPending)
        ));
    }

    #[tokio::test]
    async fn test_set_role_and_members() {
        let dir = Arc::new(InMemoryDirectory::new());
        let admin = active(&dir, "admin@example.com", Role::Admin);
        let member = Identity::new(Uuid::new_v4(), "member@example.com");
        dir.register(&member);

        let (console, _tx) = console_for(&dir, admin).await;
        let before = console.members().await.unwrap();
        assert_eq!(before.iter().find(|m| m.id == member.id).unwrap().role, None);

        console.set_role(member.id, Role::ReadOnly).await.unwrap();
        let after = console.members().await.unwrap();
        assert_eq!(
            after.iter().find(|m| m.id == member.id).unwrap().role,
            Some(Role::ReadOnly)
        );
    }

    #[tokio::test]
    async fn test_summary_counts_roles_and_pending() {
        let dir = Arc::new(InMemoryDirectory::new());
        let admin = active(&dir, "admin@example.com", Role::Admin);
        active(&dir, "reader@example.com", Role::ReadOnly);
        let waiting = Identity::new(Uuid::new_v4(), "waiting@example.com");
        dir.register_with_role(&waiting, Role::Standard);
        dir.register(&Identity::new(Uuid::new_v4(), "blank@example.com"));

        let (console, _tx) = console_for(&dir, admin).await;
        let summary = console.summary().await.unwrap();
        assert_eq!(
            summary,
            RoleSummary {
                total: 4,
                pending: 2,
                admin: 1,
                standard: 1,
                read_only: 1,
                unassigned: 1,
            }
        );
        assert_eq!(summary.count(Role::ReadOnly), 1);
    }

    #[tokio::test]
    async fn test_admin_deletes_identity() {
        let dir = Arc::new(InMemoryDirectory::new());
        let admin = active(&dir, "admin@example.com", Role::Admin);
        let leaving = active(&dir, "leaving@example.com", Role::Standard);

        let (console, _tx) = console_for(&dir, admin).await;
        console.delete_identity(leaving.id).await.unwrap();
        assert!(!dir.contains(leaving.id));
        assert_eq!(console.summary().await.unwrap().total, 1);

        assert!(matches!(
            console.delete_identity(leaving.id).await,
            Err(AccessError::Directory(LookupError::Rejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_delete_and_summary_require_user_management() {
        let dir = Arc::new(InMemoryDirectory::new());
        let reader = active(&dir, "reader@example.com", Role::ReadOnly);
        let target = active(&dir, "target@example.com", Role::Standard);

        let (console, _tx) = console_for(&dir, reader).await;
        assert_eq!(
            console.delete_identity(target.id).await,
            Err(AccessError::AdminRequired)
        );
        assert_eq!(console.summary().await, Err(AccessError::AdminRequired));
        assert!(dir.contains(target.id));
    }

    #[test]
    fn test_action_display() {
        let id = Uuid::nil();
        assert_eq!(
            AdminAction::DeleteIdentity(id).to_string(),
            format!("delete_identity {id}")
        );
        assert_eq!(AdminAction::RoleSummary.to_string(), "role_summary");
    }

    #[tokio::test]
    async fn test_directory_failure_is_reported() {
        let dir = Arc::new(InMemoryDirectory::new());
        let admin = active(&dir, "admin@example.com", Role::Admin);
        let (console, _tx) = console_for(&dir, admin).await;

        let ghost = Uuid::new_v4();
        assert!(matches!(
            console.approve(ghost).await,
            Err(AccessError::Directory(LookupError::Rejected(_)))
        ));
    }
}
