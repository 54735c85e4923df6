//! In-process directory
//!
//! Implements every source trait over a `DashMap`. Used by tests and local
//! demos; lookups can be delayed or failed per identity to exercise the
//! loading and error paths.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use shared::models::{Identity, Member, Profile, Role};
use uuid::Uuid;

use crate::error::LookupError;
use crate::source::{AdminDirectory, ApprovalSource, RoleSource};

#[derive(Debug, Clone)]
struct Account {
    profile: Profile,
    /// Raw wire value, so unrecognized strings can be stored
    role: Option<String>,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: DashMap<Uuid, Account>,
    delays: DashMap<Uuid, Duration>,
    offline: AtomicBool,
    next_seq: AtomicU64,
    role_lookups: AtomicUsize,
    approval_lookups: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unapproved profile without a role
    pub fn register(&self, identity: &Identity) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let full_name = identity
            .email
            .split('@')
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        self.accounts.insert(
            identity.id,
            Account {
                profile: Profile {
                    id: identity.id,
                    full_name,
                    approved: false,
                    created_at: Some(Utc::now()),
                },
                role: None,
                seq,
            },
        );
    }

    /// Create an unapproved profile with `role`
    pub fn register_with_role(&self, identity: &Identity, role: Role) {
        self.register(identity);
        self.set_raw_role(identity.id, role.as_str());
    }

    pub fn approve(&self, user_id: Uuid) {
        if let Some(mut account) = self.accounts.get_mut(&user_id) {
            account.profile.approved = true;
        }
    }

    /// Store a role string as-is
    pub fn set_raw_role(&self, user_id: Uuid, role: &str) {
        if let Some(mut account) = self.accounts.get_mut(&user_id) {
            account.role = Some(role.to_string());
        }
    }

    /// Delay every lookup for `user_id`
    pub fn set_delay(&self, user_id: Uuid, delay: Duration) {
        self.delays.insert(user_id, delay);
    }

    pub fn clear_delay(&self, user_id: Uuid) {
        self.delays.remove(&user_id);
    }

    /// Fail every call with a transient error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn role_lookups(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }

    pub fn approval_lookups(&self) -> usize {
        self.approval_lookups.load(Ordering::SeqCst)
    }

    pub fn is_approved(&self, user_id: Uuid) -> Option<bool> {
        self.accounts.get(&user_id).map(|a| a.profile.approved)
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.accounts.contains_key(&user_id)
    }

    async fn simulate(&self, user_id: Option<Uuid>) -> Result<(), LookupError> {
        let delay = user_id.and_then(|id| self.delays.get(&id).map(|d| *d));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(LookupError::transient("directory offline"));
        }
        Ok(())
    }

    fn require_account(&self, user_id: Uuid) -> Result<(), LookupError> {
        if self.accounts.contains_key(&user_id) {
            Ok(())
        } else {
            Err(LookupError::Rejected(format!("no profile for {user_id}")))
        }
    }
}

#[async_trait]
impl RoleSource for InMemoryDirectory {
    async fn role_for(&self, user_id: Uuid) -> Result<Option<Role>, LookupError> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        self.simulate(Some(user_id)).await?;

        let raw = self.accounts.get(&user_id).and_then(|a| a.role.clone());
        match raw {
            Some(raw) => Ok(Some(raw.parse()?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ApprovalSource for InMemoryDirectory {
    async fn approval_for(&self, user_id: Uuid) -> Result<bool, LookupError> {
        self.approval_lookups.fetch_add(1, Ordering::SeqCst);
        self.simulate(Some(user_id)).await?;

        Ok(self
            .accounts
            .get(&user_id)
            .map(|a| a.profile.approved)
            .unwrap_or(false))
    }
}

#[async_trait]
impl AdminDirectory for InMemoryDirectory {
    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<(), LookupError> {
        self.simulate(None).await?;
        self.require_account(user_id)?;
        self.set_raw_role(user_id, role.as_str());
        Ok(())
    }

    async fn approve_identity(&self, user_id: Uuid) -> Result<(), LookupError> {
        self.simulate(None).await?;
        self.require_account(user_id)?;
        self.approve(user_id);
        Ok(())
    }

    async fn delete_identity(&self, user_id: Uuid) -> Result<(), LookupError> {
        self.simulate(None).await?;
        self.accounts
            .remove(&user_id)
            .map(|_| ())
            .ok_or_else(|| LookupError::Rejected(format!("no profile for {user_id}")))
    }

    async fn pending_profiles(&self) -> Result<Vec<Profile>, LookupError> {
        self.simulate(None).await?;
        let mut pending: Vec<(u64, Profile)> = self
            .accounts
            .iter()
            .filter(|entry| !entry.profile.approved)
            .map(|entry| (entry.seq, entry.profile.clone()))
            .collect();
        pending.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(pending.into_iter().map(|(_, profile)| profile).collect())
    }

    async fn members(&self) -> Result<Vec<Member>, LookupError> {
        self.simulate(None).await?;
        let mut accounts: Vec<Account> = self.accounts.iter().map(|e| e.value().clone()).collect();
        accounts.sort_by_key(|a| a.seq);

        accounts
            .into_iter()
            .map(|account| -> Result<Member, LookupError> {
                let role = account.role.as_deref().map(str::parse::<Role>).transpose()?;
                Ok(Member {
                    id: account.profile.id,
                    full_name: account.profile.full_name,
                    approved: account.profile.approved,
                    role,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_newest_first() {
        let dir = InMemoryDirectory::new();
        let first = Identity::new(Uuid::new_v4(), "first@example.com");
        let second = Identity::new(Uuid::new_v4(), "second@example.com");
        let third = Identity::new(Uuid::new_v4(), "third@example.com");
        dir.register(&first);
        dir.register(&second);
        dir.register(&third);
        dir.approve(second.id);

        let pending = dir.pending_profiles().await.unwrap();
        let ids: Vec<_> = pending.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        assert_eq!(pending[0].full_name.as_deref(), Some("third"));
    }

    #[tokio::test]
    async fn test_members_keep_missing_role() {
        let dir = InMemoryDirectory::new();
        let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
        let bruno = Identity::new(Uuid::new_v4(), "bruno@example.com");
        dir.register_with_role(&ana, Role::Admin);
        dir.register(&bruno);

        let members = dir.members().await.unwrap();
        assert_eq!(members[0].role, Some(Role::Admin));
        assert_eq!(members[1].role, None);
    }

    #[tokio::test]
    async fn test_members_reject_unknown_role() {
        let dir = InMemoryDirectory::new();
        let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
        dir.register(&ana);
        dir.set_raw_role(ana.id, "owner");

        assert!(matches!(
            dir.members().await,
            Err(LookupError::UnknownRole(_))
        ));
    }

    #[tokio::test]
    async fn test_mutations_require_profile() {
        let dir = InMemoryDirectory::new();
        let ghost = Uuid::new_v4();
        assert!(matches!(
            dir.approve_identity(ghost).await,
            Err(LookupError::Rejected(_))
        ));
        assert!(matches!(
            dir.set_role(ghost, Role::ReadOnly).await,
            Err(LookupError::Rejected(_))
        ));
        assert!(matches!(
            dir.delete_identity(ghost).await,
            Err(LookupError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_identity_loses_role_and_approval() {
        let dir = InMemoryDirectory::new();
        let ana = Identity::new(Uuid::new_v4(), "ana@example.com");
        dir.register_with_role(&ana, Role::Admin);
        dir.approve(ana.id);

        dir.delete_identity(ana.id).await.unwrap();
        assert!(!dir.contains(ana.id));
        assert_eq!(dir.role_for(ana.id).await.unwrap(), None);
        assert!(!dir.approval_for(ana.id).await.unwrap());
        assert!(dir.members().await.unwrap().is_empty());
    }
}
