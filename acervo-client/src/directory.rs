//! REST directory
//!
//! Role, approval and administration calls against the backend's REST layer
//! (`user_roles` and `profiles` tables). Row-level security on those tables
//! is what actually restricts writes to administrators.

use std::collections::HashMap;

use acervo_access::{AdminDirectory, ApprovalSource, LookupError, RoleSource};
use async_trait::async_trait;
use shared::models::{Member, Profile, ProfileApproval, Role, RoleAssignment, RoleRow};
use uuid::Uuid;

use crate::{ClientResult, HttpClient, SessionStore};

const PROFILE_COLUMNS: &str = "id,full_name,created_at,approved";

#[derive(Debug, Clone)]
pub struct RestDirectory {
    session: SessionStore,
}

impl RestDirectory {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    fn http(&self) -> &HttpClient {
        self.session.http()
    }

    fn token(&self) -> ClientResult<String> {
        self.session.access_token()
    }

    /// Latest role row of `user_id`
    pub async fn fetch_role(&self, user_id: Uuid) -> ClientResult<Option<Role>> {
        let token = self.token()?;
        let path = format!(
            "rest/v1/user_roles?select=role&user_id=eq.{user_id}&order=created_at.desc&limit=1"
        );
        let rows: Vec<RoleRow> = self.http().get(&path, Some(&token)).await?;
        match rows.first() {
            Some(row) => Ok(Some(row.parse_role()?)),
            None => Ok(None),
        }
    }

    /// Approval flag of `user_id`; `false` when no profile row is visible
    pub async fn fetch_approval(&self, user_id: Uuid) -> ClientResult<bool> {
        let token = self.token()?;
        let path = format!("rest/v1/profiles?select=id,approved&id=eq.{user_id}");
        let rows: Vec<Profile> = self.http().get(&path, Some(&token)).await?;
        Ok(rows.first().is_some_and(|p| p.approved))
    }

    pub async fn upsert_role(&self, user_id: Uuid, role: Role) -> ClientResult<()> {
        let token = self.token()?;
        let body = RoleAssignment { user_id, role };
        self.http()
            .post_no_content(
                "rest/v1/user_roles?on_conflict=user_id",
                Some(&token),
                Some(&body),
                Some("resolution=merge-duplicates,return=minimal"),
            )
            .await
    }

    pub async fn mark_approved(&self, user_id: Uuid) -> ClientResult<()> {
        let token = self.token()?;
        let path = format!("rest/v1/profiles?id=eq.{user_id}");
        self.http()
            .patch_no_content(&path, Some(&token), &ProfileApproval { approved: true })
            .await
    }

    /// Remove the account; profile and role rows go with it
    pub async fn delete_user(&self, user_id: Uuid) -> ClientResult<()> {
        let token = self.token()?;
        self.http()
            .delete_no_content(&format!("auth/v1/admin/users/{user_id}"), Some(&token))
            .await
    }

    pub async fn fetch_pending(&self) -> ClientResult<Vec<Profile>> {
        let token = self.token()?;
        let path = format!(
            "rest/v1/profiles?select={PROFILE_COLUMNS}&approved=eq.false&order=created_at.desc"
        );
        self.http().get(&path, Some(&token)).await
    }

    /// Every profile joined with its latest role
    pub async fn fetch_members(&self) -> ClientResult<Vec<Member>> {
        let token = self.token()?;
        let profiles: Vec<Profile> = self
            .http()
            .get(
                &format!("rest/v1/profiles?select={PROFILE_COLUMNS}&order=created_at.asc"),
                Some(&token),
            )
            .await?;
        let rows: Vec<RoleRow> = self
            .http()
            .get(
                "rest/v1/user_roles?select=user_id,role&order=created_at.desc",
                Some(&token),
            )
            .await?;

        let mut roles: HashMap<Uuid, Role> = HashMap::new();
        for row in rows {
            let Some(user_id) = row.user_id else { continue };
            if roles.contains_key(&user_id) {
                continue;
            }
            roles.insert(user_id, row.parse_role()?);
        }

        Ok(profiles
            .into_iter()
            .map(|profile| Member {
                role: roles.get(&profile.id).copied(),
                id: profile.id,
                full_name: profile.full_name,
                approved: profile.approved,
            })
            .collect())
    }
}

#[async_trait]
impl RoleSource for RestDirectory {
    async fn role_for(&self, user_id: Uuid) -> Result<Option<Role>, LookupError> {
        Ok(self.fetch_role(user_id).await?)
    }
}

#[async_trait]
impl ApprovalSource for RestDirectory {
    async fn approval_for(&self, user_id: Uuid) -> Result<bool, LookupError> {
        Ok(self.fetch_approval(user_id).await?)
    }
}

#[async_trait]
impl AdminDirectory for RestDirectory {
    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<(), LookupError> {
        Ok(self.upsert_role(user_id, role).await?)
    }

    async fn approve_identity(&self, user_id: Uuid) -> Result<(), LookupError> {
        Ok(self.mark_approved(user_id).await?)
    }

    async fn delete_identity(&self, user_id: Uuid) -> Result<(), LookupError> {
        Ok(self.delete_user(user_id).await?)
    }

    async fn pending_profiles(&self) -> Result<Vec<Profile>, LookupError> {
        Ok(self.fetch_pending().await?)
    }

    async fn members(&self) -> Result<Vec<Member>, LookupError> {
        Ok(self.fetch_members().await?)
    }
}
