//! Profile Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Row of the `profiles` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Set once by an administrator, never reverts
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Approval update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileApproval {
    pub approved: bool,
}

/// Account listed in the administration screens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub approved: bool,
    /// `None` when no role row exists; never defaulted to a role
    pub role: Option<Role>,
}

impl Member {
    pub fn display_name(&self) -> String {
        match &self.full_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.id.to_string(),
        }
    }
}
