//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Privilege tier assigned to an identity
///
/// The wire form of [`Role::Standard`] is `"user"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(rename = "user")]
    Standard,
    ReadOnly,
}

impl Role {
    /// Every role, most privileged first
    pub const ALL: [Role; 3] = [Role::Admin, Role::Standard, Role::ReadOnly];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Standard => "user",
            Self::ReadOnly => "read_only",
        }
    }

    /// Human-readable label for administration screens
    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Standard => "User",
            Self::ReadOnly => "Read only",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role string that is not one of the known roles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Parse the wire form. `"standard"` is accepted as an alias of `"user"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" | "standard" => Ok(Self::Standard),
            "read_only" => Ok(Self::ReadOnly),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Row of the `user_roles` table
///
/// The role column stays a raw string so that an unrecognized value is
/// reported as [`UnknownRole`] instead of a generic decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub role: String,
}

impl RoleRow {
    pub fn parse_role(&self) -> Result<Role, UnknownRole> {
        self.role.parse()
    }
}

/// Upsert payload for the `user_roles` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: Uuid,
    pub role: Role,
}
