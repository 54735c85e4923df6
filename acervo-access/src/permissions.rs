//! Permission Definitions
//!
//! Static role → capability table.
//!
//! | Role | canRead | canWrite | canDelete | canManageUsers | canAccessAdminPanel |
//! |------|---------|----------|-----------|----------------|---------------------|
//! | admin | ✓ | ✓ | ✓ | ✓ | ✓ |
//! | user (standard) | ✓ | ✓ | ✓ | | |
//! | read_only | ✓ | | | | |
//!
//! The table is fixed for the lifetime of the process. Real enforcement of the
//! same rules lives in the backend's row-level security; these flags only
//! decide what the interface shows.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use shared::models::Role;

bitflags! {
    /// Set of capabilities a guard can require
    ///
    /// Flags combine with `|`; a guard passes only when every flag in its
    /// requirement is granted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capability: u8 {
        const READ         = 0b0000_0001;
        const WRITE        = 0b0000_0010;
        const DELETE       = 0b0000_0100;
        const MANAGE_USERS = 0b0000_1000;
        const ADMIN_PANEL  = 0b0001_0000;
    }
}

impl Capability {
    /// Field names as they appear in [`Permissions`]' serialized form
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::READ) {
            names.push("canRead");
        }
        if self.contains(Self::WRITE) {
            names.push("canWrite");
        }
        if self.contains(Self::DELETE) {
            names.push("canDelete");
        }
        if self.contains(Self::MANAGE_USERS) {
            names.push("canManageUsers");
        }
        if self.contains(Self::ADMIN_PANEL) {
            names.push("canAccessAdminPanel");
        }
        names
    }
}

/// Capability record of a session
///
/// Derived from [`Role`] on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_read: bool,
    pub can_write: bool,
    pub can_delete: bool,
    pub can_manage_users: bool,
    pub can_access_admin_panel: bool,
}

pub const ADMIN_PERMISSIONS: Permissions = Permissions {
    can_read: true,
    can_write: true,
    can_delete: true,
    can_manage_users: true,
    can_access_admin_panel: true,
};

pub const STANDARD_PERMISSIONS: Permissions = Permissions {
    can_read: true,
    can_write: true,
    can_delete: true,
    can_manage_users: false,
    can_access_admin_panel: false,
};

pub const READ_ONLY_PERMISSIONS: Permissions = Permissions {
    can_read: true,
    can_write: false,
    can_delete: false,
    can_manage_users: false,
    can_access_admin_panel: false,
};

impl Permissions {
    /// Nothing granted
    pub const NONE: Permissions = Permissions {
        can_read: false,
        can_write: false,
        can_delete: false,
        can_manage_users: false,
        can_access_admin_panel: false,
    };

    /// Table lookup
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::Standard => STANDARD_PERMISSIONS,
            Role::ReadOnly => READ_ONLY_PERMISSIONS,
        }
    }

    pub fn capabilities(&self) -> Capability {
        let mut caps = Capability::empty();
        caps.set(Capability::READ, self.can_read);
        caps.set(Capability::WRITE, self.can_write);
        caps.set(Capability::DELETE, self.can_delete);
        caps.set(Capability::MANAGE_USERS, self.can_manage_users);
        caps.set(Capability::ADMIN_PANEL, self.can_access_admin_panel);
        caps
    }

    /// True when every flag of `required` is granted
    pub fn grants(&self, required: Capability) -> bool {
        self.capabilities().contains(required)
    }

    /// Flags of `required` that are not granted
    pub fn missing(&self, required: Capability) -> Capability {
        required.difference(self.capabilities())
    }
}

/// Capability record for an optional role
///
/// `None` (unresolved, signed out, unassigned) grants nothing.
pub const fn evaluate(role: Option<Role>) -> Permissions {
    match role {
        Some(role) => Permissions::for_role(role),
        None => Permissions::NONE,
    }
}
