//! Acervo access control
//!
//! Role resolution, the static permission table, and the guards that decide
//! what a session may see.
//!
//! # Module layout
//!
//! - `permissions` - role → capability table
//! - `resolver` / `approval` - lookups through the source traits
//! - `evaluator` - session state and the final access decision
//! - `controller` - background task publishing snapshots
//! - `guard` / `route_guard` - component and navigation gates
//! - `routes` - route registry and menu filtering
//! - `admin` - account administration console
//! - `memory` - in-process directory
//!
//! These gates only shape the interface. The backend's row-level security is
//! the enforcement point for every read and write.

// Security logging macro, target "security"
#[macro_export]
macro_rules! security_log {
    ($level:ident, $event:expr, $($fields:tt)*) => {
        tracing::event!(
            target: "security",
            tracing::Level::$level,
            event = $event,
            $($fields)*
        )
    };
}

pub mod admin;
pub mod approval;
pub mod config;
pub mod controller;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod memory;
pub mod permissions;
pub mod resolver;
pub mod route_guard;
pub mod routes;
pub mod source;

pub use admin::{AdminAction, AdminConsole, RoleSummary};
pub use approval::{ApprovalGate, ApprovalState};
pub use config::AccessConfig;
pub use controller::{AccessController, AccessHandle};
pub use error::{AccessError, LookupError};
pub use evaluator::{AccessDecision, AccessSnapshot, IdentityState, PermissionEvaluator};
pub use guard::{ComponentGuard, GuardDecision, Rendered};
pub use memory::InMemoryDirectory;
pub use permissions::{Capability, Permissions, evaluate};
pub use resolver::{RoleResolution, RoleResolver, RoleStatus};
pub use route_guard::{RouteGuard, RoutePhase, RouteView};
pub use routes::{Route, RouteAccess, Section};
pub use source::{AdminDirectory, ApprovalSource, Navigator, Notice, Notifier, RoleSource, Severity};
