//! Component Guard
//!
//! Inline gate for a piece of interface. Pure: reads a snapshot, returns what
//! to render. No navigation, no notices, no logging.

use crate::evaluator::{AccessDecision, AccessSnapshot};
use crate::permissions::Capability;
use crate::source::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    Allow,
    Deny,
    Unavailable,
}

/// Output of a component guard
///
/// `F` is the caller's fallback type, [`Notice`] when none was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<C, F = Notice> {
    /// Neutral loading indicator
    Loading,
    Children(C),
    Fallback(F),
    /// "Unable to verify access" notice
    Unavailable(Notice),
}

impl<C, F> Rendered<C, F> {
    pub fn is_children(&self) -> bool {
        matches!(self, Self::Children(_))
    }

    pub fn children(self) -> Option<C> {
        match self {
            Self::Children(c) => Some(c),
            _ => None,
        }
    }
}

/// Renders children only when every required flag is granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentGuard {
    required: Capability,
}

impl ComponentGuard {
    pub fn new(required: Capability) -> Self {
        Self { required }
    }

    pub fn require_write() -> Self {
        Self::new(Capability::WRITE)
    }

    pub fn require_delete() -> Self {
        Self::new(Capability::DELETE)
    }

    pub fn require_user_management() -> Self {
        Self::new(Capability::MANAGE_USERS)
    }

    pub fn require_admin() -> Self {
        Self::new(Capability::ADMIN_PANEL)
    }

    /// Add flags to the requirement
    pub fn and(mut self, more: Capability) -> Self {
        self.required |= more;
        self
    }

    pub fn required(&self) -> Capability {
        self.required
    }

    pub fn decide(&self, snapshot: &AccessSnapshot) -> GuardDecision {
        match snapshot.decision() {
            AccessDecision::Loading => GuardDecision::Loading,
            AccessDecision::Unavailable { .. } => GuardDecision::Unavailable,
            AccessDecision::SignInRequired | AccessDecision::AwaitingApproval => GuardDecision::Deny,
            AccessDecision::Granted { permissions } if permissions.grants(self.required) => {
                GuardDecision::Allow
            }
            AccessDecision::Granted { .. } => GuardDecision::Deny,
        }
    }

    /// Render with the default access-denied notice as fallback
    pub fn render<C>(&self, snapshot: &AccessSnapshot, children: impl FnOnce() -> C) -> Rendered<C> {
        self.render_or(snapshot, children, Notice::access_denied)
    }

    /// Render with a caller-supplied fallback
    ///
    /// Neither closure runs unless its branch is chosen.
    pub fn render_or<C, F>(
        &self,
        snapshot: &AccessSnapshot,
        children: impl FnOnce() -> C,
        fallback: impl FnOnce() -> F,
    ) -> Rendered<C, F> {
        match self.decide(snapshot) {
            GuardDecision::Loading => Rendered::Loading,
            GuardDecision::Allow => Rendered::Children(children()),
            GuardDecision::Deny => Rendered::Fallback(fallback()),
            GuardDecision::Unavailable => Rendered::Unavailable(Notice::unavailable()),
        }
    }
}
