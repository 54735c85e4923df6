//! Route Guard
//!
//! Navigation-level gate. One instance lives as long as the routed view is
//! mounted and is fed every new snapshot through [`RouteGuard::update`].
//! Side effects (redirect, notice) fire only on entering a phase, never on
//! a repeated update in the same phase.

use crate::config::AccessConfig;
use crate::evaluator::{AccessDecision, AccessSnapshot};
use crate::permissions::Capability;
use crate::routes::{Route, RouteAccess};
use crate::source::{Navigator, Notice, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePhase {
    Pending,
    Allowed,
    Denied,
    SignInRequired,
    AwaitingApproval,
    Unavailable,
}

/// What the routed view shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteView {
    /// Full-screen loading state; the view itself is not rendered
    FullScreenLoading,
    Render,
    /// A redirect was issued
    Nothing,
    /// Waiting screen with a sign-out action
    AwaitingApproval(Notice),
    /// "Unable to verify access, retry"
    Unavailable(Notice),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    required: Capability,
    redirect_to: String,
    sign_in_path: String,
    phase: RoutePhase,
}

impl RouteGuard {
    /// Guard requiring `required`, redirecting to `/` on denial
    pub fn new(required: Capability) -> Self {
        Self::with_config(required, &AccessConfig::default())
    }

    pub fn with_config(required: Capability, config: &AccessConfig) -> Self {
        Self {
            required,
            redirect_to: config.denied_redirect.clone(),
            sign_in_path: config.sign_in_path.clone(),
            phase: RoutePhase::Pending,
        }
    }

    /// Guard for a registered route; `None` for public routes
    pub fn for_route(route: &Route, config: &AccessConfig) -> Option<Self> {
        match route.access {
            RouteAccess::Public => None,
            RouteAccess::Authenticated => Some(Self::with_config(Capability::empty(), config)),
            RouteAccess::Requires(required) => Some(Self::with_config(required, config)),
        }
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = path.into();
        self
    }

    pub fn phase(&self) -> RoutePhase {
        self.phase
    }

    pub fn required(&self) -> Capability {
        self.required
    }

    fn next_phase(&self, snapshot: &AccessSnapshot) -> RoutePhase {
        match snapshot.decision() {
            AccessDecision::Loading => RoutePhase::Pending,
            AccessDecision::SignInRequired => RoutePhase::SignInRequired,
            AccessDecision::AwaitingApproval => RoutePhase::AwaitingApproval,
            AccessDecision::Unavailable { .. } => RoutePhase::Unavailable,
            AccessDecision::Granted { permissions } if permissions.grants(self.required) => {
                RoutePhase::Allowed
            }
            AccessDecision::Granted { .. } => RoutePhase::Denied,
        }
    }

    /// Feed the latest snapshot and get what to render
    pub fn update(
        &mut self,
        snapshot: &AccessSnapshot,
        navigator: &dyn Navigator,
        notifier: &dyn Notifier,
    ) -> RouteView {
        let next = self.next_phase(snapshot);
        let entered = next != self.phase;
        self.phase = next;

        match next {
            RoutePhase::Pending => RouteView::FullScreenLoading,
            RoutePhase::Allowed => RouteView::Render,
            RoutePhase::Denied => {
                if entered {
                    tracing::debug!(
                        redirect = %self.redirect_to,
                        missing = ?snapshot.permissions().missing(self.required).names(),
                        "Route access denied"
                    );
                    navigator.navigate_to(&self.redirect_to);
                    notifier.notify(&Notice::route_denied());
                }
                RouteView::Nothing
            }
            RoutePhase::SignInRequired => {
                if entered {
                    navigator.navigate_to(&self.sign_in_path);
                }
                RouteView::Nothing
            }
            RoutePhase::AwaitingApproval => RouteView::AwaitingApproval(Notice::awaiting_approval()),
            RoutePhase::Unavailable => RouteView::Unavailable(Notice::unavailable()),
        }
    }
}
