//! Permission Evaluator
//!
//! Holds the access state of the current session and turns it into an
//! [`AccessDecision`]. Nothing is granted until the approval check and the
//! role lookup for the *current* identity have both completed.
//!
//! Every lookup is issued against a [`Ticket`]. A result is applied only if
//! its ticket still matches the evaluator's generation and identity, so a
//! lookup started for a previous identity can never leak into the session of
//! the next one.

use serde::Serialize;
use shared::models::Identity;

use crate::approval::ApprovalState;
use crate::error::{AccessError, LookupError};
use crate::permissions::{Capability, Permissions, evaluate};
use crate::resolver::{RoleResolution, RoleStatus};

/// What the session knows about who is signed in
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// Session not read yet
    #[default]
    Unknown,
    SignedOut,
    SignedIn(Identity),
}

impl IdentityState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Final access decision consumed by guards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Some lookup is still outstanding
    Loading,
    SignInRequired,
    /// Signed in, not approved yet: only the waiting notice and sign-out
    AwaitingApproval,
    /// Role or approval could not be verified
    Unavailable {
        #[serde(serialize_with = "serialize_display")]
        error: LookupError,
    },
    Granted { permissions: Permissions },
}

fn serialize_display<S: serde::Serializer>(err: &LookupError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

impl AccessDecision {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Granted capabilities; all false unless fully resolved
    pub fn permissions(&self) -> Permissions {
        match self {
            Self::Granted { permissions } => *permissions,
            _ => Permissions::NONE,
        }
    }

    /// Check `required` against this decision
    pub fn require(&self, required: Capability) -> Result<Permissions, AccessError> {
        match self {
            Self::Loading => Err(AccessError::Pending),
            Self::SignInRequired => Err(AccessError::NotSignedIn),
            Self::AwaitingApproval => Err(AccessError::ApprovalPending),
            Self::Unavailable { error } => Err(AccessError::Unverified(error.clone())),
            Self::Granted { permissions } if permissions.grants(required) => Ok(*permissions),
            Self::Granted { permissions } => Err(AccessError::Denied {
                missing: permissions.missing(required).names(),
            }),
        }
    }
}

/// Point-in-time view of the session's access state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSnapshot {
    pub identity: IdentityState,
    pub approval: ApprovalState,
    pub role: RoleResolution,
    /// Bumped each time a new resolution starts
    pub generation: u64,
}

impl Default for AccessSnapshot {
    fn default() -> Self {
        Self {
            identity: IdentityState::Unknown,
            approval: ApprovalState::Unknown,
            role: RoleResolution::Pending,
            generation: 0,
        }
    }
}

impl AccessSnapshot {
    pub fn decision(&self) -> AccessDecision {
        match &self.identity {
            IdentityState::Unknown => AccessDecision::Loading,
            IdentityState::SignedOut => AccessDecision::SignInRequired,
            IdentityState::SignedIn(_) => match &self.approval {
                ApprovalState::Unknown => AccessDecision::Loading,
                ApprovalState::Failed(error) => AccessDecision::Unavailable {
                    error: error.clone(),
                },
                ApprovalState::PendingApproval => AccessDecision::AwaitingApproval,
                ApprovalState::Active => match &self.role {
                    // an active identity always gets a role lookup
                    RoleResolution::Pending | RoleResolution::Skipped => AccessDecision::Loading,
                    RoleResolution::Failed(error) => AccessDecision::Unavailable {
                        error: error.clone(),
                    },
                    // approval implies a signed-in identity; treat a mismatch as nothing granted
                    RoleResolution::SignedOut | RoleResolution::Unassigned => {
                        AccessDecision::Granted {
                            permissions: Permissions::NONE,
                        }
                    }
                    RoleResolution::Resolved(role) => AccessDecision::Granted {
                        permissions: evaluate(Some(*role)),
                    },
                },
            },
        }
    }

    pub fn permissions(&self) -> Permissions {
        self.decision().permissions()
    }

    pub fn loading(&self) -> bool {
        self.decision().is_loading()
    }

    /// Check `required`, telling a missing role record apart from a role
    /// that lacks the capability
    pub fn require(&self, required: Capability) -> Result<Permissions, AccessError> {
        match self.decision().require(required) {
            Err(AccessError::Denied { .. }) if self.role == RoleResolution::Unassigned => {
                Err(AccessError::Unassigned)
            }
            other => other,
        }
    }

    /// `{ role, loading }` of the current identity
    pub fn role_status(&self) -> RoleStatus {
        match &self.identity {
            IdentityState::Unknown => RoleStatus {
                role: None,
                loading: true,
            },
            _ => self.role.status(),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.identity()
    }
}

/// Token tying a lookup to the state that requested it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    identity: Identity,
}

impl Ticket {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct PermissionEvaluator {
    snapshot: AccessSnapshot,
}

impl PermissionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &AccessSnapshot {
        &self.snapshot
    }

    /// Start over for a new session identity
    ///
    /// Everything known about the previous identity is dropped. Returns the
    /// ticket the lookups for `identity` must carry, or `None` when signed out.
    pub fn begin(&mut self, identity: Option<Identity>) -> Option<Ticket> {
        self.snapshot.generation += 1;
        match identity {
            None => {
                self.snapshot.identity = IdentityState::SignedOut;
                self.snapshot.approval = ApprovalState::Unknown;
                self.snapshot.role = RoleResolution::SignedOut;
                None
            }
            Some(identity) => {
                self.snapshot.identity = IdentityState::SignedIn(identity.clone());
                self.snapshot.approval = ApprovalState::Unknown;
                self.snapshot.role = RoleResolution::Pending;
                Some(Ticket {
                    generation: self.snapshot.generation,
                    identity,
                })
            }
        }
    }

    /// Re-run lookups for the same identity
    ///
    /// The current decision stays visible until the new results arrive;
    /// results of any earlier ticket are discarded from now on.
    pub fn begin_refresh(&mut self) -> Option<Ticket> {
        let identity = self.snapshot.identity.identity()?.clone();
        self.snapshot.generation += 1;
        Some(Ticket {
            generation: self.snapshot.generation,
            identity,
        })
    }

    /// Apply lookup results issued under `ticket`
    ///
    /// `role` is `None` when no role result is available: while approval is
    /// active or unknown the role is still pending, otherwise the lookup was skipped.
    /// Returns `false` and changes nothing if the ticket is stale.
    pub fn apply(
        &mut self,
        ticket: &Ticket,
        approval: ApprovalState,
        role: Option<RoleResolution>,
    ) -> bool {
        let current = self.snapshot.identity.identity();
        if ticket.generation != self.snapshot.generation
            || current.map(|i| i.id) != Some(ticket.identity.id)
        {
            tracing::debug!(
                user_id = %ticket.identity.id,
                ticket = ticket.generation,
                current = self.snapshot.generation,
                "Discarding stale access resolution"
            );
            return false;
        }

        self.snapshot.role = match role {
            Some(role) => role,
            None if matches!(approval, ApprovalState::Active | ApprovalState::Unknown) => {
                RoleResolution::Pending
            }
            None => RoleResolution::Skipped,
        };
        self.snapshot.approval = approval;
        true
    }
}
