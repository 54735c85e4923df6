//! Identity Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated principal issued by the hosted auth service
///
/// Owned by the identity provider; Acervo only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: String,
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}
