//! User identity types.

use serde::{Deserialize, Serialize};

use sliceworks_core::{Email, Role, RoleSet, UserId};

/// A registered identity.
///
/// Also the shape embedded in session token claims; a validated bearer token
/// resolves to one of these. Authorization decisions are made with the free
/// function [`has_role`] over the role set, never by methods attached to
/// deserialized token data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Database ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: Email,
    /// Granted roles.
    pub roles: RoleSet,
}

/// Capability check: does `user` hold `role`?
#[must_use]
pub fn has_role(user: &User, role: Role) -> bool {
    user.roles.contains(role)
}

/// Minimal identity reference used inside other aggregates
/// (franchise admin lists, factory payloads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}
