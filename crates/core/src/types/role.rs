//! User roles and role-set membership.
//!
//! Roles are a closed enumeration. Authorization checks are plain
//! set-membership tests on a [`RoleSet`]; no behavior is attached to
//! deserialized identity data.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Role`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum RoleError {
    /// The input does not name a known role.
    #[error("unknown role: {0}")]
    Unknown(String),
}

/// A user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A regular customer placing orders.
    Diner,
    /// An operator administering one or more franchises.
    Franchisee,
    /// A global administrator.
    Admin,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 3] = [Self::Diner, Self::Franchisee, Self::Admin];

    /// The role name as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Diner => "diner",
            Self::Franchisee => "franchisee",
            Self::Admin => "admin",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Diner => 1,
            Self::Franchisee => 1 << 1,
            Self::Admin => 1 << 2,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diner" => Ok(Self::Diner),
            "franchisee" => Ok(Self::Franchisee),
            "admin" => Ok(Self::Admin),
            other => Err(RoleError::Unknown(other.to_owned())),
        }
    }
}

/// A set of [`Role`]s.
///
/// Backed by a fixed-width bitset; `contains` is a constant-time membership
/// test. Serialized as a JSON array of role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    /// The empty role set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set containing a single role.
    #[must_use]
    pub const fn single(role: Role) -> Self {
        Self(role.bit())
    }

    /// Whether the set contains `role`.
    #[must_use]
    pub const fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Add a role to the set.
    pub const fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the roles in the set, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = Self::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roles = Vec::<Role>::deserialize(deserializer)?;
        Ok(roles.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let mut set = RoleSet::single(Role::Diner);
        assert!(set.contains(Role::Diner));
        assert!(!set.contains(Role::Admin));

        set.insert(Role::Admin);
        assert!(set.contains(Role::Admin));
        assert!(!set.contains(Role::Franchisee));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = RoleSet::single(Role::Admin);
        set.insert(Role::Admin);
        assert_eq!(set.iter().count(), 1);
    }

    #[test]
    fn test_serde_roundtrip() {
        let set: RoleSet = [Role::Diner, Role::Admin].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["diner","admin"]"#);

        let parsed: RoleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("chef".parse::<Role>().is_err());
    }
}
