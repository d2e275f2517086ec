//! Franchise and store types.

use serde::{Deserialize, Serialize};

use sliceworks_core::{Email, FranchiseId, StoreId};

use super::user::UserSummary;

/// A franchise with its stores.
///
/// The store set is owned exclusively by the franchise: deleting the
/// franchise removes its stores.
#[derive(Debug, Clone, Serialize)]
pub struct Franchise {
    pub id: FranchiseId,
    pub name: String,
    pub admins: Vec<UserSummary>,
    pub stores: Vec<Store>,
}

/// A store belonging to a franchise.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub franchise_id: FranchiseId,
    pub name: String,
}

/// A franchise creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFranchise {
    pub name: String,
    /// Users to install as franchise admins, referenced by email.
    #[serde(default)]
    pub admins: Vec<AdminRef>,
}

/// Reference to an existing user by email.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminRef {
    pub email: Email,
}

/// A store creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStore {
    pub name: String,
}
