//! Menu item types.

use serde::{Deserialize, Serialize};

use sliceworks_core::{MenuItemId, Price};

/// An item on the menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub title: String,
    pub description: String,
    /// Image reference (filename or URL).
    pub image: String,
    pub price: Price,
}

/// A menu item as submitted by an admin.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub title: String,
    pub description: String,
    pub image: String,
    pub price: Price,
}
