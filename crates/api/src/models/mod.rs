//! Domain models for the Sliceworks service.

pub mod franchise;
pub mod menu;
pub mod order;
pub mod user;

pub use franchise::{AdminRef, Franchise, NewFranchise, NewStore, Store};
pub use menu::{MenuItem, NewMenuItem};
pub use order::{FulfillmentStatus, NewOrder, Order, OrderItem};
pub use user::{User, UserSummary, has_role};
