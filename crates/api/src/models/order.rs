//! Order types and the fulfillment state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sliceworks_core::{FranchiseId, MenuItemId, OrderId, Price, StoreId};

/// A placed order.
///
/// Immutable once fulfillment has been initiated, except for the attached
/// fulfillment outcome (receipt / report reference) recorded on the row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub franchise_id: FranchiseId,
    pub store_id: StoreId,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Total price of the order: the sum of its item prices at creation
    /// time. There is no post-creation repricing.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|i| i.price).sum()
    }
}

/// A line item within an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_id: MenuItemId,
    pub description: String,
    pub price: Price,
}

/// An order creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub franchise_id: FranchiseId,
    pub store_id: StoreId,
    pub items: Vec<OrderItem>,
}

/// Terminal state of an order's fulfillment.
///
/// `Pending` is set when the order row is persisted; exactly one of the
/// other states is recorded after the factory call and never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentStatus {
    Pending,
    Fulfilled,
    Rejected,
    Unreachable,
}

impl FulfillmentStatus {
    /// The status as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled => "fulfilled",
            Self::Rejected => "rejected",
            Self::Unreachable => "unreachable",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_of_item_prices() {
        let order = Order {
            id: OrderId::new(1),
            franchise_id: FranchiseId::new(1),
            store_id: StoreId::new(1),
            created_at: Utc::now(),
            items: vec![
                OrderItem {
                    menu_id: MenuItemId::new(1),
                    description: "Veggie".to_string(),
                    price: serde_json::from_str("0.05").unwrap(),
                },
                OrderItem {
                    menu_id: MenuItemId::new(2),
                    description: "Margarita".to_string(),
                    price: serde_json::from_str("0.0038").unwrap(),
                },
            ],
        };

        assert_eq!(order.total().amount(), "0.0538".parse().unwrap());
    }

    #[test]
    fn test_order_wire_format_is_camel_case() {
        let order = Order {
            id: OrderId::new(1),
            franchise_id: FranchiseId::new(2),
            store_id: StoreId::new(3),
            created_at: Utc::now(),
            items: vec![],
        };

        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("franchiseId").is_some());
        assert!(json.get("storeId").is_some());
        assert!(json.get("date").is_some());
    }
}
