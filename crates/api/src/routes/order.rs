//! Order route handlers: menu reads/writes and order placement.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use sliceworks_core::{Role, UserId};

use crate::db::menu::MenuRepository;
use crate::db::orders::OrderRepository;
use crate::error::{ApiError, Result};
use crate::middleware::RequireAuth;
use crate::models::{MenuItem, NewMenuItem, NewOrder, Order, has_role};
use crate::services::orders::{OrderService, PlacedOrder};
use crate::state::AppState;

/// Orders returned per history page.
const ORDERS_PAGE_SIZE: u32 = 10;

/// Pagination query for order history.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// A page of a diner's order history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
    pub diner_id: UserId,
    pub orders: Vec<Order>,
    pub page: u32,
}

/// GET /order/menu - Get the menu. No authentication required.
pub async fn get_menu(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>> {
    let menu = MenuRepository::new(state.pool()).list().await?;
    tracing::info!(count = menu.len(), "menu fetched");
    Ok(Json(menu))
}

/// PUT /order/menu - Add an item to the menu. Admin only.
///
/// Returns the updated menu.
pub async fn add_menu_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(item): Json<NewMenuItem>,
) -> Result<Json<Vec<MenuItem>>> {
    if !has_role(&user, Role::Admin) {
        tracing::warn!(user_id = %user.id, "menu item addition unauthorized");
        return Err(ApiError::Authorization(
            "unable to add menu item".to_string(),
        ));
    }

    let menu = MenuRepository::new(state.pool());
    menu.add(&item).await?;
    let items = menu.list().await?;

    tracing::info!(user_id = %user.id, title = %item.title, "menu item added");

    Ok(Json(items))
}

/// GET /order - Get the authenticated diner's order history.
pub async fn get_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrderHistory>> {
    let page = query.page.unwrap_or(1).max(1);

    let orders = OrderRepository::new(state.pool())
        .for_diner(user.id, page, ORDERS_PAGE_SIZE)
        .await?;

    tracing::info!(user_id = %user.id, page, count = orders.len(), "orders fetched");

    Ok(Json(OrderHistory {
        diner_id: user.id,
        orders,
        page,
    }))
}

/// POST /order - Place an order for the authenticated diner.
///
/// Persists the order, then delegates fulfillment to the factory. See
/// [`OrderService::place`] for the outcome contract.
pub async fn create_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<NewOrder>,
) -> Result<Json<PlacedOrder>> {
    let service = OrderService::new(state.pool(), state.factory(), state.telemetry());
    let placed = service.place(&user, body).await?;
    Ok(Json(placed))
}
