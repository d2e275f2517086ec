//! HTTP route handlers and router assembly.

pub mod auth;
pub mod franchise;
pub mod order;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Build the service router.
///
/// GET /franchise/{id} and DELETE /franchise/{id} share one route entry:
/// GET reads the franchises a *user* administers, DELETE removes a
/// *franchise*. The split mirrors the public API surface, not the entity
/// named by the path parameter.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/auth",
            post(auth::register).put(auth::login).delete(auth::logout),
        )
        .route("/auth/{user_id}", put(auth::update_user))
        .route(
            "/order/menu",
            get(order::get_menu).put(order::add_menu_item),
        )
        .route("/order", get(order::get_orders).post(order::create_order))
        .route(
            "/franchise",
            get(franchise::list_franchises).post(franchise::create_franchise),
        )
        .route(
            "/franchise/{id}",
            get(franchise::user_franchises).delete(franchise::delete_franchise),
        )
        .route("/franchise/{id}/store", post(franchise::create_store))
        .route(
            "/franchise/{id}/store/{store_id}",
            delete(franchise::delete_store),
        )
}
