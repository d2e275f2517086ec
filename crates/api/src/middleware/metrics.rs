//! Request-volume tracking middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Count every request by HTTP method before handing off to the router.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    state.telemetry().record_request(request.method());
    next.run(request).await
}
