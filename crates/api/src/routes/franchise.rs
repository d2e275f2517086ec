//! Franchise route handlers: franchise and store CRUD.

use axum::{
    Json,
    extract::{Path, State},
};

use sliceworks_core::{FranchiseId, Role, StoreId, UserId};

use crate::db::RepositoryError;
use crate::db::franchises::FranchiseRepository;
use crate::error::{ApiError, Result};
use crate::middleware::RequireAuth;
use crate::models::franchise::{NewFranchise, NewStore};
use crate::models::{Franchise, Store, has_role};
use crate::routes::auth::MessageResponse;
use crate::state::AppState;

/// GET /franchise - List all franchises with their stores.
pub async fn list_franchises(State(state): State<AppState>) -> Result<Json<Vec<Franchise>>> {
    let franchises = FranchiseRepository::new(state.pool()).list().await?;
    Ok(Json(franchises))
}

/// GET /franchise/{userId} - List the franchises a user administers.
///
/// Self-or-admin.
pub async fn user_franchises(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Franchise>>> {
    let target = UserId::new(user_id);

    if actor.id != target && !has_role(&actor, Role::Admin) {
        tracing::warn!(
            user_id = %target,
            requester_id = %actor.id,
            "franchise listing unauthorized"
        );
        return Err(ApiError::Authorization("unauthorized".to_string()));
    }

    let franchises = FranchiseRepository::new(state.pool()).for_user(target).await?;
    Ok(Json(franchises))
}

/// POST /franchise - Create a franchise. Admin only.
pub async fn create_franchise(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    Json(body): Json<NewFranchise>,
) -> Result<Json<Franchise>> {
    if !has_role(&actor, Role::Admin) {
        tracing::warn!(user_id = %actor.id, "franchise creation unauthorized");
        return Err(ApiError::Authorization(
            "unable to create a franchise".to_string(),
        ));
    }

    if body.name.is_empty() {
        return Err(ApiError::Validation("franchise name is required".to_string()));
    }

    let admin_emails: Vec<_> = body.admins.into_iter().map(|a| a.email).collect();

    let franchise = FranchiseRepository::new(state.pool())
        .create(&body.name, &admin_emails)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                ApiError::NotFound("unknown user for franchise admin".to_string())
            }
            RepositoryError::Conflict(msg) => ApiError::Validation(msg),
            other => ApiError::Storage(other),
        })?;

    tracing::info!(
        franchise_id = %franchise.id,
        name = %franchise.name,
        user_id = %actor.id,
        "franchise created"
    );

    Ok(Json(franchise))
}

/// DELETE /franchise/{franchiseId} - Delete a franchise and its stores.
/// Admin only.
///
/// Deleting an already-deleted franchise returns 404, not success.
pub async fn delete_franchise(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    Path(franchise_id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    if !has_role(&actor, Role::Admin) {
        tracing::warn!(user_id = %actor.id, "franchise deletion unauthorized");
        return Err(ApiError::Authorization(
            "unable to delete a franchise".to_string(),
        ));
    }

    let id = FranchiseId::new(franchise_id);
    FranchiseRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ApiError::NotFound("unknown franchise".to_string()),
            other => ApiError::Storage(other),
        })?;

    tracing::info!(franchise_id = %id, user_id = %actor.id, "franchise deleted");

    Ok(Json(MessageResponse {
        message: "franchise deleted".to_string(),
    }))
}

/// POST /franchise/{franchiseId}/store - Create a store.
///
/// Admin or an admin of the franchise.
pub async fn create_store(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    Path(franchise_id): Path<i64>,
    Json(body): Json<NewStore>,
) -> Result<Json<Store>> {
    let id = FranchiseId::new(franchise_id);
    let franchises = FranchiseRepository::new(state.pool());

    authorize_franchise_change(&franchises, &actor, id, "unable to create a store").await?;

    let store = franchises.create_store(id, &body.name).await.map_err(|e| {
        match e {
            RepositoryError::NotFound => ApiError::NotFound("unknown franchise".to_string()),
            other => ApiError::Storage(other),
        }
    })?;

    tracing::info!(
        franchise_id = %id,
        store_id = %store.id,
        user_id = %actor.id,
        "store created"
    );

    Ok(Json(store))
}

/// DELETE /franchise/{franchiseId}/store/{storeId} - Delete a store.
///
/// Admin or an admin of the franchise. Deleting an absent store returns 404.
pub async fn delete_store(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    Path((franchise_id, store_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>> {
    let id = FranchiseId::new(franchise_id);
    let franchises = FranchiseRepository::new(state.pool());

    authorize_franchise_change(&franchises, &actor, id, "unable to delete a store").await?;

    franchises
        .delete_store(id, StoreId::new(store_id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ApiError::NotFound("unknown store".to_string()),
            other => ApiError::Storage(other),
        })?;

    tracing::info!(
        franchise_id = %id,
        store_id,
        user_id = %actor.id,
        "store deleted"
    );

    Ok(Json(MessageResponse {
        message: "store deleted".to_string(),
    }))
}

/// Gate for store mutations: global admin, or listed admin of the franchise.
async fn authorize_franchise_change(
    franchises: &FranchiseRepository<'_>,
    actor: &crate::models::User,
    franchise_id: FranchiseId,
    denial: &str,
) -> Result<()> {
    if has_role(actor, Role::Admin) || franchises.is_admin(franchise_id, actor.id).await? {
        return Ok(());
    }

    tracing::warn!(
        franchise_id = %franchise_id,
        user_id = %actor.id,
        "franchise change unauthorized"
    );
    Err(ApiError::Authorization(denial.to_string()))
}
