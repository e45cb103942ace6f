use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::db::entities::user;
use crate::db::services::{self, UserDeletion, UserUpdate};
use crate::services::auth_service;
use crate::web::middleware::auth;
use crate::web::models::user_models::UpdateUserRequest;
use crate::web::models::{AuthenticatedUser, PageQuery, UserResponse};
use crate::web::{AppError, AppState};

async fn user_response(app_state: &AppState, user: user::Model) -> Result<UserResponse, AppError> {
    let roles = services::find_user_roles(&app_state.db_pool, &user).await?;
    Ok(UserResponse::from_user(user, &roles))
}

async fn list_users_handler(
    State(app_state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = services::find_users_page(&app_state.db_pool, page.zero_based(), page.page_size()).await?;
    let mut responses = Vec::with_capacity(users.len());
    for user in users {
        responses.push(user_response(&app_state, user).await?);
    }
    Ok(Json(responses))
}

async fn update_user_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if !caller.can_manage_user(user_id) {
        return Err(AppError::Forbidden("You can only edit your own profile.".to_string()));
    }
    auth_service::validate_profile(&payload.first_name, &payload.surname, &payload.email)?;

    let email = payload.email.trim().to_string();
    if let Some(owner) = services::find_user_by_email(&app_state.db_pool, &email).await? {
        if owner.id != user_id {
            return Err(AppError::UserAlreadyExists("Email is already registered.".to_string()));
        }
    }

    // A blank password leaves the current one in place.
    let password_hash = match payload.password.as_deref() {
        Some(password) if !password.trim().is_empty() => {
            auth_service::validate_password(password)?;
            Some(auth_service::hash_password(password, app_state.config.password_cost)?)
        }
        _ => None,
    };

    let update = UserUpdate {
        first_name: payload.first_name.trim().to_string(),
        surname: payload.surname.trim().to_string(),
        address: payload.address.trim().to_string(),
        email,
        password_hash,
        profile_picture_filename: payload.profile_picture_filename,
    };
    let updated = services::update_user(&app_state.db_pool, user_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found.")))?;

    info!(user_id, updated_by = caller.id, "User profile updated.");
    Ok(Json(user_response(&app_state, updated).await?))
}

async fn set_enabled(
    app_state: &AppState,
    caller: &AuthenticatedUser,
    user_id: i32,
    enabled: bool,
) -> Result<Json<UserResponse>, AppError> {
    let updated = services::set_user_enabled(&app_state.db_pool, user_id, enabled)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found.")))?;
    info!(user_id, enabled, updated_by = caller.id, "User enabled flag changed.");
    Ok(Json(user_response(app_state, updated).await?))
}

async fn enable_user_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    set_enabled(&app_state, &caller, user_id, true).await
}

async fn disable_user_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    if caller.id == user_id {
        return Err(AppError::Conflict("Administrators cannot disable themselves.".to_string()));
    }
    set_enabled(&app_state, &caller, user_id, false).await
}

async fn delete_user_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if caller.id == user_id {
        return Err(AppError::Conflict("Administrators cannot delete themselves.".to_string()));
    }
    match services::delete_user(&app_state.db_pool, user_id).await? {
        UserDeletion::Deleted(_) => {
            info!(user_id, deleted_by = caller.id, "User deleted.");
            Ok(StatusCode::NO_CONTENT)
        }
        UserDeletion::HasOrders(orders) => Err(AppError::Conflict(format!(
            "User {user_id} has {orders} order(s) and cannot be deleted. Disable the account instead."
        ))),
        UserDeletion::NotFound => Err(AppError::NotFound(format!("User {user_id} not found."))),
    }
}

pub fn create_user_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let signed_in = axum_middleware::from_fn_with_state(app_state.clone(), auth::auth);
    let admin_only = axum_middleware::from_fn_with_state(app_state, auth::admin_auth);
    Router::new()
        .route("/api/users", get(list_users_handler).route_layer(admin_only.clone()))
        .route(
            "/api/users/{id}",
            put(update_user_handler)
                .route_layer(signed_in)
                .merge(delete(delete_user_handler).route_layer(admin_only.clone())),
        )
        .route("/api/users/{id}/enable", post(enable_user_handler).route_layer(admin_only.clone()))
        .route("/api/users/{id}/disable", post(disable_user_handler).route_layer(admin_only))
}
