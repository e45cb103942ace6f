use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::security::Role;
use crate::services::auth_service;
use crate::web::models::AuthenticatedUser;
use crate::web::{error::AppError, AppState};

pub const TOKEN_COOKIE: &str = "token";

/// Resolves the caller from the `Authorization: Bearer` header, falling back
/// to the `token` cookie.
pub async fn authenticate_request(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AppError::InvalidCredentials)?;

    let claims = auth_service::decode_token(&token, &state.config.jwt_secret)?;
    auth_service::load_authenticated_user(&state.db_pool, &claims).await
}

/// The caller when a valid session is present, for pages open to everyone.
pub async fn optional_user(state: &AppState, jar: &CookieJar, headers: &HeaderMap) -> Option<AuthenticatedUser> {
    authenticate_request(state, jar, headers).await.ok()
}

fn is_session_failure(err: &AppError) -> bool {
    matches!(err, AppError::InvalidCredentials | AppError::UserNotFound)
}

/// API guard: any authenticated account, otherwise 401.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let authenticated_user = authenticate_request(&state, &jar, req.headers())
        .await
        .inspect_err(|e| warn!(error = %e, path = %req.uri().path(), "Rejected API request."))?;
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

/// API guard for administrator endpoints. Anyone else gets 401.
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let authenticated_user = authenticate_request(&state, &jar, req.headers()).await?;
    if !authenticated_user.is_admin() {
        warn!(user_id = authenticated_user.id, path = %req.uri().path(), "Non-admin denied.");
        return Err(AppError::Unauthorized("Administrator role required.".to_string()));
    }
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

/// Page guard: clients and admins pass, everyone else is sent to `/login`.
pub async fn page_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    match authenticate_request(&state, &jar, req.headers()).await {
        Ok(user) if user.has_any_role(&Role::ALL) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(user) => {
            debug!(user_id = user.id, "Account without a role denied.");
            Redirect::to("/error").into_response()
        }
        Err(e) if is_session_failure(&e) => Redirect::to("/login").into_response(),
        Err(e) => e.into_response(),
    }
}

/// Page guard for the admin panel. Signed-in non-admins land on `/error`.
pub async fn page_admin_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    match authenticate_request(&state, &jar, req.headers()).await {
        Ok(user) if user.is_admin() => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(_) => Redirect::to("/error").into_response(),
        Err(e) if is_session_failure(&e) => Redirect::to("/login").into_response(),
        Err(e) => e.into_response(),
    }
}
