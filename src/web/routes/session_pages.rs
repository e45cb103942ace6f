use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;
use tracing::debug;

use crate::services::auth_service;
use crate::web::middleware::auth::TOKEN_COOKIE;
use crate::web::models::LoginRequest;
use crate::web::routes::auth_routes::session_cookie;
use crate::web::{AppError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub logout: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

async fn login_page_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<LoginPageQuery>,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("user", &Option::<String>::None);
    context.insert("failed", &query.error.is_some());
    context.insert("logged_out", &query.logout.is_some());
    Ok(app_state.views.render("login.html", &context)?.into_response())
}

async fn login_form_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let request = LoginRequest { email: form.email, password: form.password };
    match auth_service::login_user(&app_state.db_pool, request, &app_state.config.jwt_secret).await {
        Ok(login) => {
            let cookie = session_cookie(login.token, app_state.config.secure_cookies);
            Ok((jar.add(cookie), Redirect::to("/services")).into_response())
        }
        Err(AppError::InvalidCredentials | AppError::UserNotFound | AppError::InvalidInput(_)) => {
            debug!("Login form rejected.");
            Ok(Redirect::to("/login?error=true").into_response())
        }
        Err(e) => Err(e),
    }
}

async fn logout_handler(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (jar, Redirect::to("/login?logout=true"))
}

async fn error_page_handler(State(app_state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("user", &Option::<String>::None);
    context.insert("message", "The page you asked for is not available to you.");
    Ok(app_state.views.render("error.html", &context)?.into_response())
}

pub fn create_session_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_page_handler).post(login_form_handler))
        .route("/logout", get(logout_handler))
        .route("/error", get(error_page_handler))
}
