use axum::{
    http::Method,
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::notifications::service::EmailService;
use crate::server::config::ServerConfig;
use crate::web::routes::*;
use crate::web::views::Views;

pub use crate::web::error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod views;

pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub email_service: Arc<EmailService>,
    pub views: Arc<Views>,
}

impl AppState {
    pub fn new(
        db_pool: DatabaseConnection,
        config: Arc<ServerConfig>,
        email_service: Arc<EmailService>,
    ) -> Result<Self, tera::Error> {
        Ok(Self {
            db_pool,
            config,
            email_service,
            views: Arc::new(Views::load()?),
        })
    }
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .merge(auth_routes::create_auth_router(app_state.clone()))
        .merge(product_routes::create_product_router(app_state.clone()))
        .merge(statistics_routes::create_statistics_router(app_state.clone()))
        .merge(sale_routes::create_sale_router(app_state.clone()))
        .merge(user_routes::create_user_router(app_state.clone()))
        .merge(session_pages::create_session_router())
        .merge(catalog_pages::create_catalog_router(app_state.clone()))
        .merge(order_pages::create_order_router(app_state.clone()))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
