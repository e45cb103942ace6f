use axum::{extract::State, middleware as axum_middleware, routing::get, Json, Router};
use chrono::Utc;
use std::sync::Arc;

use crate::db::services::{self, SalesStatistics};
use crate::web::middleware::auth;
use crate::web::{AppError, AppState};

async fn statistics_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<SalesStatistics>, AppError> {
    let statistics = services::compute_statistics(&app_state.db_pool, Utc::now()).await?;
    Ok(Json(statistics))
}

pub fn create_statistics_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/statistics",
        get(statistics_handler).route_layer(axum_middleware::from_fn_with_state(app_state, auth::admin_auth)),
    )
}
