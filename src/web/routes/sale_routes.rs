use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;

use crate::db::services::{self, Sale, SaleInput, SaleKind};
use crate::web::middleware::auth;
use crate::web::models::sale_models::{CurrentSalesResponse, UpdateSaleRequest};
use crate::web::{AppError, AppState};

async fn current_sales_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CurrentSalesResponse>, AppError> {
    let now = Utc::now();
    Ok(Json(CurrentSalesResponse {
        otd: services::get_current_otd(&app_state.db_pool, now).await?,
        ad: services::get_current_ad(&app_state.db_pool, now).await?,
    }))
}

async fn save_sale(
    app_state: &AppState,
    kind: SaleKind,
    payload: UpdateSaleRequest,
) -> Result<Json<Sale>, AppError> {
    let input = SaleInput::from(payload);
    input.validate().map_err(AppError::InvalidInput)?;
    if services::find_product_by_id(&app_state.db_pool, input.product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Product {} not found.", input.product_id)));
    }
    let sale = services::replace_sale(&app_state.db_pool, kind, &input).await?;
    Ok(Json(sale))
}

async fn update_otd_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<UpdateSaleRequest>,
) -> Result<Json<Sale>, AppError> {
    save_sale(&app_state, SaleKind::OneTime, payload).await
}

async fn update_ad_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<UpdateSaleRequest>,
) -> Result<Json<Sale>, AppError> {
    save_sale(&app_state, SaleKind::Accumulative, payload).await
}

pub fn create_sale_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_only = axum_middleware::from_fn_with_state(app_state, auth::admin_auth);
    Router::new()
        .route("/api/sales", get(current_sales_handler))
        .route("/api/sales/otd", put(update_otd_handler).route_layer(admin_only.clone()))
        .route("/api/sales/ad", put(update_ad_handler).route_layer(admin_only))
}
