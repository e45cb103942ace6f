use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::db::services::{self, ProductInput};
use crate::web::middleware::auth;
use crate::web::models::product_models::ProductResponse;
use crate::web::{AppError, AppState};

async fn list_products_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = services::find_all_products(&app_state.db_pool).await?;
    if products.is_empty() {
        return Err(AppError::NotFound("No products found.".to_string()));
    }
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

async fn get_product_handler(
    State(app_state): State<Arc<AppState>>,
    Path(product_id): Path<i32>,
) -> Result<Json<ProductResponse>, AppError> {
    services::find_product_by_id(&app_state.db_pool, product_id)
        .await?
        .map(|p| Json(p.into()))
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found.")))
}

async fn create_product_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    payload.validate().map_err(AppError::InvalidInput)?;
    let product = services::create_product(&app_state.db_pool, &payload).await?;
    info!(product_id = product.id, category = %product.category, "Product created.");
    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn update_product_handler(
    State(app_state): State<Arc<AppState>>,
    Path(product_id): Path<i32>,
    Json(payload): Json<ProductInput>,
) -> Result<Json<ProductResponse>, AppError> {
    payload.validate().map_err(AppError::InvalidInput)?;
    let product = services::update_product(&app_state.db_pool, product_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found.")))?;
    info!(product_id, "Product updated.");
    Ok(Json(product.into()))
}

/// Reading the catalog is public, changing it is for administrators.
pub fn create_product_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_only = axum_middleware::from_fn_with_state(app_state, auth::admin_auth);
    Router::new()
        .route(
            "/api/products",
            get(list_products_handler).merge(post(create_product_handler).route_layer(admin_only.clone())),
        )
        .route(
            "/api/products/{id}",
            get(get_product_handler).merge(put(update_product_handler).route_layer(admin_only)),
        )
}
