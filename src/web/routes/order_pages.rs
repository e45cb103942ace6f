use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tera::Context;
use tracing::{info, warn};

use crate::db::entities::{order, product};
use crate::db::services;
use crate::services::pdf_service;
use crate::web::middleware::auth;
use crate::web::models::product_models::ProductResponse;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppError, AppState};

const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Serialize)]
struct OrderView {
    id: i32,
    final_cost: String,
    creation_date: String,
    expiry_date: String,
    expired: bool,
    product: Option<ProductResponse>,
}

impl OrderView {
    fn new(order: order::Model, product: Option<product::Model>, now: DateTime<Utc>) -> Self {
        Self {
            id: order.id,
            final_cost: format!("{:.2}", order.final_cost),
            creation_date: order.creation_date.format("%d-%m-%Y %H:%M").to_string(),
            expiry_date: order.expiry_date.format("%d-%m-%Y %H:%M").to_string(),
            expired: order.is_expired_at(now),
            product: product.map(ProductResponse::from),
        }
    }
}

fn error_redirect() -> Response {
    Redirect::to("/error").into_response()
}

fn order_redirect(order_id: i32) -> Response {
    Redirect::to(&format!("/service/{order_id}")).into_response()
}

/// Loads the order when `caller` may act on it.
async fn accessible_order(
    app_state: &AppState,
    caller: &AuthenticatedUser,
    order_id: i32,
) -> Result<Option<order::Model>, AppError> {
    let found = services::find_order_by_id(&app_state.db_pool, order_id).await?;
    Ok(found.filter(|o| caller.can_access_order(o)))
}

async fn render_orders(
    app_state: &AppState,
    caller: &AuthenticatedUser,
    page: u64,
    amount: u64,
) -> Result<Response, AppError> {
    let now = Utc::now();
    let page = page.max(1);
    let amount = amount.clamp(1, services::MAX_PAGE_SIZE);
    let orders = services::find_orders_by_user(&app_state.db_pool, caller.id, page - 1, amount).await?;
    let has_next = orders.len() as u64 == amount;
    let views: Vec<OrderView> = orders
        .into_iter()
        .map(|(o, p)| OrderView::new(o, p, now))
        .collect();

    let mut context = Context::new();
    context.insert("user", &Some(caller.full_name()));
    context.insert("orders", &views);
    context.insert("page", &page);
    context.insert("amount", &amount);
    context.insert("has_next", &has_next);
    Ok(app_state.views.render("services.html", &context)?.into_response())
}

async fn services_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    render_orders(&app_state, &caller, 1, DEFAULT_PAGE_SIZE).await
}

async fn services_page_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path((page, amount)): Path<(u64, u64)>,
) -> Result<Response, AppError> {
    render_orders(&app_state, &caller, page, amount).await
}

async fn service_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(order_id): Path<i32>,
) -> Result<Response, AppError> {
    let Some((order, product)) = services::find_order_with_product(&app_state.db_pool, order_id).await? else {
        return Ok(error_redirect());
    };
    if !caller.can_access_order(&order) {
        return Ok(error_redirect());
    }

    let mut context = Context::new();
    context.insert("user", &Some(caller.full_name()));
    context.insert("order", &OrderView::new(order, Some(product), Utc::now()));
    Ok(app_state.views.render("service.html", &context)?.into_response())
}

async fn place_order_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(product_id): Path<i32>,
) -> Result<Response, AppError> {
    let Some((order, product)) =
        services::place_order(&app_state.db_pool, caller.id, product_id, Utc::now()).await?
    else {
        return Ok(error_redirect());
    };

    match services::find_user_by_id(&app_state.db_pool, caller.id).await {
        Ok(Some(buyer)) => {
            app_state
                .email_service
                .send_purchase_receipt(&buyer, &order, &product)
                .await
        }
        Ok(None) => warn!(order_id = order.id, "Buyer vanished before the receipt was sent."),
        Err(e) => warn!(order_id = order.id, error = %e, "Could not load buyer for the receipt."),
    }

    Ok(Redirect::to("/services").into_response())
}

async fn renew_order_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(order_id): Path<i32>,
) -> Result<Response, AppError> {
    if accessible_order(&app_state, &caller, order_id).await?.is_none() {
        return Ok(error_redirect());
    }
    match services::renew_order(&app_state.db_pool, order_id, Utc::now()).await? {
        Some(_) => Ok(order_redirect(order_id)),
        None => Ok(error_redirect()),
    }
}

async fn cancel_order_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(order_id): Path<i32>,
) -> Result<Response, AppError> {
    if accessible_order(&app_state, &caller, order_id).await?.is_none() {
        return Ok(error_redirect());
    }
    match services::cancel_order(&app_state.db_pool, order_id, Utc::now()).await? {
        Some(_) => Ok(order_redirect(order_id)),
        None => Ok(error_redirect()),
    }
}

async fn export_pdf_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(order_id): Path<i32>,
) -> Result<Response, AppError> {
    let (order, product) = services::find_order_with_product(&app_state.db_pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found.")))?;
    if !caller.can_access_order(&order) {
        warn!(order_id, user_id = caller.id, "Receipt export denied.");
        return Err(AppError::Forbidden("You can only export your own orders.".to_string()));
    }
    let owner = services::find_user_by_id(&app_state.db_pool, order.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Owner of order {order_id} not found.")))?;

    let bytes = pdf_service::export_order_receipt(&order, &product, &owner)?;
    info!(order_id, user_id = caller.id, "Receipt exported.");

    let disposition = format!("attachment; filename={}", pdf_service::receipt_filename(&order));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Pages for clients and admins. Anonymous visitors are redirected to `/login`.
pub fn create_order_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/services", get(services_handler))
        .route("/services/{page}/{amount}", get(services_page_handler))
        .route("/service/{id}", get(service_handler))
        .route("/order/{id}/place", get(place_order_handler))
        .route("/order/{id}/renew", get(renew_order_handler))
        .route("/order/{id}/cancel", get(cancel_order_handler))
        .route("/order/{id}/export_pdf", get(export_pdf_handler))
        .route_layer(axum_middleware::from_fn_with_state(app_state, auth::page_auth))
}
