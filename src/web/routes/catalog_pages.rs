use axum::{
    extract::{Query, State},
    http::HeaderMap,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context;

use crate::db::entities::product;
use crate::db::services::{self, Sale};
use crate::web::middleware::auth;
use crate::web::models::product_models::ProductResponse;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppError, AppState};

const WEEKDAYS: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

#[derive(Debug, Default, Deserialize)]
pub struct PricingQuery {
    pub selected: Option<String>,
}

/// A current sale together with the product it discounts.
#[derive(Debug, Serialize)]
struct SaleView {
    discount: i32,
    stop_date: String,
    product: Option<ProductResponse>,
}

impl SaleView {
    fn new(sale: Sale, catalog: &[product::Model]) -> Self {
        Self {
            discount: sale.discount,
            stop_date: sale.stop_date.format("%d-%m-%Y").to_string(),
            product: catalog
                .iter()
                .find(|p| p.id == sale.product_id)
                .cloned()
                .map(ProductResponse::from),
        }
    }
}

/// Sorted, de-duplicated category names of the catalog.
fn categories(catalog: &[product::Model]) -> Vec<String> {
    let mut names: Vec<String> = catalog.iter().map(|p| p.category.clone()).collect();
    names.sort();
    names.dedup();
    names
}

async fn pricing_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(query): Query<PricingQuery>,
) -> Result<Response, AppError> {
    let now = Utc::now();
    let caller = auth::optional_user(&app_state, &jar, &headers).await;
    let catalog = services::find_all_products(&app_state.db_pool).await?;
    let otd = services::get_current_otd(&app_state.db_pool, now).await?;
    let ad = services::get_current_ad(&app_state.db_pool, now).await?;

    let categories = categories(&catalog);
    let selected = query
        .selected
        .filter(|s| categories.contains(s))
        .or_else(|| categories.first().cloned());

    let mut context = Context::new();
    context.insert("user", &caller.map(|u| u.full_name()));
    context.insert("has_discount", &(otd.is_some() || ad.is_some()));
    context.insert("otd", &otd.map(|s| SaleView::new(s, &catalog)));
    context.insert("ad", &ad.map(|s| SaleView::new(s, &catalog)));
    context.insert("categories", &categories);
    context.insert("selected", &selected);
    context.insert(
        "products",
        &catalog.into_iter().map(ProductResponse::from).collect::<Vec<_>>(),
    );
    Ok(app_state.views.render("pricing.html", &context)?.into_response())
}

async fn panel_handler(
    Extension(caller): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let statistics = services::compute_statistics(&app_state.db_pool, Utc::now()).await?;
    let week: Vec<(&str, i64)> = WEEKDAYS
        .iter()
        .copied()
        .zip(statistics.current_week_sales.iter().copied())
        .collect();

    let mut context = Context::new();
    context.insert("user", &Some(caller.full_name()));
    context.insert("week", &week);
    context.insert("categories", &statistics.category_weekly_purchases);
    context.insert("capital", &format!("{:.2}", statistics.accumulated_capital));
    Ok(app_state.views.render("panel.html", &context)?.into_response())
}

pub fn create_catalog_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new().route("/pricing", get(pricing_handler)).route(
        "/panel",
        get(panel_handler).route_layer(axum_middleware::from_fn_with_state(app_state, auth::page_admin_auth)),
    )
}
