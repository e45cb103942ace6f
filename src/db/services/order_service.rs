use chrono::{DateTime, Months, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::db::entities::{order, product};
use crate::db::services::{page_bounds, sale_service};

// --- Order Service Functions ---

/// Coverage bought by a purchase or a renewal.
pub const ORDER_TERM_MONTHS: u32 = 1;

/// One term after `from`, with the day clamped to the end of shorter months.
pub fn add_term(from: DateTime<Utc>) -> Result<DateTime<Utc>, DbErr> {
    from.checked_add_months(Months::new(ORDER_TERM_MONTHS))
        .ok_or_else(|| DbErr::Custom(format!("expiry date out of range after {from}")))
}

/// New expiry for a renewal: one term after whichever is later, `now` or the
/// current expiry.
pub fn renewed_expiry(now: DateTime<Utc>, current_expiry: DateTime<Utc>) -> Result<DateTime<Utc>, DbErr> {
    add_term(now.max(current_expiry))
}

/// Final cost of buying `product` at `now`: the price reduced by the one-time
/// discount and then by the accumulative discount, when they target it.
pub async fn price_for_purchase<C>(
    db: &C,
    product: &product::Model,
    now: DateTime<Utc>,
) -> Result<f64, DbErr>
where
    C: sea_orm::ConnectionTrait,
{
    let cost = product.price;
    let cost = sale_service::apply_otd_discount(db, product.id, cost, now).await?;
    sale_service::apply_ad_discount(db, product.id, cost, now).await
}

/// Creates an order of `product_id` for `user_id`. Returns `None` when the
/// product does not exist.
pub async fn place_order(
    db: &DatabaseConnection,
    user_id: i32,
    product_id: i32,
    now: DateTime<Utc>,
) -> Result<Option<(order::Model, product::Model)>, DbErr> {
    let txn = db.begin().await?;

    let Some(product_model) = product::Entity::find_by_id(product_id).one(&txn).await? else {
        txn.rollback().await?;
        return Ok(None);
    };

    let final_cost = price_for_purchase(&txn, &product_model, now).await?;
    let order_model = order::ActiveModel {
        user_id: Set(user_id),
        product_id: Set(product_model.id),
        final_cost: Set(final_cost),
        creation_date: Set(now),
        expiry_date: Set(add_term(now)?),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(
        order_id = order_model.id,
        user_id,
        product_id,
        final_cost,
        "Order placed."
    );
    Ok(Some((order_model, product_model)))
}

/// Retrieves an order by its ID.
pub async fn find_order_by_id(
    db: &DatabaseConnection,
    order_id: i32,
) -> Result<Option<order::Model>, DbErr> {
    order::Entity::find_by_id(order_id).one(db).await
}

/// Retrieves an order together with its product.
pub async fn find_order_with_product(
    db: &DatabaseConnection,
    order_id: i32,
) -> Result<Option<(order::Model, product::Model)>, DbErr> {
    let found = order::Entity::find_by_id(order_id)
        .find_also_related(product::Entity)
        .one(db)
        .await?;
    Ok(found.and_then(|(o, p)| p.map(|p| (o, p))))
}

/// Page `page` (0-based) of a user's orders, newest first. Page sizes are
/// capped at `MAX_PAGE_SIZE`.
pub async fn find_orders_by_user(
    db: &DatabaseConnection,
    user_id: i32,
    page: u64,
    page_size: u64,
) -> Result<Vec<(order::Model, Option<product::Model>)>, DbErr> {
    let Some(page_size) = page_bounds(page, page_size) else {
        return Ok(Vec::new());
    };
    order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreationDate)
        .order_by_desc(order::Column::Id)
        .find_also_related(product::Entity)
        .paginate(db, page_size)
        .fetch_page(page)
        .await
}

/// Extends an order by one term and charges the current catalog price.
/// Returns `None` when the order does not exist.
pub async fn renew_order(
    db: &DatabaseConnection,
    order_id: i32,
    now: DateTime<Utc>,
) -> Result<Option<order::Model>, DbErr> {
    let txn = db.begin().await?;

    let Some((order_model, Some(product_model))) = order::Entity::find_by_id(order_id)
        .find_also_related(product::Entity)
        .one(&txn)
        .await?
    else {
        txn.rollback().await?;
        return Ok(None);
    };

    let expiry_date = renewed_expiry(now, order_model.expiry_date)?;
    let final_cost = order_model.final_cost + product_model.price;

    let mut active_order = order_model.into_active_model();
    active_order.final_cost = Set(final_cost);
    active_order.expiry_date = Set(expiry_date);
    let updated = active_order.update(&txn).await?;

    txn.commit().await?;
    info!(order_id, final_cost, expiry_date = %expiry_date, "Order renewed.");
    Ok(Some(updated))
}

/// Expires an order immediately. The row is kept for history and statistics.
pub async fn cancel_order(
    db: &DatabaseConnection,
    order_id: i32,
    now: DateTime<Utc>,
) -> Result<Option<order::Model>, DbErr> {
    let Some(order_model) = order::Entity::find_by_id(order_id).one(db).await? else {
        return Ok(None);
    };

    let mut active_order = order_model.into_active_model();
    active_order.expiry_date = Set(now);
    let updated = active_order.update(db).await?;

    info!(order_id, "Order cancelled.");
    Ok(Some(updated))
}
