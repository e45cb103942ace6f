use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    prelude::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use crate::db::entities::{accumulative_discount, one_time_discount};

// --- Sale Service Functions ---

/// The two independent discount schedules. A one-time discount is applied
/// first, the accumulative discount is applied on the already reduced cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleKind {
    OneTime,
    Accumulative,
}

/// A discount window of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sale {
    pub id: i32,
    pub kind: SaleKind,
    pub product_id: i32,
    pub start_date: DateTime<Utc>,
    pub stop_date: DateTime<Utc>,
    pub discount: i32,
    pub enabled: bool,
}

impl Sale {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.start_date <= now && now <= self.stop_date
    }
}

impl From<one_time_discount::Model> for Sale {
    fn from(m: one_time_discount::Model) -> Self {
        Sale {
            id: m.id,
            kind: SaleKind::OneTime,
            product_id: m.product_id,
            start_date: m.start_date,
            stop_date: m.stop_date,
            discount: m.discount,
            enabled: m.enabled,
        }
    }
}

impl From<accumulative_discount::Model> for Sale {
    fn from(m: accumulative_discount::Model) -> Self {
        Sale {
            id: m.id,
            kind: SaleKind::Accumulative,
            product_id: m.product_id,
            start_date: m.start_date,
            stop_date: m.stop_date,
            discount: m.discount,
            enabled: m.enabled,
        }
    }
}

/// Schedule submitted by an administrator. Dates are whole days in UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleInput {
    pub product_id: i32,
    pub start: NaiveDate,
    pub stop: NaiveDate,
    pub discount: i32,
    pub enabled: bool,
}

impl SaleInput {
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=100).contains(&self.discount) {
            return Err("Discount must be between 0 and 100.".to_string());
        }
        if self.start > self.stop {
            return Err("The sale must start before it stops.".to_string());
        }
        Ok(())
    }

    /// From the first second of `start` to the last second of `stop`.
    pub fn window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), DbErr> {
        let start = self
            .start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DbErr::Custom("invalid sale start".to_string()))?;
        let stop = self
            .stop
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| DbErr::Custom("invalid sale stop".to_string()))?;
        Ok((start.and_utc(), stop.and_utc()))
    }
}

/// Applies `discount` percent to `cost`.
pub fn apply_percentage(cost: f64, discount: i32) -> f64 {
    cost * (1.0 - f64::from(discount) / 100.0)
}

/// Picks the sale in force at `now`: the enabled one whose window contains
/// `now`, latest start first, then highest id.
pub fn select_current_sale<I>(sales: I, now: DateTime<Utc>) -> Option<Sale>
where
    I: IntoIterator<Item = Sale>,
{
    sales
        .into_iter()
        .filter(|sale| sale.is_active_at(now))
        .max_by_key(|sale| (sale.start_date, sale.id))
}

/// Retrieves the sale of `kind` in force at `now`, if any.
pub async fn get_current_sale<C>(
    db: &C,
    kind: SaleKind,
    now: DateTime<Utc>,
) -> Result<Option<Sale>, DbErr>
where
    C: ConnectionTrait,
{
    let enabled: Vec<Sale> = match kind {
        SaleKind::OneTime => one_time_discount::Entity::find()
            .filter(one_time_discount::Column::Enabled.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(Sale::from)
            .collect(),
        SaleKind::Accumulative => accumulative_discount::Entity::find()
            .filter(accumulative_discount::Column::Enabled.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(Sale::from)
            .collect(),
    };
    Ok(select_current_sale(enabled, now))
}

pub async fn get_current_otd<C: ConnectionTrait>(
    db: &C,
    now: DateTime<Utc>,
) -> Result<Option<Sale>, DbErr> {
    get_current_sale(db, SaleKind::OneTime, now).await
}

pub async fn get_current_ad<C: ConnectionTrait>(
    db: &C,
    now: DateTime<Utc>,
) -> Result<Option<Sale>, DbErr> {
    get_current_sale(db, SaleKind::Accumulative, now).await
}

/// Reduces `cost` by the current sale of `kind` when it targets `product_id`.
async fn apply_sale<C: ConnectionTrait>(
    db: &C,
    kind: SaleKind,
    product_id: i32,
    cost: f64,
    now: DateTime<Utc>,
) -> Result<f64, DbErr> {
    match get_current_sale(db, kind, now).await? {
        Some(sale) if sale.product_id == product_id => Ok(apply_percentage(cost, sale.discount)),
        _ => Ok(cost),
    }
}

pub async fn apply_otd_discount<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    cost: f64,
    now: DateTime<Utc>,
) -> Result<f64, DbErr> {
    apply_sale(db, SaleKind::OneTime, product_id, cost, now).await
}

pub async fn apply_ad_discount<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    cost: f64,
    now: DateTime<Utc>,
) -> Result<f64, DbErr> {
    apply_sale(db, SaleKind::Accumulative, product_id, cost, now).await
}

/// Stores a new sale of `kind` and disables every earlier one of the same kind,
/// so only the new schedule can be current.
pub async fn replace_sale(
    db: &DatabaseConnection,
    kind: SaleKind,
    input: &SaleInput,
) -> Result<Sale, DbErr> {
    let (start_date, stop_date) = input.window()?;
    let txn = db.begin().await?;

    let sale: Sale = match kind {
        SaleKind::OneTime => {
            one_time_discount::Entity::update_many()
                .col_expr(one_time_discount::Column::Enabled, Expr::value(false))
                .filter(one_time_discount::Column::Enabled.eq(true))
                .exec(&txn)
                .await?;
            one_time_discount::ActiveModel {
                product_id: Set(input.product_id),
                start_date: Set(start_date),
                stop_date: Set(stop_date),
                discount: Set(input.discount),
                enabled: Set(input.enabled),
                ..Default::default()
            }
            .insert(&txn)
            .await?
            .into()
        }
        SaleKind::Accumulative => {
            accumulative_discount::Entity::update_many()
                .col_expr(accumulative_discount::Column::Enabled, Expr::value(false))
                .filter(accumulative_discount::Column::Enabled.eq(true))
                .exec(&txn)
                .await?;
            accumulative_discount::ActiveModel {
                product_id: Set(input.product_id),
                start_date: Set(start_date),
                stop_date: Set(stop_date),
                discount: Set(input.discount),
                enabled: Set(input.enabled),
                ..Default::default()
            }
            .insert(&txn)
            .await?
            .into()
        }
    };

    txn.commit().await?;
    info!(sale_id = sale.id, kind = ?kind, product_id = sale.product_id, discount = sale.discount, "Sale replaced.");
    Ok(sale)
}
