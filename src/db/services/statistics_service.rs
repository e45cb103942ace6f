use chrono::{DateTime, Datelike, Duration, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::entities::{order, product};

// --- Statistics Service Functions ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPurchases {
    pub category: String,
    pub purchases: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesStatistics {
    /// Orders created on each day of the current week, Monday first.
    pub current_week_sales: Vec<i64>,
    pub category_weekly_purchases: Vec<CategoryPurchases>,
    pub accumulated_capital: f64,
}

/// Monday 00:00 UTC of the week containing `now`, and the Monday after.
pub fn week_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = (now.date_naive() - Duration::days(days_from_monday))
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();
    (monday, monday + Duration::days(7))
}

/// Buckets creation dates by weekday, Monday first.
pub fn count_per_weekday<I>(creation_dates: I) -> Vec<i64>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut per_day = vec![0i64; 7];
    for created in creation_dates {
        per_day[created.weekday().num_days_from_monday() as usize] += 1;
    }
    per_day
}

/// Counts purchases per category. Every category in `categories` is reported,
/// with zero when nothing of it was sold; output is sorted by category name.
pub fn count_per_category<'a, I, J>(categories: I, purchased: J) -> Vec<CategoryPurchases>
where
    I: IntoIterator<Item = &'a str>,
    J: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, i64> = categories.into_iter().map(|c| (c, 0)).collect();
    for category in purchased {
        *counts.entry(category).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(category, purchases)| CategoryPurchases {
            category: category.to_owned(),
            purchases,
        })
        .collect()
}

async fn find_week_orders(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<(order::Model, Option<product::Model>)>, DbErr> {
    let (week_start, week_end) = week_bounds(now);
    order::Entity::find()
        .filter(order::Column::CreationDate.gte(week_start))
        .filter(order::Column::CreationDate.lt(week_end))
        .order_by_asc(order::Column::Id)
        .find_also_related(product::Entity)
        .all(db)
        .await
}

pub async fn find_sales_per_day_in_week(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<i64>, DbErr> {
    let orders = find_week_orders(db, now).await?;
    Ok(count_per_weekday(orders.iter().map(|(o, _)| o.creation_date)))
}

pub async fn find_category_to_weekly_purchases(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<CategoryPurchases>, DbErr> {
    let catalog = product::Entity::find().all(db).await?;
    let orders = find_week_orders(db, now).await?;
    Ok(count_per_category(
        catalog.iter().map(|p| p.category.as_str()),
        orders
            .iter()
            .filter_map(|(_, p)| p.as_ref().map(|p| p.category.as_str())),
    ))
}

/// Sum of the final cost of every order ever placed.
pub async fn find_accumulated_capital(db: &DatabaseConnection) -> Result<f64, DbErr> {
    let total: Option<Option<f64>> = order::Entity::find()
        .select_only()
        .column_as(Expr::col(order::Column::FinalCost).sum(), "total")
        .into_tuple()
        .one(db)
        .await?;
    Ok(total.flatten().unwrap_or(0.0))
}

pub async fn compute_statistics(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<SalesStatistics, DbErr> {
    Ok(SalesStatistics {
        current_week_sales: find_sales_per_day_in_week(db, now).await?,
        category_weekly_purchases: find_category_to_weekly_purchases(db, now).await?,
        accumulated_capital: find_accumulated_capital(db).await?,
    })
}
