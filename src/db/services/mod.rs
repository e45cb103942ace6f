//! Data-access functions grouped by domain entity.
//!
//! Each sub-module wraps the sea-orm queries for one area of the marketplace
//! and carries the small amount of business logic that belongs next to the
//! data: discount selection, order renewal and the admin statistics.

pub mod order_service;
pub mod product_service;
pub mod sale_service;
pub mod statistics_service;
pub mod user_service;

pub use order_service::*;
pub use product_service::*;
pub use sale_service::*;
pub use statistics_service::*;
pub use user_service::*;

/// Largest page any listing returns.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Clamps `page_size` to `1..=MAX_PAGE_SIZE`. Returns `None` when the offset
/// of `page` does not fit a SQL `BIGINT`, in which case the page is empty.
pub fn page_bounds(page: u64, page_size: u64) -> Option<u64> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let offset = page.checked_mul(page_size)?;
    (offset <= i64::MAX as u64).then_some(page_size)
}

#[cfg(test)]
pub(crate) mod test_support {
    use sea_orm::DatabaseConnection;

    use super::{NewUser, ProductInput};

    pub async fn memory_db() -> DatabaseConnection {
        let db = crate::db::connect("sqlite::memory:").await.unwrap();
        crate::db::schema::bootstrap(&db).await.unwrap();
        db
    }

    pub fn product_input(category: &str, price: f64) -> ProductInput {
        ProductInput {
            category: category.to_string(),
            price,
            ram: 4,
            cores: 2,
            storage: 80,
            transfer: 1000,
        }
    }

    pub fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            address: "12 Analytical Row".to_string(),
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
        }
    }
}
