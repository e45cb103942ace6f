use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::db::entities::product;

// --- Product Service Functions ---

/// Catalog fields accepted when an administrator creates or edits a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub category: String,
    pub price: f64,
    pub ram: i32,
    pub cores: i32,
    pub storage: i32,
    pub transfer: i32,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.category.trim().is_empty() {
            return Err("Category must not be empty.".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("Price must be a non-negative number.".to_string());
        }
        if self.ram <= 0 || self.cores <= 0 || self.storage <= 0 || self.transfer <= 0 {
            return Err("Ram, cores, storage and transfer must be positive.".to_string());
        }
        Ok(())
    }
}

/// Retrieves the whole catalog ordered by id.
pub async fn find_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>, DbErr> {
    product::Entity::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
}

/// Retrieves a product by its ID.
pub async fn find_product_by_id<C>(db: &C, product_id: i32) -> Result<Option<product::Model>, DbErr>
where
    C: ConnectionTrait,
{
    product::Entity::find_by_id(product_id).one(db).await
}

pub async fn create_product(
    db: &DatabaseConnection,
    input: &ProductInput,
) -> Result<product::Model, DbErr> {
    product::ActiveModel {
        category: Set(input.category.trim().to_owned()),
        price: Set(input.price),
        ram: Set(input.ram),
        cores: Set(input.cores),
        storage: Set(input.storage),
        transfer: Set(input.transfer),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Overwrites the catalog entry. Returns `None` when the product does not exist.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i32,
    input: &ProductInput,
) -> Result<Option<product::Model>, DbErr> {
    let Some(existing) = product::Entity::find_by_id(product_id).one(db).await? else {
        return Ok(None);
    };

    let mut active_product = existing.into_active_model();
    active_product.category = Set(input.category.trim().to_owned());
    active_product.price = Set(input.price);
    active_product.ram = Set(input.ram);
    active_product.cores = Set(input.cores);
    active_product.storage = Set(input.storage);
    active_product.transfer = Set(input.transfer);
    active_product.update(db).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::test_support::{memory_db, product_input as input};

    #[test]
    fn test_validate_rejects_bad_catalog_values() {
        assert!(input("Basic", 10.0).validate().is_ok());
        assert!(input("  ", 10.0).validate().is_err());
        assert!(input("Basic", -1.0).validate().is_err());
        assert!(input("Basic", f64::NAN).validate().is_err());

        let mut no_cores = input("Basic", 10.0);
        no_cores.cores = 0;
        assert!(no_cores.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_then_update_product() {
        let db = memory_db().await;
        let created = create_product(&db, &input("Basic", 10.0)).await.unwrap();
        assert_eq!(created.category, "Basic");

        let updated = update_product(&db, created.id, &input("Pro", 25.5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.category, "Pro");
        assert_eq!(updated.price, 25.5);

        let all = find_all_products(&db).await.unwrap();
        assert_eq!(all, vec![updated]);
    }

    #[tokio::test]
    async fn test_update_missing_product_returns_none() {
        let db = memory_db().await;
        let result = update_product(&db, 42, &input("Basic", 10.0)).await.unwrap();
        assert!(result.is_none());
    }
}
