use serde::{Deserialize, Serialize};

use crate::db::entities::product;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i32,
    pub category: String,
    pub price: f64,
    pub ram: i32,
    pub cores: i32,
    pub storage: i32,
    pub transfer: i32,
}

impl From<product::Model> for ProductResponse {
    fn from(p: product::Model) -> Self {
        Self {
            id: p.id,
            category: p.category,
            price: p.price,
            ram: p.ram,
            cores: p.cores,
            storage: p.storage,
            transfer: p.transfer,
        }
    }
}
