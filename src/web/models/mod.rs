use serde::{Deserialize, Serialize};

pub mod product_models;
pub mod sale_models;
pub mod user_models;

pub use crate::security::AuthenticatedUser;

use crate::db::services::MAX_PAGE_SIZE;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub surname: String,
    #[serde(default)]
    pub address: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub surname: String,
    pub address: String,
    pub email: String,
    pub enabled: bool,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i32,
    pub email: String,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email
    pub user_id: i32,
    pub exp: usize,
}

/// `?page=&size=` for paged listings. Pages are 1-based, as shown to users.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

impl PageQuery {
    pub fn zero_based(&self) -> u64 {
        self.page.saturating_sub(1)
    }

    pub fn page_size(&self) -> u64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }
}
