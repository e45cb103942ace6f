pub mod auth_routes;
pub mod catalog_pages;
pub mod order_pages;
pub mod product_routes;
pub mod sale_routes;
pub mod session_pages;
pub mod statistics_routes;
pub mod user_routes;
