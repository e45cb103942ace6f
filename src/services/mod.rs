pub mod auth_service;
pub mod pdf_service;
