pub mod db;
pub mod notifications;
pub mod security;
pub mod server;
pub mod services;
pub mod version;
pub mod web;
