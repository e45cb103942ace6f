pub mod email;
pub mod models;
pub mod senders;
pub mod service;
