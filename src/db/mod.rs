use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub mod entities;
pub mod schema;
pub mod services;

/// Opens the connection pool for `database_url`.
///
/// An in-memory SQLite database only lives as long as its connection, so the
/// pool is pinned to a single connection in that case.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    if database_url.starts_with("sqlite::memory:") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(10);
    }
    opt.sqlx_logging(false);
    Database::connect(opt).await
}
