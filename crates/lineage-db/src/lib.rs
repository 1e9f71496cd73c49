pub use sea_orm;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub mod entities;

/// Opens a connection pool. Per-statement sqlx logging is off; callers log the
/// operations they perform instead.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opts = ConnectOptions::new(database_url);
    opts.sqlx_logging(false);
    Database::connect(opts).await
}
