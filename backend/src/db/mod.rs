pub mod repository;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::config::AppConfig;

pub use repository::TaskRepository;

/// Opens the long-lived pool used for the lifetime of the process.
pub async fn connect(config: &AppConfig) -> Result<SqlitePool, sqlx::Error> {
    let location = config.database_location();
    let options = SqliteConnectOptions::from_str(&location)?.create_if_missing(true);

    let pool = if config.is_in_memory() {
        // every in-memory connection is its own database, so keep exactly one alive
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    info!("connecting to {}", location);
    pool.connect_with(options).await
}

pub async fn migrate(db: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(db).await
}
