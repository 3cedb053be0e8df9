use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection};
use std::time::Duration;

use crate::config::Config;

/// Initialize the database connection from config.
pub async fn connect(config: &Config) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut opts = ConnectOptions::new(&config.database_url);
    opts.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .sqlx_logging(config.is_dev());

    // A pooled sqlite :memory: URL opens a distinct database per
    // connection; pin the pool to one connection so tests see one DB.
    if config.database_url.contains(":memory:") {
        opts.max_connections(1).min_connections(1);
    }

    SeaDatabase::connect(opts).await
}
