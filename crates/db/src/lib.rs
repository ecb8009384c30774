//! Database plumbing shared by every Shelf module: the SQLite pool factory,
//! the module-driven migration runner, the pagination envelope, and the
//! deadline guard for slow queries.

use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod deadline;
pub mod migrate;
pub mod page;

pub use deadline::{run_with_deadline, DeadlineError};
pub use page::Page;

/// Handle to the application database. Cheap to clone.
pub type Db = sqlx::SqlitePool;

/// Open a connection pool against the configured database URL, creating the
/// file on first run.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Db> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url '{url}'"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database at '{url}'"))?;

    tracing::info!(target: "shelf_db", url, max_connections, "database pool ready");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_opens_in_memory_database() {
        let db = connect("sqlite::memory:", 1).await.unwrap();
        let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&db).await.unwrap();
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        assert!(connect("not-a-url://", 1).await.is_err());
    }
}
