use anyhow::Context;

use crate::Db;

/// A migration statement attributed to the module that contributed it.
#[derive(Debug, Clone)]
pub struct MigrationScript {
    pub module: String,
    pub id: &'static str,
    pub sql: &'static str,
}

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    module     TEXT NOT NULL,
    id         TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (module, id)
)";

/// Apply every script that is not yet recorded in the `_migrations` ledger,
/// in the order given. Safe to run on every startup.
pub async fn run(db: &Db, scripts: &[MigrationScript]) -> anyhow::Result<()> {
    sqlx::query(LEDGER_DDL)
        .execute(db)
        .await
        .with_context(|| "failed to create migration ledger")?;

    for script in scripts {
        let applied: Option<(String,)> =
            sqlx::query_as("SELECT id FROM _migrations WHERE module = ?1 AND id = ?2")
                .bind(&script.module)
                .bind(script.id)
                .fetch_optional(db)
                .await
                .with_context(|| "failed to read migration ledger")?;

        if applied.is_some() {
            tracing::debug!(module = %script.module, id = script.id, "migration already applied");
            continue;
        }

        sqlx::raw_sql(script.sql)
            .execute(db)
            .await
            .with_context(|| format!("migration '{}/{}' failed", script.module, script.id))?;

        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?1, ?2)")
            .bind(&script.module)
            .bind(script.id)
            .execute(db)
            .await
            .with_context(|| format!("failed to record migration '{}/{}'", script.module, script.id))?;

        tracing::info!(module = %script.module, id = script.id, "migration applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect;

    fn scripts() -> Vec<MigrationScript> {
        vec![MigrationScript {
            module: "test".to_string(),
            id: "001_init",
            sql: "CREATE TABLE widget (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
        }]
    }

    #[tokio::test]
    async fn applies_pending_migrations() {
        let db = connect("sqlite::memory:", 1).await.unwrap();
        run(&db, &scripts()).await.unwrap();

        sqlx::query("INSERT INTO widget (name) VALUES ('gear')")
            .execute(&db)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let db = connect("sqlite::memory:", 1).await.unwrap();
        run(&db, &scripts()).await.unwrap();
        // A second run must skip the already-applied script instead of
        // failing on the existing table.
        run(&db, &scripts()).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
