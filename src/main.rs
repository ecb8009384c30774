mod modules;

use anyhow::Context;
use shelf_db::migrate::MigrationScript;
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "shelf-app bootstrap starting"
    );

    let db = shelf_db::connect(&settings.database.url, settings.database.max_connections).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    let scripts: Vec<MigrationScript> = registry
        .collect_migrations()
        .into_iter()
        .map(|(module, migration)| MigrationScript {
            module,
            id: migration.id,
            sql: migration.up,
        })
        .collect();
    shelf_db::migrate::run(&db, &scripts)
        .await
        .context("failed to apply migrations")?;

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("shelf-app bootstrap complete");

    shelf_http::start_server(&registry, &ctx).await?;

    registry.stop_all().await?;

    Ok(())
}
