use anyhow::Context;
use biblio_db::Db;
use biblio_kernel::settings::Settings;
use biblio_kernel::{InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load biblio settings")?;
    biblio_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path,
        "biblio-app bootstrap starting"
    );

    let db = Db::open(&settings.database.path).await?;

    let mut registry = ModuleRegistry::new();
    biblio_app::modules::register_all(&mut registry);

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    registry.init_all(&ctx).await?;

    for (module, migration) in registry.collect_migrations() {
        db.apply_migration(&module, migration.id, migration.up)
            .await?;
    }

    registry.start_all(&ctx).await?;

    tracing::info!("biblio-app bootstrap complete");

    biblio_http::start_server(&registry, &settings, &db).await?;

    registry.stop_all().await?;
    db.close().await;

    Ok(())
}
