use std::env;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

use crate::entities::files;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    let stmt = schema
        .create_table_from_entity(files::Entity)
        .if_not_exists()
        .to_owned();

    match db.execute(builder.build(&stmt)).await {
        Ok(_) => info!("   - Table 'files' checked/created"),
        Err(e) => tracing::warn!("   - Failed to create table 'files': {}", e),
    }

    // Indexes for list filtering and reconciliation lookups
    let index_updates = vec![
        "CREATE INDEX IF NOT EXISTS idx_files_name ON files(name)",
        "CREATE INDEX IF NOT EXISTS idx_files_status ON files(status)",
        "CREATE INDEX IF NOT EXISTS idx_files_created_at ON files(created_at)",
    ];

    for query in index_updates {
        match db
            .execute(sea_orm::Statement::from_string(builder, query))
            .await
        {
            Ok(_) => info!("   - Executed schema update: {}", query),
            Err(e) => {
                let err_msg = e.to_string().to_lowercase();
                if err_msg.contains("already exists") {
                    info!("   - Index already present (skipped): {}", query);
                } else {
                    tracing::warn!("   - Schema update warning: {} -> {}", query, e);
                }
            }
        }
    }

    Ok(())
}
