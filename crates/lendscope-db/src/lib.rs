pub mod errors;
pub mod models;
pub mod pool;
pub mod schema;

pub use errors::{DatabaseError, InitError};
pub use pool::LendscopePool;

use deadpool_diesel::postgres::{Manager, Pool, Runtime};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Build the deadpool-diesel pool every service shares.
pub fn init_pool(app_name: &str, database_url: &str) -> Result<Pool, InitError> {
    let manager = Manager::new(database_url, Runtime::Tokio1);
    let pool = Pool::builder(manager)
        .build()
        .map_err(|e| InitError::Pool(e.to_string()))?;

    tracing::info!("[{app_name}] 🗃️  Database pool initialized");
    Ok(pool)
}

/// Apply any pending embedded migrations.
pub async fn run_migrations(pool: &Pool) -> Result<(), InitError> {
    let conn = pool
        .get()
        .await
        .map_err(|e| InitError::GenericInit(e.to_string()))?;

    let applied = conn
        .interact(|conn| {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| InitError::GenericInit(e.to_string()))?
        .map_err(InitError::Migration)?;

    if applied > 0 {
        tracing::info!("🗃️  Applied {applied} pending database migration(s)");
    }
    Ok(())
}
