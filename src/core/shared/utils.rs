use diesel::{
    r2d2::{ConnectionManager, Pool},
    PgConnection,
};
use serde::{Deserialize, Deserializer};

use crate::config::DatabaseConfig;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Builds the process-wide connection pool. Connections are opened lazily, so
/// this succeeds even while the database is still coming up.
pub fn create_conn(config: &DatabaseConfig) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(&config.url);
    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(0))
        .idle_timeout(Some(config.idle_timeout()))
        .connection_timeout(config.connect_timeout())
        .build(manager)
}

/// Run database migrations
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        log::info!("Applied migration {version}");
    }
    Ok(())
}

/// Trims a free-form text field, mapping blank input to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Patch semantics for a nullable text column: `None` leaves it unchanged,
/// `Some(None)` clears it. Blank input clears as well.
pub fn normalize_patch(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(normalize_optional)
}

/// Use with `#[serde(default, deserialize_with = "deserialize_some")]` on an
/// `Option<Option<T>>` so an explicit `null` becomes `Some(None)` while an
/// absent field stays `None`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
