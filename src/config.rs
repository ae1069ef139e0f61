use anyhow::Result;
use moka::future::Cache;
use sea_orm::Database;
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://recipes.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

const TOKEN_CACHE_CAPACITY: u64 = 1000;
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(300);

/// Connect to `database_url` and build the shared application state
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;
    debug!("Database connection established");

    Ok(AppState {
        db,
        token_cache: build_token_cache(),
    })
}

/// Bounded token -> user cache; entries expire after 5 minutes
pub fn build_token_cache<V>() -> Cache<String, V>
where
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(TOKEN_CACHE_CAPACITY)
        .time_to_live(TOKEN_CACHE_TTL)
        .build()
}
