use anyhow::Result;
use sea_orm::Database;
use tracing::{debug, error, info, trace};

use super::initdb::run_migrations;
use super::serve::run_server;
use crate::config::build_token_cache;
use crate::schemas::AppState;

pub async fn migrate_and_serve(database_url: &str, bind_address: &str) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", database_url);

    let db = match Database::connect(database_url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    run_migrations(&db).await?;

    // Same connection serves the API
    let token_cache = build_token_cache();
    run_server(AppState { db, token_cache }, bind_address).await
}
