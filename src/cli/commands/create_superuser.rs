use anyhow::Result;
use model::identity;
use sea_orm::Database;
use tracing::{debug, error, info, trace};

pub async fn create_superuser(database_url: &str, email: &str, password: &str) -> Result<()> {
    trace!("Entering create_superuser function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url).await?;

    match identity::create_superuser(&db, email, password).await {
        Ok(user) => {
            info!("Superuser {} created with ID {}", user.email, user.id);
            Ok(())
        }
        Err(e) => {
            error!("Failed to create superuser: {}", e);
            Err(e.into())
        }
    }
}
