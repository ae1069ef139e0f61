#[cfg(test)]
pub mod test_utils {
    use crate::config::build_token_cache;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
    use axum::Router;
    use axum_test::TestServer;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{ingredient, recipe, tag, token, user};
    use model::identity;
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use tracing_subscriber::EnvFilter;

    pub const TEST_PASSWORD: &str = "testpass123";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        AppState {
            db: setup_test_db().await,
            token_cache: build_token_cache(),
        }
    }

    /// Initialize tracing for tests, writing through the test harness.
    ///
    /// The filter comes from RUST_LOG and defaults to `warn`. Safe to call from
    /// every test; only the first call installs the subscriber.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        init_test_tracing();
        create_router(setup_test_app_state().await)
    }

    /// Test server plus a handle on its database for seeding fixtures
    pub async fn setup_test_server() -> (TestServer, DatabaseConnection) {
        init_test_tracing();
        let state = setup_test_app_state().await;
        let db = state.db.clone();
        let server = TestServer::new(create_router(state)).unwrap();
        (server, db)
    }

    pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> user::Model {
        identity::create_user(db, email, TEST_PASSWORD, Some("Test Name"))
            .await
            .expect("Failed to create test user")
    }

    /// `Authorization` header carrying `user`'s API token
    pub async fn auth_header(db: &DatabaseConnection, user: &user::Model) -> (HeaderName, HeaderValue) {
        let issued = token::get_or_create(db, user)
            .await
            .expect("Failed to issue token");
        let value = HeaderValue::from_str(&format!("Token {}", issued.key)).unwrap();
        (AUTHORIZATION, value)
    }

    /// Creates a user and returns it with a ready-to-use auth header
    pub async fn authenticated_user(
        db: &DatabaseConnection,
        email: &str,
    ) -> (user::Model, (HeaderName, HeaderValue)) {
        let user = create_test_user(db, email).await;
        let header = auth_header(db, &user).await;
        (user, header)
    }

    pub async fn sample_tag(db: &DatabaseConnection, user: &user::Model, name: &str) -> tag::Model {
        tag::ActiveModel {
            user_id: Set(user.id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create tag")
    }

    pub async fn sample_ingredient(
        db: &DatabaseConnection,
        user: &user::Model,
        name: &str,
    ) -> ingredient::Model {
        ingredient::ActiveModel {
            user_id: Set(user.id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create ingredient")
    }

    /// Recipe with 10 minutes preparation time and a price of 5.00
    pub async fn sample_recipe(
        db: &DatabaseConnection,
        user: &user::Model,
        title: &str,
    ) -> recipe::Model {
        recipe::ActiveModel {
            user_id: Set(user.id),
            title: Set(title.to_string()),
            time_minutes: Set(10),
            price: Set(Decimal::new(500, 2)),
            link: Set(String::new()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create recipe")
    }
}
