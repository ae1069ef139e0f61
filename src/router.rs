use crate::handlers::{
    health::health_check,
    ingredients::{
        create_ingredient, delete_ingredient, get_ingredient, get_ingredients, update_ingredient,
    },
    recipes::{
        create_recipe, delete_recipe, get_recipe, get_recipes, partial_update_recipe,
        update_recipe,
    },
    tags::{create_tag, delete_tag, get_tag, get_tags, update_tag},
    users::{create_token, create_user, get_me, replace_me, update_me},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // User routes; unrouted methods on /me answer 405
        .route("/api/user/create", post(create_user))
        .route("/api/user/token", post(create_token))
        .route("/api/user/me", get(get_me).patch(update_me).put(replace_me))
        // Tag routes
        .route("/api/recipe/tags", get(get_tags).post(create_tag))
        .route(
            "/api/recipe/tags/:tag_id",
            get(get_tag).put(update_tag).patch(update_tag).delete(delete_tag),
        )
        // Ingredient routes
        .route(
            "/api/recipe/ingredients",
            get(get_ingredients).post(create_ingredient),
        )
        .route(
            "/api/recipe/ingredients/:ingredient_id",
            get(get_ingredient)
                .put(update_ingredient)
                .patch(update_ingredient)
                .delete(delete_ingredient),
        )
        // Recipe routes
        .route("/api/recipe/recipes", get(get_recipes).post(create_recipe))
        .route(
            "/api/recipe/recipes/:recipe_id",
            get(get_recipe)
                .put(update_recipe)
                .patch(partial_update_recipe)
                .delete(delete_recipe),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
