use model::entities::user;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::handlers::ingredients::{CreateIngredientRequest, IngredientResponse};
use crate::handlers::recipes::{
    CreateRecipeRequest, PatchRecipeRequest, RecipeDetailResponse, RecipeResponse,
};
use crate::handlers::tags::{CreateTagRequest, TagResponse};
use crate::handlers::users::{
    CreateUserRequest, ReplaceProfileRequest, TokenRequest, TokenResponse, UpdateProfileRequest,
    UserResponse,
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Resolved token -> user lookups
    pub token_cache: Cache<String, user::Model>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: &str) -> Self {
        Self {
            data,
            message: message.to_string(),
            success: true,
        }
    }
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::create_token,
        crate::handlers::users::get_me,
        crate::handlers::users::update_me,
        crate::handlers::users::replace_me,
        crate::handlers::tags::get_tags,
        crate::handlers::tags::create_tag,
        crate::handlers::tags::get_tag,
        crate::handlers::tags::update_tag,
        crate::handlers::tags::delete_tag,
        crate::handlers::ingredients::get_ingredients,
        crate::handlers::ingredients::create_ingredient,
        crate::handlers::ingredients::get_ingredient,
        crate::handlers::ingredients::update_ingredient,
        crate::handlers::ingredients::delete_ingredient,
        crate::handlers::recipes::get_recipes,
        crate::handlers::recipes::create_recipe,
        crate::handlers::recipes::get_recipe,
        crate::handlers::recipes::update_recipe,
        crate::handlers::recipes::partial_update_recipe,
        crate::handlers::recipes::delete_recipe,
    ),
    components(
        schemas(
            ApiResponse<UserResponse>,
            ApiResponse<TokenResponse>,
            ApiResponse<TagResponse>,
            ApiResponse<Vec<TagResponse>>,
            ApiResponse<IngredientResponse>,
            ApiResponse<Vec<IngredientResponse>>,
            ApiResponse<RecipeResponse>,
            ApiResponse<Vec<RecipeResponse>>,
            ApiResponse<RecipeDetailResponse>,
            ErrorResponse,
            HealthResponse,
            CreateUserRequest,
            TokenRequest,
            TokenResponse,
            UpdateProfileRequest,
            ReplaceProfileRequest,
            UserResponse,
            CreateTagRequest,
            TagResponse,
            CreateIngredientRequest,
            IngredientResponse,
            CreateRecipeRequest,
            PatchRecipeRequest,
            RecipeResponse,
            RecipeDetailResponse,
        )
    ),
    modifiers(&TokenSecurity),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Account creation, login and profile endpoints"),
        (name = "tags", description = "Recipe tag endpoints"),
        (name = "ingredients", description = "Ingredient endpoints"),
        (name = "recipes", description = "Recipe endpoints"),
    ),
    info(
        title = "Recipe API",
        description = "Recipe management API - per-user recipes, tags and ingredients behind token authentication",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Registers the `Authorization: Token <key>` scheme.
struct TokenSecurity;

impl utoipa::Modify for TokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token <key>",
                ))),
            );
        }
    }
}
