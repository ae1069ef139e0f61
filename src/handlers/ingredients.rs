use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::ingredient;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request structure for creating or renaming an ingredient
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateIngredientRequest {
    /// The name of the ingredient
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Response structure for ingredient operations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(model: ingredient::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// Loads an ingredient, treating rows owned by another user as missing.
pub(crate) async fn find_owned_ingredient(
    db: &DatabaseConnection,
    user_id: i32,
    ingredient_id: i32,
) -> Result<ingredient::Model, ApiError> {
    ingredient::Entity::find_by_id(ingredient_id)
        .filter(ingredient::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Ingredient {} not found for user {}", ingredient_id, user_id);
            ApiError::NotFound(format!("Ingredient with ID {} not found", ingredient_id))
        })
}

/// Get all ingredients of the authenticated user
#[utoipa::path(
    get,
    path = "/api/recipe/ingredients",
    responses(
        (status = 200, description = "List of the user's ingredients", body = ApiResponse<Vec<IngredientResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "ingredients"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn get_ingredients(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<IngredientResponse>>>, ApiError> {
    debug!("Fetching ingredients");

    let ingredients = ingredient::Entity::find()
        .filter(ingredient::Column::UserId.eq(auth.user.id))
        .order_by_asc(ingredient::Column::Id)
        .all(&state.db)
        .await?;

    let ingredient_responses: Vec<IngredientResponse> = ingredients.into_iter().map(IngredientResponse::from).collect();
    info!("Successfully fetched {} ingredients", ingredient_responses.len());
    Ok(Json(ApiResponse::ok(ingredient_responses, "Ingredients retrieved successfully")))
}

/// Create a new ingredient
#[utoipa::path(
    post,
    path = "/api/recipe/ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created successfully", body = ApiResponse<IngredientResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "ingredients"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn create_ingredient(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IngredientResponse>>), ApiError> {
    debug!("Creating ingredient with name: {}", request.name);

    let new_ingredient = ingredient::ActiveModel {
        user_id: Set(auth.user.id),
        name: Set(request.name),
        ..Default::default()
    };
    let ingredient_model = new_ingredient.insert(&state.db).await?;

    info!("Successfully created ingredient with ID: {}", ingredient_model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            IngredientResponse::from(ingredient_model),
            "Ingredient created successfully",
        )),
    ))
}

/// Get a specific ingredient by ID
#[utoipa::path(
    get,
    path = "/api/recipe/ingredients/{ingredient_id}",
    params(
        ("ingredient_id" = i32, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient details", body = ApiResponse<IngredientResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "ingredients"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn get_ingredient(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<ApiResponse<IngredientResponse>>, ApiError> {
    trace!("Fetching ingredient {}", ingredient_id);
    let ingredient_model = find_owned_ingredient(&state.db, auth.user.id, ingredient_id).await?;
    Ok(Json(ApiResponse::ok(
        IngredientResponse::from(ingredient_model),
        "Ingredient retrieved successfully",
    )))
}

/// Rename an ingredient
#[utoipa::path(
    put,
    path = "/api/recipe/ingredients/{ingredient_id}",
    params(
        ("ingredient_id" = i32, Path, description = "Ingredient ID")
    ),
    request_body = CreateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated successfully", body = ApiResponse<IngredientResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "ingredients"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn update_ingredient(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ingredient_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<CreateIngredientRequest>,
) -> Result<Json<ApiResponse<IngredientResponse>>, ApiError> {
    let existing = find_owned_ingredient(&state.db, auth.user.id, ingredient_id).await?;

    let mut active: ingredient::ActiveModel = existing.into();
    active.name = Set(request.name);
    let updated = active.update(&state.db).await?;

    info!("Successfully updated ingredient with ID: {}", ingredient_id);
    Ok(Json(ApiResponse::ok(
        IngredientResponse::from(updated),
        "Ingredient updated successfully",
    )))
}

/// Delete an ingredient; it is detached from every recipe that uses it
#[utoipa::path(
    delete,
    path = "/api/recipe/ingredients/{ingredient_id}",
    params(
        ("ingredient_id" = i32, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 204, description = "Ingredient deleted successfully"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "ingredients"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn delete_ingredient(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ingredient_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let existing = find_owned_ingredient(&state.db, auth.user.id, ingredient_id).await?;
    ingredient::Entity::delete_by_id(existing.id).exec(&state.db).await?;

    info!("Successfully deleted ingredient with ID: {}", ingredient_id);
    Ok(StatusCode::NO_CONTENT)
}
