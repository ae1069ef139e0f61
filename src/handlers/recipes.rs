use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::handlers::ingredients::IngredientResponse;
use crate::handlers::tags::TagResponse;
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Prices are stored as decimal(5, 2).
const PRICE_SCALE: u32 = 2;
const PRICE_LIMIT: i64 = 1000;

/// Request structure for creating or fully replacing a recipe
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateRecipeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Preparation time in minutes
    #[validate(range(min = 0))]
    pub time_minutes: i32,
    /// Price with at most two decimal places, e.g. "5.25"
    #[schema(value_type = String, example = "5.25")]
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(length(max = 255))]
    pub link: Option<String>,
    /// IDs of the caller's tags; replaces the current set when present
    pub tags: Option<Vec<i32>>,
    /// IDs of the caller's ingredients; replaces the current set when present
    pub ingredients: Option<Vec<i32>>,
}

/// Request structure for partially updating a recipe
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PatchRecipeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(range(min = 0))]
    pub time_minutes: Option<i32>,
    #[schema(value_type = Option<String>, example = "5.25")]
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(length(max = 255))]
    pub link: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

/// Recipe as returned by list, create and update
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<i32>,
    pub tags: Vec<i32>,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.25")]
    pub price: Decimal,
    pub link: String,
}

impl RecipeResponse {
    fn new(model: recipe::Model, tags: Vec<i32>, ingredients: Vec<i32>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            ingredients,
            tags,
            time_minutes: model.time_minutes,
            price: display_price(model.price),
            link: model.link,
        }
    }
}

/// Recipe detail with tags and ingredients expanded
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecipeDetailResponse {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<IngredientResponse>,
    pub tags: Vec<TagResponse>,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.25")]
    pub price: Decimal,
    pub link: String,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.normalize().scale() > PRICE_SCALE {
        let mut err = ValidationError::new("price_precision");
        err.message = Some("at most 2 decimal places are allowed".into());
        return Err(err);
    }
    if price.abs() >= Decimal::from(PRICE_LIMIT) {
        let mut err = ValidationError::new("price_range");
        err.message = Some("at most 5 digits in total are allowed".into());
        return Err(err);
    }
    Ok(())
}

fn display_price(mut price: Decimal) -> Decimal {
    price.rescale(PRICE_SCALE);
    price
}

/// Sorted, duplicate-free copy of a list of IDs.
fn unique_ids(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn find_owned_recipe<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
) -> Result<recipe::Model, ApiError> {
    recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Recipe {} not found for user {}", recipe_id, user_id);
            ApiError::NotFound(format!("Recipe with ID {} not found", recipe_id))
        })
}

/// Fails unless every ID names a tag owned by `user_id`.
async fn check_owned_tags<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    tag_ids: &[i32],
) -> Result<(), ApiError> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let owned = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids.to_vec()))
        .filter(tag::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if owned != tag_ids.len() as u64 {
        warn!("Rejected unknown tag IDs {:?} for user {}", tag_ids, user_id);
        return Err(ApiError::Validation(format!(
            "Invalid fields: tags: unknown tag IDs in {:?}",
            tag_ids
        )));
    }
    Ok(())
}

/// Fails unless every ID names an ingredient owned by `user_id`.
async fn check_owned_ingredients<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ingredient_ids: &[i32],
) -> Result<(), ApiError> {
    if ingredient_ids.is_empty() {
        return Ok(());
    }
    let owned = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ingredient_ids.to_vec()))
        .filter(ingredient::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if owned != ingredient_ids.len() as u64 {
        warn!(
            "Rejected unknown ingredient IDs {:?} for user {}",
            ingredient_ids, user_id
        );
        return Err(ApiError::Validation(format!(
            "Invalid fields: ingredients: unknown ingredient IDs in {:?}",
            ingredient_ids
        )));
    }
    Ok(())
}

/// Validates and stores new link sets for a recipe. `None` leaves a set untouched.
async fn apply_links<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
    tags: Option<&[i32]>,
    ingredients: Option<&[i32]>,
) -> Result<(), ApiError> {
    if let Some(tags) = tags {
        let tag_ids = unique_ids(tags);
        check_owned_tags(db, user_id, &tag_ids).await?;
        recipe::replace_tags(db, recipe_id, &tag_ids).await?;
        debug!("Recipe {} now has {} tags", recipe_id, tag_ids.len());
    }
    if let Some(ingredients) = ingredients {
        let ingredient_ids = unique_ids(ingredients);
        check_owned_ingredients(db, user_id, &ingredient_ids).await?;
        recipe::replace_ingredients(db, recipe_id, &ingredient_ids).await?;
        debug!(
            "Recipe {} now has {} ingredients",
            recipe_id,
            ingredient_ids.len()
        );
    }
    Ok(())
}

/// Tag and ingredient IDs of one recipe, ascending.
async fn link_ids<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
) -> Result<(Vec<i32>, Vec<i32>), ApiError> {
    let mut by_recipe = link_ids_for(db, &[recipe_id]).await?;
    Ok(by_recipe.remove(&recipe_id).unwrap_or_default())
}

/// Tag and ingredient IDs for many recipes in two queries.
async fn link_ids_for<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, (Vec<i32>, Vec<i32>)>, ApiError> {
    let mut links: HashMap<i32, (Vec<i32>, Vec<i32>)> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(links);
    }

    let tag_links = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.to_vec()))
        .order_by_asc(recipe_tag::Column::TagId)
        .all(db)
        .await?;
    for link in tag_links {
        links.entry(link.recipe_id).or_default().0.push(link.tag_id);
    }

    let ingredient_links = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.to_vec()))
        .order_by_asc(recipe_ingredient::Column::IngredientId)
        .all(db)
        .await?;
    for link in ingredient_links {
        links
            .entry(link.recipe_id)
            .or_default()
            .1
            .push(link.ingredient_id);
    }

    Ok(links)
}

/// Get all recipes of the authenticated user, most recent first
#[utoipa::path(
    get,
    path = "/api/recipe/recipes",
    responses(
        (status = 200, description = "List of the user's recipes", body = ApiResponse<Vec<RecipeResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn get_recipes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RecipeResponse>>>, ApiError> {
    debug!("Fetching recipes");

    let recipes = recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(auth.user.id))
        .order_by_desc(recipe::Column::Id)
        .all(&state.db)
        .await?;

    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut links = link_ids_for(&state.db, &recipe_ids).await?;

    let responses: Vec<RecipeResponse> = recipes
        .into_iter()
        .map(|model| {
            let (tags, ingredients) = links.remove(&model.id).unwrap_or_default();
            RecipeResponse::new(model, tags, ingredients)
        })
        .collect();

    info!("Successfully fetched {} recipes", responses.len());
    Ok(Json(ApiResponse::ok(responses, "Recipes retrieved successfully")))
}

/// Create a new recipe
#[utoipa::path(
    post,
    path = "/api/recipe/recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = ApiResponse<RecipeResponse>),
        (status = 400, description = "Invalid request data or unknown tag/ingredient IDs", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
#[instrument(skip(state, auth, request), fields(user_id = auth.user.id, title = %request.title))]
pub async fn create_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeResponse>>), ApiError> {
    trace!("Entering create_recipe function");
    let user_id = auth.user.id;

    let txn = state.db.begin().await?;

    let new_recipe = recipe::ActiveModel {
        user_id: Set(user_id),
        title: Set(request.title),
        time_minutes: Set(request.time_minutes),
        price: Set(request.price),
        link: Set(request.link.unwrap_or_default()),
        ..Default::default()
    };
    let recipe_model = new_recipe.insert(&txn).await?;

    // Dropping the transaction on error rolls the insert back
    apply_links(
        &txn,
        user_id,
        recipe_model.id,
        Some(request.tags.as_deref().unwrap_or_default()),
        Some(request.ingredients.as_deref().unwrap_or_default()),
    )
    .await?;
    let (tags, ingredients) = link_ids(&txn, recipe_model.id).await?;

    txn.commit().await?;

    info!("Successfully created recipe with ID: {}", recipe_model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            RecipeResponse::new(recipe_model, tags, ingredients),
            "Recipe created successfully",
        )),
    ))
}

/// Get a recipe with its tags and ingredients expanded
#[utoipa::path(
    get,
    path = "/api/recipe/recipes/{recipe_id}",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = ApiResponse<RecipeDetailResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn get_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeDetailResponse>>, ApiError> {
    let recipe_model = find_owned_recipe(&state.db, auth.user.id, recipe_id).await?;

    let tags = recipe_model.tags(&state.db).await?;
    let ingredients = recipe_model.ingredients(&state.db).await?;
    debug!(
        "Recipe {} has {} tags and {} ingredients",
        recipe_id,
        tags.len(),
        ingredients.len()
    );

    let detail = RecipeDetailResponse {
        id: recipe_model.id,
        title: recipe_model.title,
        ingredients: ingredients.into_iter().map(IngredientResponse::from).collect(),
        tags: tags.into_iter().map(TagResponse::from).collect(),
        time_minutes: recipe_model.time_minutes,
        price: display_price(recipe_model.price),
        link: recipe_model.link,
    };

    Ok(Json(ApiResponse::ok(detail, "Recipe retrieved successfully")))
}

/// Replace a recipe
#[utoipa::path(
    put,
    path = "/api/recipe/recipes/{recipe_id}",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    request_body = CreateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated successfully", body = ApiResponse<RecipeResponse>),
        (status = 400, description = "Invalid request data or unknown tag/ingredient IDs", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
#[instrument(skip(state, auth, request), fields(user_id = auth.user.id))]
pub async fn update_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<CreateRecipeRequest>,
) -> Result<Json<ApiResponse<RecipeResponse>>, ApiError> {
    let changes = PatchRecipeRequest {
        title: Some(request.title),
        time_minutes: Some(request.time_minutes),
        price: Some(request.price),
        link: request.link,
        tags: request.tags,
        ingredients: request.ingredients,
    };
    let updated = save_recipe(&state, auth.user.id, recipe_id, changes).await?;
    Ok(Json(ApiResponse::ok(updated, "Recipe updated successfully")))
}

/// Partially update a recipe
#[utoipa::path(
    patch,
    path = "/api/recipe/recipes/{recipe_id}",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    request_body = PatchRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated successfully", body = ApiResponse<RecipeResponse>),
        (status = 400, description = "Invalid request data or unknown tag/ingredient IDs", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
#[instrument(skip(state, auth, request), fields(user_id = auth.user.id))]
pub async fn partial_update_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<PatchRecipeRequest>,
) -> Result<Json<ApiResponse<RecipeResponse>>, ApiError> {
    let updated = save_recipe(&state, auth.user.id, recipe_id, request).await?;
    Ok(Json(ApiResponse::ok(updated, "Recipe updated successfully")))
}

async fn save_recipe(
    state: &AppState,
    user_id: i32,
    recipe_id: i32,
    changes: PatchRecipeRequest,
) -> Result<RecipeResponse, ApiError> {
    let txn = state.db.begin().await?;
    let existing = find_owned_recipe(&txn, user_id, recipe_id).await?;

    let mut active: recipe::ActiveModel = existing.into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(time_minutes) = changes.time_minutes {
        active.time_minutes = Set(time_minutes);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(link) = changes.link {
        active.link = Set(link);
    }

    let recipe_model = if active.is_changed() {
        active.update(&txn).await?
    } else {
        find_owned_recipe(&txn, user_id, recipe_id).await?
    };

    apply_links(
        &txn,
        user_id,
        recipe_id,
        changes.tags.as_deref(),
        changes.ingredients.as_deref(),
    )
    .await?;
    let (tags, ingredients) = link_ids(&txn, recipe_id).await?;

    txn.commit().await?;

    info!("Successfully updated recipe with ID: {}", recipe_id);
    Ok(RecipeResponse::new(recipe_model, tags, ingredients))
}

/// Delete a recipe
#[utoipa::path(
    delete,
    path = "/api/recipe/recipes/{recipe_id}",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted successfully"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn delete_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let existing = find_owned_recipe(&state.db, auth.user.id, recipe_id).await?;
    recipe::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;

    info!("Successfully deleted recipe with ID: {}", recipe_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_price() {
        assert!(validate_price(&Decimal::from_str("5.25").unwrap()).is_ok());
        assert!(validate_price(&Decimal::from_str("999.99").unwrap()).is_ok());
        assert!(validate_price(&Decimal::from_str("5.500").unwrap()).is_ok());
        assert!(validate_price(&Decimal::from_str("5.255").unwrap()).is_err());
        assert!(validate_price(&Decimal::from_str("1000").unwrap()).is_err());
    }

    #[test]
    fn test_display_price_has_two_decimals() {
        assert_eq!(display_price(Decimal::from(10)).to_string(), "10.00");
        assert_eq!(
            display_price(Decimal::from_str("5.5").unwrap()).to_string(),
            "5.50"
        );
    }

    #[test]
    fn test_unique_ids() {
        assert_eq!(unique_ids(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(unique_ids(&[]).is_empty());
    }

    #[test]
    fn test_patch_request_accepts_partial_body() {
        let request: PatchRecipeRequest =
            serde_json::from_str(r#"{"title": "Chicken tikka"}"#).unwrap();
        assert_eq!(request.title.as_deref(), Some("Chicken tikka"));
        assert!(request.tags.is_none());
        assert!(request.validate().is_ok());
    }
}
