use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::tag;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request structure for creating or renaming a tag
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateTagRequest {
    /// The name of the tag
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Response structure for tag operations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// Loads a tag, treating rows owned by another user as missing.
pub(crate) async fn find_owned_tag(
    db: &DatabaseConnection,
    user_id: i32,
    tag_id: i32,
) -> Result<tag::Model, ApiError> {
    tag::Entity::find_by_id(tag_id)
        .filter(tag::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Tag {} not found for user {}", tag_id, user_id);
            ApiError::NotFound(format!("Tag with ID {} not found", tag_id))
        })
}

/// Get all tags of the authenticated user
#[utoipa::path(
    get,
    path = "/api/recipe/tags",
    responses(
        (status = 200, description = "List of the user's tags", body = ApiResponse<Vec<TagResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "tags"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn get_tags(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TagResponse>>>, ApiError> {
    debug!("Fetching tags");

    let tags = tag::Entity::find()
        .filter(tag::Column::UserId.eq(auth.user.id))
        .order_by_asc(tag::Column::Id)
        .all(&state.db)
        .await?;

    let tag_responses: Vec<TagResponse> = tags.into_iter().map(TagResponse::from).collect();
    info!("Successfully fetched {} tags", tag_responses.len());
    Ok(Json(ApiResponse::ok(tag_responses, "Tags retrieved successfully")))
}

/// Create a new tag
#[utoipa::path(
    post,
    path = "/api/recipe/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created successfully", body = ApiResponse<TagResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "tags"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn create_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateTagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TagResponse>>), ApiError> {
    debug!("Creating tag with name: {}", request.name);

    let new_tag = tag::ActiveModel {
        user_id: Set(auth.user.id),
        name: Set(request.name),
        ..Default::default()
    };
    let tag_model = new_tag.insert(&state.db).await?;

    info!("Successfully created tag with ID: {}", tag_model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            TagResponse::from(tag_model),
            "Tag created successfully",
        )),
    ))
}

/// Get a specific tag by ID
#[utoipa::path(
    get,
    path = "/api/recipe/tags/{tag_id}",
    params(
        ("tag_id" = i32, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag details", body = ApiResponse<TagResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "tags"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn get_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tag_id): Path<i32>,
) -> Result<Json<ApiResponse<TagResponse>>, ApiError> {
    trace!("Fetching tag {}", tag_id);
    let tag_model = find_owned_tag(&state.db, auth.user.id, tag_id).await?;
    Ok(Json(ApiResponse::ok(
        TagResponse::from(tag_model),
        "Tag retrieved successfully",
    )))
}

/// Rename a tag
#[utoipa::path(
    put,
    path = "/api/recipe/tags/{tag_id}",
    params(
        ("tag_id" = i32, Path, description = "Tag ID")
    ),
    request_body = CreateTagRequest,
    responses(
        (status = 200, description = "Tag updated successfully", body = ApiResponse<TagResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "tags"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn update_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tag_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<CreateTagRequest>,
) -> Result<Json<ApiResponse<TagResponse>>, ApiError> {
    let existing = find_owned_tag(&state.db, auth.user.id, tag_id).await?;

    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(request.name);
    let updated = active.update(&state.db).await?;

    info!("Successfully updated tag with ID: {}", tag_id);
    Ok(Json(ApiResponse::ok(
        TagResponse::from(updated),
        "Tag updated successfully",
    )))
}

/// Delete a tag; it is detached from every recipe that used it
#[utoipa::path(
    delete,
    path = "/api/recipe/tags/{tag_id}",
    params(
        ("tag_id" = i32, Path, description = "Tag ID")
    ),
    responses(
        (status = 204, description = "Tag deleted successfully"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "tags"
)]
#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn delete_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tag_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let existing = find_owned_tag(&state.db, auth.user.id, tag_id).await?;
    tag::Entity::delete_by_id(existing.id).exec(&state.db).await?;

    info!("Successfully deleted tag with ID: {}", tag_id);
    Ok(StatusCode::NO_CONTENT)
}
