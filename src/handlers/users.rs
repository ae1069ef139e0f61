use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::schemas::{ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::{token, user};
use model::identity;
use sea_orm::{ActiveModelTrait, Set, TryIntoModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Email address, used as the login (must be unique)
    #[validate(email)]
    pub email: String,
    /// Password, at least 5 characters
    #[validate(length(min = 5))]
    pub password: String,
    /// Display name
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Request body for obtaining a token
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for a partial profile update
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New password, at least 5 characters
    #[validate(length(min = 5))]
    pub password: Option<String>,
}

/// Request body for a full profile update
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ReplaceProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 5))]
    pub password: String,
}

/// Public projection of a user; the password never leaves the server
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            email: model.email,
            name: model.name,
        }
    }
}

/// Token response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/user/create",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request or email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering create_user function");

    let created = identity::create_user(
        &state.db,
        &request.email,
        &request.password,
        Some(&request.name),
    )
    .await?;

    info!("User created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            UserResponse::from(created),
            "User created successfully",
        )),
    ))
}

/// Exchange credentials for an API token
#[utoipa::path(
    post,
    path = "/api/user/token",
    tag = "users",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn create_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<TokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    trace!("Entering create_token function");

    let Some(user) = identity::authenticate(&state.db, &request.email, &request.password).await?
    else {
        warn!("Token request rejected");
        return Err(ApiError::InvalidCredentials);
    };

    let issued = token::get_or_create(&state.db, &user).await?;
    info!("Issued token for user {}", user.id);

    Ok(Json(ApiResponse::ok(
        TokenResponse { token: issued.key },
        "Token issued successfully",
    )))
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/user/me",
    tag = "users",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 405, description = "Method not allowed")
    ),
    security(("token" = []))
)]
#[instrument(skip(auth), fields(user_id = auth.user.id))]
pub async fn get_me(auth: AuthUser) -> Json<ApiResponse<UserResponse>> {
    debug!("Returning profile");
    Json(ApiResponse::ok(
        UserResponse::from(auth.user),
        "Profile retrieved successfully",
    ))
}

/// Partially update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/api/user/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth, request), fields(user_id = auth.user.id))]
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let updated = save_profile(&state, auth, request.name, request.password).await?;
    Ok(Json(ApiResponse::ok(
        UserResponse::from(updated),
        "Profile updated successfully",
    )))
}

/// Replace the authenticated user's profile
#[utoipa::path(
    put,
    path = "/api/user/me",
    tag = "users",
    request_body = ReplaceProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth, request), fields(user_id = auth.user.id))]
pub async fn replace_me(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ReplaceProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let updated = save_profile(&state, auth, Some(request.name), Some(request.password)).await?;
    Ok(Json(ApiResponse::ok(
        UserResponse::from(updated),
        "Profile updated successfully",
    )))
}

async fn save_profile(
    state: &AppState,
    auth: AuthUser,
    name: Option<String>,
    password: Option<String>,
) -> Result<user::Model, ApiError> {
    let user_id = auth.user.id;
    let mut active: user::ActiveModel = auth.user.into();
    let mut updated_fields = Vec::new();

    // Update only provided fields
    if let Some(name) = name {
        active.name = Set(name);
        updated_fields.push("name");
    }
    if let Some(password) = password {
        active.set_password(&password)?;
        updated_fields.push("password");
    }

    if updated_fields.is_empty() {
        debug!("No fields to update for user ID: {}", user_id);
        return active.try_into_model().map_err(ApiError::from);
    }

    let updated = active.update(&state.db).await?;
    state.token_cache.invalidate(&auth.token).await;

    info!(
        "User with ID {} updated successfully. Updated fields: {}",
        user_id,
        updated_fields.join(", ")
    );
    Ok(updated)
}
