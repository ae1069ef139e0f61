//! Unified error handling for the HTTP layer.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use model::identity::IdentityError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::schemas::ErrorResponse;

/// Application-level error type returned by handlers and extractors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed field validation.
    #[error("{0}")]
    Validation(String),

    /// Request body could not be parsed at all.
    #[error("{0}")]
    InvalidPayload(String),

    /// Sign-up with an email that is already registered.
    #[error("A user with email '{0}' already exists")]
    EmailTaken(String),

    /// Login with credentials that do not check out.
    #[error("Unable to authenticate with provided credentials")]
    InvalidCredentials,

    /// No usable credentials on a protected endpoint.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Resource missing or owned by someone else.
    #[error("{0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InvalidPayload(_)
            | Self::EmailTaken(_)
            | Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::EmailTaken(_) => "EMAIL_ALREADY_EXISTS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized(_) => "NOT_AUTHENTICATED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => {
                error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: self.code().to_string(),
            success: false,
        });

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Token")], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingEmail | IdentityError::InvalidEmail(_) => {
                Self::Validation(err.to_string())
            }
            IdentityError::EmailTaken(email) => Self::EmailTaken(email),
            IdentityError::PasswordHash(_) => Self::Internal(err.to_string()),
            IdentityError::Database(db_err) => Self::Database(db_err),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, reasons.join(", "))
            })
            .collect();
        fields.sort();
        Self::Validation(format!("Invalid fields: {}", fields.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 5))]
        password: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmailTaken("a@b.c".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("no").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::Unauthorized("Invalid token.").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Token");
    }

    #[test]
    fn test_identity_errors_map_to_bad_request() {
        let err: ApiError = IdentityError::MissingEmail.into();
        assert!(matches!(err, ApiError::Validation(_)));

        let err: ApiError = IdentityError::EmailTaken("a@b.c".into()).into();
        assert_eq!(err.code(), "EMAIL_ALREADY_EXISTS");
    }

    #[test]
    fn test_validation_errors_list_fields() {
        let probe = Probe {
            password: "bite".into(),
            email: "nope".into(),
        };
        let err: ApiError = probe.validate().unwrap_err().into();

        let message = err.to_string();
        assert!(message.contains("email"));
        assert!(message.contains("password"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
