use authz::error::AuthzError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use database::DatabaseError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use user::UserError;

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("{0}")]
    ReferenceNotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ReferenceNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::ReferenceNotFound(_) => "REFERENCE_NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::ValidationError { field, .. } => Some(json!({ "field": field })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        let mut response = (status, Json(error_response)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden { .. } | AuthzError::NotPermitted { .. } => {
                ApiError::Forbidden(err.to_string())
            }
            AuthzError::MissingBranch { .. } => ApiError::validation("branch_id", err.to_string()),
            AuthzError::Internal(message) => ApiError::InternalError(message),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(message) => ApiError::Conflict(message),
            DatabaseError::ForeignKeyViolation(message) => ApiError::ReferenceNotFound(message),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Database(db_err) => db_err.into(),
            UserError::InvalidCredentials => {
                ApiError::Unauthorized("incorrect username or password".to_string())
            }
            UserError::InvalidToken => ApiError::Unauthorized("invalid bearer token".to_string()),
            UserError::TokenExpired => ApiError::Unauthorized("bearer token expired".to_string()),
            UserError::PasswordHash(_) | UserError::Configuration(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use authz::types::{Action, EntityKind};

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::validation("name", "is required").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::ReferenceNotFound("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_authz_errors_map_to_forbidden_or_validation() {
        let denied: ApiError = AuthzError::Forbidden {
            required: "Admin",
            action: Action::Create,
            kind: EntityKind::Group,
        }
        .into();
        assert_eq!(denied.error_code(), "FORBIDDEN");
        assert_eq!(denied.to_string(), "Only Admin may create groups");

        let missing: ApiError = AuthzError::MissingBranch {
            action: Action::Create,
            kind: EntityKind::Admin,
        }
        .into();
        assert_eq!(missing.error_code(), "VALIDATION_ERROR");
        assert_eq!(missing.details(), Some(json!({ "field": "branch_id" })));
    }

    #[test]
    fn test_constraint_violations_are_client_errors() {
        let conflict: ApiError = DatabaseError::UniqueViolation("users.username".into()).into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let dangling: ApiError = DatabaseError::ForeignKeyViolation("fk".into()).into();
        assert_eq!(dangling.error_code(), "REFERENCE_NOT_FOUND");
    }

    #[test]
    fn test_unauthorized_response_carries_challenge() {
        let response = ApiError::from(UserError::TokenExpired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
