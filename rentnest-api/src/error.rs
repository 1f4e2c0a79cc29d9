/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; every failure is rendered as
/// the same envelope:
///
/// ```json
/// { "success": false, "message": "Property not found" }
/// ```
///
/// Errors from the shared crate (storage, JWT, passwords, authorization,
/// schema validation) and from request parsing convert into `ApiError`
/// through `From` impls, so handlers can use `?` throughout.
///
/// # Example
///
/// ```
/// use rentnest_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Property not found".to_string()));
///     }
///     Ok(Json(json!({ "success": true })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bson::oid::ObjectId;
use rentnest_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError},
    db::StoreError,
    models::{field_errors, SchemaError},
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::upload::UploadError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for every unclassified failure
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Method not allowed on an existing route (405)
    MethodNotAllowed(String),

    /// Internal server error (500); the detail is logged, never returned
    InternalError(String),
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::MethodNotAllowed(msg) => write!(f, "Method not allowed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SERVER_ERROR_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
        });

        (status, body).into_response()
    }
}

/// Parses a path identifier, rejecting anything that is not an ObjectId
pub fn parse_id(raw: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id: {}", raw)))
}

/// Convert storage errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => ApiError::BadRequest(format!(
                "Duplicate value for field '{}'. This {} is already registered",
                field, field
            )),
            StoreError::Database(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert schema validation failures to API errors
impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        ApiError::BadRequest(err.message())
    }
}

/// Convert request DTO validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::from(SchemaError {
            errors: field_errors(&err),
        })
    }
}

/// Convert malformed JSON bodies to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert malformed query strings to API errors
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert upload errors to API errors
impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(err) => ApiError::InternalError(format!("Upload storage failed: {}", err)),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token creation failed: {}", msg)),
            other => ApiError::from(AuthError::from(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentnest_shared::models::FieldError;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let (status, body) = body_json(ApiError::NotFound("Property not found".to_string())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Property not found");
    }

    #[tokio::test]
    async fn test_method_not_allowed_envelope() {
        let (status, body) =
            body_json(ApiError::MethodNotAllowed("Method DELETE not allowed for /api/health".to_string())).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Method DELETE not allowed for /api/health");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) =
            body_json(ApiError::InternalError("connection reset by peer".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], SERVER_ERROR_MESSAGE);
    }

    #[test]
    fn test_duplicate_message() {
        let err = ApiError::from(StoreError::Duplicate {
            field: "email".to_string(),
        });

        match err {
            ApiError::BadRequest(msg) => assert_eq!(
                msg,
                "Duplicate value for field 'email'. This email is already registered"
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_schema_error_joins_messages() {
        let err = ApiError::from(SchemaError {
            errors: vec![
                FieldError::new("price", "Please provide a price"),
                FieldError::new("location", "Please provide a location"),
            ],
        });

        assert_eq!(
            err.to_string(),
            "Bad request: Please provide a price, Please provide a location"
        );
    }

    #[test]
    fn test_parse_id() {
        let id = ObjectId::new();
        assert_eq!(parse_id(&id.to_hex()).unwrap(), id);

        let err = parse_id("not-an-id").unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Invalid id: not-an-id");
    }

    #[test]
    fn test_auth_errors_map_to_401_and_403() {
        assert!(matches!(
            ApiError::from(AuthError::MissingCredentials),
            ApiError::Unauthorized(msg) if msg == "Not authorized, no token provided"
        ));
        assert!(matches!(
            ApiError::from(JwtError::Expired),
            ApiError::Unauthorized(msg) if msg == "Not authorized, Token has expired"
        ));
        assert!(matches!(ApiError::from(AuthzError::NotOwner), ApiError::Forbidden(_)));
    }
}
