/// Request authentication context
///
/// The API server's auth layer parses the `Authorization: Bearer <token>`
/// header with [`bearer_claims`], confirms the user still exists, and inserts
/// an [`AuthContext`] into the request extensions for handlers to extract
/// with `Extension<AuthContext>`.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::{User, UserRole};

/// Identity of the caller, available to handlers behind the auth layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user id
    pub user_id: ObjectId,

    /// Current role, read from the stored user rather than the token
    pub role: UserRole,
}

impl AuthContext {
    /// Builds the context from a freshly loaded user
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }

    /// Whether the caller is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Not authorized, no token provided")]
    MissingCredentials,

    /// Header present but not a Bearer token
    #[error("Not authorized, expected a Bearer token")]
    InvalidFormat,

    /// Token failed validation
    #[error("Not authorized, {0}")]
    InvalidToken(#[from] JwtError),

    /// Token is valid but its user no longer exists
    #[error("Not authorized, user no longer exists")]
    UnknownUser,
}

/// Extracts and validates the claims from an Authorization header value
pub fn bearer_claims(header: Option<&str>, secret: &str) -> Result<Claims, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)?;

    Ok(validate_token(token, secret)?)
}
