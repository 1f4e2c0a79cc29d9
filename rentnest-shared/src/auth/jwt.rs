/// JWT token generation and validation
///
/// Tokens are signed with HS256 and identify a user plus the role they held
/// when the token was issued.
///
/// # Claims
///
/// - `sub`: user id (ObjectId hex string)
/// - `role`: `user` or `admin`
/// - `iss`: always `rentnest`
/// - `iat` / `nbf` / `exp`: Unix timestamps
///
/// The lifetime comes from the `JWT_EXPIRE` setting, parsed with
/// [`parse_expiry`].
///
/// # Example
///
/// ```
/// use rentnest_shared::auth::jwt::{create_token, parse_expiry, validate_token, Claims};
/// use rentnest_shared::models::user::UserRole;
/// use bson::oid::ObjectId;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = ObjectId::new();
/// let claims = Claims::new(user_id, UserRole::User, parse_expiry("30d")?);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.user_id()?, user_id);
/// # Ok(())
/// # }
/// ```

use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::UserRole;

/// Issuer written into and required from every token
pub const ISSUER: &str = "rentnest";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, structure or claims rejected; the detail is logged, not displayed
    #[error("token failed")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Subject is not a valid user id
    #[error("Invalid token subject: {0}")]
    InvalidSubject(String),

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    /// Unparseable `JWT_EXPIRE` value
    #[error("Invalid token lifetime '{0}': use a number followed by s, m, h or d")]
    InvalidExpiry(String),
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id as hex string
    pub sub: String,

    /// Role at issue time
    pub role: UserRole,

    /// Issuer - always "rentnest"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for a user that expire after `expires_in`
    pub fn new(user_id: ObjectId, role: UserRole, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_hex(),
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Parses the subject back into a user id
    pub fn user_id(&self) -> Result<ObjectId, JwtError> {
        ObjectId::parse_str(&self.sub).map_err(|_| JwtError::InvalidSubject(self.sub.clone()))
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Parses a token lifetime such as `30d`, `12h`, `45m`, `90s` or `3600`
///
/// A bare number is read as seconds. Zero and negative lifetimes are rejected.
///
/// ```
/// use rentnest_shared::auth::jwt::parse_expiry;
/// use chrono::Duration;
///
/// assert_eq!(parse_expiry("7d").unwrap(), Duration::days(7));
/// assert_eq!(parse_expiry("3600").unwrap(), Duration::hours(1));
/// assert!(parse_expiry("soon").is_err());
/// ```
pub fn parse_expiry(raw: &str) -> Result<Duration, JwtError> {
    let value = raw.trim();
    let invalid = || JwtError::InvalidExpiry(raw.to_string());

    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], Some(c.to_ascii_lowercase())),
        Some(_) => (value, None),
        None => return Err(invalid()),
    };

    let amount: i64 = digits.trim().parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    match unit {
        None | Some('s') => Ok(Duration::seconds(amount)),
        Some('m') => Ok(Duration::minutes(amount)),
        Some('h') => Ok(Duration::hours(amount)),
        Some('d') => Ok(Duration::days(amount)),
        Some(_) => Err(invalid()),
    }
}

/// Signs claims into a token string
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates signature, expiry, not-before and issuer, returning the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => {
            tracing::debug!(error = %e, "Token validation failed");
            JwtError::ValidationError(e.to_string())
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_parse_expiry_units() {
        assert_eq!(parse_expiry("30d").unwrap(), Duration::days(30));
        assert_eq!(parse_expiry("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_expiry("45m").unwrap(), Duration::minutes(45));
        assert_eq!(parse_expiry("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_expiry(" 7D ").unwrap(), Duration::days(7));
        assert_eq!(parse_expiry("600").unwrap(), Duration::seconds(600));
    }

    #[test]
    fn test_parse_expiry_rejects_bad_values() {
        for raw in ["", "d", "0d", "-5h", "10w", "ten days", "1.5h"] {
            assert!(parse_expiry(raw).is_err(), "'{}' should be rejected", raw);
        }
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = ObjectId::new();
        let claims = Claims::new(user_id, UserRole::Admin, Duration::hours(1));
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.user_id().unwrap(), user_id);
        assert_eq!(validated.role, UserRole::Admin);
        assert_eq!(validated.iss, ISSUER);
        assert!(!validated.is_expired());
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(ObjectId::new(), UserRole::User, Duration::hours(1));
        let token = create_token(&claims, SECRET).unwrap();

        let err = validate_token(&token, "another-secret-key-of-32-bytes!!").unwrap_err();
        assert!(matches!(err, JwtError::ValidationError(_)));
        assert_eq!(err.to_string(), "token failed");
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::new(ObjectId::new(), UserRole::User, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_rejects_foreign_issuer() {
        let mut claims = Claims::new(ObjectId::new(), UserRole::User, Duration::hours(1));
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_garbage_subject() {
        let mut claims = Claims::new(ObjectId::new(), UserRole::User, Duration::hours(1));
        claims.sub = "not-an-object-id".to_string();
        assert!(matches!(claims.user_id(), Err(JwtError::InvalidSubject(_))));
    }
}
