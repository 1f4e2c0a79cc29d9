/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Authenticated request context
/// - [`authorization`]: Role and ownership checks
///
/// # Example
///
/// ```no_run
/// use rentnest_shared::auth::password::{hash_password, verify_password};
/// use rentnest_shared::auth::jwt::{create_token, validate_token, Claims};
/// use rentnest_shared::models::user::UserRole;
/// use bson::oid::ObjectId;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(ObjectId::new(), UserRole::User, Duration::days(30));
/// let token = create_token(&claims, "secret-key")?;
/// let validated = validate_token(&token, "secret-key")?;
/// assert_eq!(validated.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
