/// Authorization checks
///
/// Two rules cover the whole API:
///
/// 1. **Admin routes**: only users with the `admin` role.
/// 2. **Listing mutation**: the listing's owner, or any admin.
///
/// # Example
///
/// ```
/// use rentnest_shared::auth::authorization::{require_admin, require_owner_or_admin};
/// use rentnest_shared::auth::middleware::AuthContext;
/// use rentnest_shared::models::user::UserRole;
/// use bson::oid::ObjectId;
///
/// let owner = ObjectId::new();
/// let auth = AuthContext { user_id: owner, role: UserRole::User };
///
/// assert!(require_owner_or_admin(&auth, owner).is_ok());
/// assert!(require_admin(&auth).is_err());
/// ```

use bson::oid::ObjectId;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller doesn't have the required role
    #[error("Role '{actual}' is not authorized to access this route")]
    InsufficientRole { actual: UserRole },

    /// Caller doesn't own the resource
    #[error("Not authorized to modify this resource")]
    NotOwner,
}

/// Requires the caller to be an administrator
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.is_admin() {
        return Err(AuthzError::InsufficientRole { actual: auth.role });
    }

    Ok(())
}

/// Requires the caller to own the resource or be an administrator
pub fn require_owner_or_admin(auth: &AuthContext, owner: ObjectId) -> Result<(), AuthzError> {
    if auth.user_id == owner || auth.is_admin() {
        return Ok(());
    }

    Err(AuthzError::NotOwner)
}
