/// Storage layer for RentNest
///
/// Handlers talk to a [`Store`] trait object so the server can run against
/// MongoDB in production and an in-memory store in tests and local demos.
///
/// # Modules
///
/// - `mongo`: MongoDB implementation with index setup
/// - `memory`: In-memory implementation with the same uniqueness rules
///
/// # Example
///
/// ```no_run
/// use rentnest_shared::db::{mongo::MongoStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MongoStore::connect("mongodb://localhost:27017/rentnest").await?;
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::models::filter::{Page, PropertyFilter};
use crate::models::property::Property;
use crate::models::user::{UpdateUser, User};

/// MongoDB server error code for unique index violations
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique field already holds this value
    #[error("Duplicate value for unique field '{field}'")]
    Duplicate { field: String },

    /// Driver or server failure
    #[error("Database error: {0}")]
    Database(mongodb::error::Error),
}

/// Storage result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations needed by the API
#[async_trait]
pub trait Store: Send + Sync {
    /// Checks connectivity
    async fn ping(&self) -> StoreResult<()>;

    /// Inserts a user; fails with [`StoreError::Duplicate`] on a taken email
    async fn insert_user(&self, user: User) -> StoreResult<User>;

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>>;

    /// Looks a user up by (normalized) email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Applies a partial update, returning the updated user if it exists
    async fn update_user(&self, id: ObjectId, update: UpdateUser) -> StoreResult<Option<User>>;

    /// All users, newest first
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn insert_property(&self, property: Property) -> StoreResult<Property>;

    async fn find_property(&self, id: ObjectId) -> StoreResult<Option<Property>>;

    /// Matching listings for one page, newest first, plus the total match count
    async fn list_properties(
        &self,
        filter: &PropertyFilter,
        page: Page,
    ) -> StoreResult<(Vec<Property>, u64)>;

    /// Replaces a stored listing, returning `None` if it no longer exists
    async fn replace_property(&self, property: Property) -> StoreResult<Option<Property>>;

    /// Deletes a listing, returning whether it existed
    async fn delete_property(&self, id: ObjectId) -> StoreResult<bool>;
}

/// Extracts the offending field name from a duplicate key error message
///
/// Server messages look like
/// `E11000 duplicate key error collection: db.users index: email_1 dup key: { email: "a@b.c" }`.
pub fn duplicate_field(message: &str) -> String {
    if let Some(rest) = message.split("dup key: {").nth(1) {
        if let Some(field) = rest.split(':').next() {
            let field = field.trim().trim_matches('"');
            if !field.is_empty() {
                return field.to_string();
            }
        }
    }

    if let Some(rest) = message.split("index: ").nth(1) {
        if let Some(index) = rest.split_whitespace().next() {
            return index.trim_end_matches("_1").trim_end_matches("_-1").to_string();
        }
    }

    "field".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_field_from_dup_key() {
        let message = r#"E11000 duplicate key error collection: rentnest.users index: email_1 dup key: { email: "jane@example.com" }"#;
        assert_eq!(duplicate_field(message), "email");
    }

    #[test]
    fn test_duplicate_field_from_index_name() {
        let message = "E11000 duplicate key error collection: rentnest.users index: phone_1";
        assert_eq!(duplicate_field(message), "phone");
    }

    #[test]
    fn test_duplicate_field_fallback() {
        assert_eq!(duplicate_field("something else"), "field");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Duplicate {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate value for unique field 'email'");
    }
}
