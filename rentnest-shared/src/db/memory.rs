/// In-memory storage backend
///
/// Keeps users and listings in process memory behind async `RwLock`s. It
/// enforces the same unique-email rule as the MongoDB index and returns the
/// same [`StoreError::Duplicate`] error, so handlers behave identically
/// against either backend.
///
/// Selected at startup with `MONGO_URI=memory://`. Data is lost on restart.
///
/// # Example
///
/// ```
/// use rentnest_shared::db::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// store.ping().await?;
/// assert!(store.list_users().await?.is_empty());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use bson::oid::ObjectId;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Store, StoreError, StoreResult};
use crate::models::filter::{Page, PropertyFilter};
use crate::models::property::Property;
use crate::models::user::{normalize_email, UpdateUser, User};

/// In-memory [`Store`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<ObjectId, User>>,
    properties: RwLock<HashMap<ObjectId, Property>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<ObjectId, User>, email: &str, except: Option<ObjectId>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

fn duplicate_email() -> StoreError {
    StoreError::Duplicate {
        field: "email".to_string(),
    }
}

/// Newest first; ids break ties since they embed creation time
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, ObjectId)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, None) {
            return Err(duplicate_email());
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, id: ObjectId, update: UpdateUser) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;

        if let Some(email) = &update.email {
            if email_taken(&users, &normalize_email(email), Some(id)) {
                return Err(duplicate_email());
            }
        }

        Ok(users.get_mut(&id).map(|user| {
            user.apply(update);
            user.clone()
        }))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        newest_first(&mut users, |u| (u.created_at, u.id));
        Ok(users)
    }

    async fn insert_property(&self, property: Property) -> StoreResult<Property> {
        self.properties
            .write()
            .await
            .insert(property.id, property.clone());
        Ok(property)
    }

    async fn find_property(&self, id: ObjectId) -> StoreResult<Option<Property>> {
        Ok(self.properties.read().await.get(&id).cloned())
    }

    async fn list_properties(
        &self,
        filter: &PropertyFilter,
        page: Page,
    ) -> StoreResult<(Vec<Property>, u64)> {
        let mut matching: Vec<Property> = self
            .properties
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        newest_first(&mut matching, |p| (p.created_at, p.id));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .collect();

        Ok((items, total))
    }

    async fn replace_property(&self, property: Property) -> StoreResult<Option<Property>> {
        let mut properties = self.properties.write().await;
        match properties.get_mut(&property.id) {
            Some(existing) => {
                *existing = property.clone();
                Ok(Some(property))
            }
            None => Ok(None),
        }
    }

    async fn delete_property(&self, id: ObjectId) -> StoreResult<bool> {
        Ok(self.properties.write().await.remove(&id).is_some())
    }
}
