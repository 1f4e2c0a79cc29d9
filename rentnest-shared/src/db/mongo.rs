/// MongoDB storage backend
///
/// Uses two collections, `users` and `properties`. Indexes are created on
/// connect:
///
/// - `users.email` (unique): backs the duplicate-email rule
/// - `properties.owner`, `properties.address.city`, `properties.price`,
///   `properties.createdAt`: listing queries
///
/// # Example
///
/// ```no_run
/// use rentnest_shared::db::mongo::{MongoConfig, MongoStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MongoStore::with_config(MongoConfig {
///     uri: "mongodb://localhost:27017/rentnest".to_string(),
///     ..Default::default()
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{
        ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
    },
    Client, Collection, Database, IndexModel,
};
use std::time::Duration;
use tracing::{debug, info};

use super::{duplicate_field, Store, StoreError, StoreResult, DUPLICATE_KEY_CODE};
use crate::models::filter::{Page, PropertyFilter};
use crate::models::property::Property;
use crate::models::user::{normalize_email, UpdateUser, User};

const USERS: &str = "users";
const PROPERTIES: &str = "properties";

/// Database name used when the URI doesn't name one
pub const DEFAULT_DATABASE: &str = "rentnest";

/// Connection settings
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection string, e.g. `mongodb://localhost:27017/rentnest`
    pub uri: String,

    /// Overrides the database named in the URI
    pub database: Option<String>,

    /// Maximum connections held by the driver
    pub max_pool_size: u32,

    /// How long to wait for a reachable server (seconds)
    pub server_selection_timeout_seconds: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            database: None,
            max_pool_size: 10,
            server_selection_timeout_seconds: 10,
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        let duplicate = match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE => {
                Some(duplicate_field(&e.message))
            }
            ErrorKind::Command(e) if e.code == DUPLICATE_KEY_CODE => {
                Some(duplicate_field(&e.message))
            }
            _ => None,
        };

        match duplicate {
            Some(field) => StoreError::Duplicate { field },
            None => StoreError::Database(err),
        }
    }
}

/// MongoDB-backed [`Store`]
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connects with default settings
    pub async fn connect(uri: &str) -> StoreResult<Self> {
        Self::with_config(MongoConfig {
            uri: uri.to_string(),
            ..Default::default()
        })
        .await
    }

    /// Connects, verifies the server responds, and ensures indexes exist
    pub async fn with_config(config: MongoConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some("rentnest".to_string());
        options.max_pool_size = Some(config.max_pool_size);
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_seconds));

        let client = Client::with_options(options)?;
        let db = match &config.database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };

        info!(database = %db.name(), "Connecting to MongoDB");

        let store = Self { db };
        store.ping().await?;
        store.ensure_indexes().await?;

        info!("MongoDB connection established");
        Ok(store)
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn properties(&self) -> Collection<Property> {
        self.db.collection(PROPERTIES)
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
                None,
            )
            .await?;

        let property_indexes = [
            doc! { "owner": 1 },
            doc! { "address.city": 1 },
            doc! { "price": 1 },
            doc! { "createdAt": -1 },
        ]
        .into_iter()
        .map(|keys| IndexModel::builder().keys(keys).build());

        self.properties()
            .create_indexes(property_indexes, None)
            .await?;

        debug!("MongoDB indexes ensured");
        Ok(())
    }
}

/// Escapes regex metacharacters so user input matches literally
fn escape_regex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Translates a listing filter into a MongoDB query document
pub fn filter_document(filter: &PropertyFilter) -> Document {
    let mut query = Document::new();

    if let Some(city) = &filter.city {
        query.insert(
            "address.city",
            doc! { "$regex": escape_regex(city), "$options": "i" },
        );
    }
    if let Some(property_type) = filter.property_type {
        query.insert("propertyType", property_type.as_str());
    }

    let mut price = Document::new();
    if let Some(min) = filter.min_price {
        price.insert("$gte", min);
    }
    if let Some(max) = filter.max_price {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        query.insert("price", price);
    }

    if let Some(min) = filter.min_bedrooms {
        query.insert("bedrooms", doc! { "$gte": min });
    }
    if let Some(available) = filter.is_available {
        query.insert("isAvailable", available);
    }
    if let Some(owner) = filter.owner {
        query.insert("owner", owner);
    }

    query
}

fn user_update_document(update: UpdateUser) -> Document {
    let mut set = doc! { "updatedAt": bson::DateTime::now() };
    let mut unset = Document::new();

    if let Some(name) = update.name {
        set.insert("name", name.trim());
    }
    if let Some(email) = update.email {
        set.insert("email", normalize_email(&email));
    }
    if let Some(hash) = update.password_hash {
        set.insert("password", hash);
    }
    if let Some(phone) = update.phone {
        let phone = phone.trim();
        if phone.is_empty() {
            unset.insert("phone", "");
        } else {
            set.insert("phone", phone);
        }
    }
    if let Some(verified) = update.is_verified {
        set.insert("isVerified", verified);
    }

    let mut document = doc! { "$set": set };
    if !unset.is_empty() {
        document.insert("$unset", unset);
    }
    document
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        self.users().insert_one(&user, None).await?;
        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users()
            .find_one(doc! { "email": normalize_email(email) }, None)
            .await?)
    }

    async fn update_user(&self, id: ObjectId, update: UpdateUser) -> StoreResult<Option<User>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .users()
            .find_one_and_update(doc! { "_id": id }, user_update_document(update), options)
            .await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self.users().find(None, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_property(&self, property: Property) -> StoreResult<Property> {
        self.properties().insert_one(&property, None).await?;
        Ok(property)
    }

    async fn find_property(&self, id: ObjectId) -> StoreResult<Option<Property>> {
        Ok(self.properties().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_properties(
        &self,
        filter: &PropertyFilter,
        page: Page,
    ) -> StoreResult<(Vec<Property>, u64)> {
        let query = filter_document(filter);
        let total = self.properties().count_documents(query.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .skip(page.offset())
            .limit(page.limit as i64)
            .build();
        let cursor = self.properties().find(query, options).await?;

        Ok((cursor.try_collect().await?, total))
    }

    async fn replace_property(&self, property: Property) -> StoreResult<Option<Property>> {
        let result = self
            .properties()
            .replace_one(doc! { "_id": property.id }, &property, None)
            .await?;

        Ok((result.matched_count > 0).then_some(property))
    }

    async fn delete_property(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self
            .properties()
            .delete_one(doc! { "_id": id }, None)
            .await?;

        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::PropertyType;

    #[test]
    fn test_empty_filter_document() {
        assert!(filter_document(&PropertyFilter::default()).is_empty());
    }

    #[test]
    fn test_filter_document_fields() {
        let owner = ObjectId::new();
        let filter = PropertyFilter {
            city: Some("St. Louis".to_string()),
            property_type: Some(PropertyType::Studio),
            min_price: Some(500.0),
            max_price: Some(900.0),
            min_bedrooms: Some(1),
            is_available: Some(true),
            owner: Some(owner),
        };

        let query = filter_document(&filter);
        assert_eq!(
            query,
            doc! {
                "address.city": { "$regex": "St\\. Louis", "$options": "i" },
                "propertyType": "studio",
                "price": { "$gte": 500.0, "$lte": 900.0 },
                "bedrooms": { "$gte": 1 },
                "isAvailable": true,
                "owner": owner,
            }
        );
    }

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("a+b (c)"), "a\\+b \\(c\\)");
        assert_eq!(escape_regex("plain"), "plain");
    }

    #[test]
    fn test_user_update_document() {
        let update = UpdateUser {
            email: Some(" New@Example.com ".to_string()),
            phone: Some("".to_string()),
            ..Default::default()
        };

        let document = user_update_document(update);
        let set = document.get_document("$set").unwrap();
        assert_eq!(set.get_str("email").unwrap(), "new@example.com");
        assert!(set.get_datetime("updatedAt").is_ok());
        assert!(!set.contains_key("name"));
        assert!(document.get_document("$unset").unwrap().contains_key("phone"));
    }
}
