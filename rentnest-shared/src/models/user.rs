/// User model
///
/// A user is an identity record that can own property listings. Passwords are
/// stored as Argon2id hashes under the `password` key and never leave the
/// server: clients only ever see a [`UserProfile`].
///
/// # Document
///
/// ```json
/// {
///   "_id": ObjectId,
///   "name": "Jane Doe",
///   "email": "jane@example.com",          // unique, lowercase
///   "password": "$argon2id$...",
///   "role": "user" | "admin",
///   "phone": "+1 555 0100",               // optional
///   "isVerified": false,
///   "createdAt": ISODate,
///   "updatedAt": ISODate
/// }
/// ```

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of account roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account (default)
    #[default]
    User,

    /// Administrator with access to every listing and the user directory
    Admin,
}

impl UserRole {
    /// Gets role as string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("'{}' is not a valid role", other)),
        }
    }
}

/// Stored user document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document id
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Display name
    pub name: String,

    /// Email address, unique across users
    pub email: String,

    /// Argon2id password hash
    #[serde(rename = "password")]
    pub password_hash: String,

    /// Account role
    #[serde(default)]
    pub role: UserRole,

    /// Optional contact phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Whether an admin has verified the account
    #[serde(default)]
    pub is_verified: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub is_verified: bool,
}

/// Input for updating an existing user
///
/// Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub is_verified: Option<bool>,
}

/// Lowercases and trims an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Builds a new user document with a fresh id and timestamps
    pub fn new(data: CreateUser) -> Self {
        let now = Utc::now();

        Self {
            id: ObjectId::new(),
            name: data.name.trim().to_string(),
            email: normalize_email(&data.email),
            password_hash: data.password_hash,
            role: data.role,
            phone: data.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            is_verified: data.is_verified,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update in place and bumps `updated_at`
    pub fn apply(&mut self, update: UpdateUser) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = normalize_email(&email);
        }
        if let Some(hash) = update.password_hash {
            self.password_hash = hash;
        }
        if let Some(phone) = update.phone {
            let phone = phone.trim().to_string();
            self.phone = (!phone.is_empty()).then_some(phone);
        }
        if let Some(verified) = update.is_verified {
            self.is_verified = verified;
        }
        self.updated_at = Utc::now();
    }

    /// Public view of the user
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.to_hex(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            phone: self.phone.clone(),
            is_verified: self.is_verified,
            created_at: self.created_at,
        }
    }
}

/// Client-facing user representation (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_user() -> CreateUser {
        CreateUser {
            name: "  Jane Doe ".to_string(),
            email: " Jane@Example.COM ".to_string(),
            password_hash: "$argon2id$hash".to_string(),
            role: UserRole::User,
            phone: Some(" ".to_string()),
            is_verified: false,
        }
    }

    #[test]
    fn test_new_user_normalizes_fields() {
        let user = User::new(create_user());

        assert_eq!(user.name, "Jane Doe");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.phone, None);
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_apply_update() {
        let mut user = User::new(create_user());
        let created = user.updated_at;

        user.apply(UpdateUser {
            email: Some("NEW@example.com".to_string()),
            phone: Some("555-0100".to_string()),
            is_verified: Some(true),
            ..Default::default()
        });

        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.phone.as_deref(), Some("555-0100"));
        assert!(user.is_verified);
        assert_eq!(user.name, "Jane Doe");
        assert!(user.updated_at >= created);
    }

    #[test]
    fn test_profile_hides_password() {
        let user = User::new(create_user());
        let json = serde_json::to_value(user.profile()).unwrap();

        assert_eq!(json["id"], user.id.to_hex());
        assert_eq!(json["isVerified"], false);
        assert_eq!(json["role"], "user");
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_document_uses_mongo_field_names() {
        let user = User::new(create_user());
        let doc = bson::to_document(&user).unwrap();

        assert!(doc.get_object_id("_id").is_ok());
        assert_eq!(doc.get_str("password").unwrap(), "$argon2id$hash");
        assert!(doc.get_datetime("createdAt").is_ok());
        assert!(!doc.contains_key("phone"));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(" user ".parse::<UserRole>().unwrap(), UserRole::User);
        assert!("owner".parse::<UserRole>().is_err());
    }
}
