#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An app wired to the in-memory store and temporary asset directories
/// - Test user creation and JWT token generation
/// - Request helpers for JSON and multipart bodies

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rentnest_api::app::{build_router, AppState};
use rentnest_api::config::{
    AdminConfig, ApiConfig, AssetConfig, Config, DatabaseConfig, JwtConfig, UploadConfig,
};
use rentnest_shared::auth::jwt::{create_token, Claims};
use rentnest_shared::auth::password::hash_password;
use rentnest_shared::db::{memory::MemoryStore, Store};
use rentnest_shared::models::user::{CreateUser, User, UserRole};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const TEST_PASSWORD: &str = "password123";
pub const BOUNDARY: &str = "rentnest-test-boundary";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
    pub root: PathBuf,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a fresh app with one regular user
    pub async fn new() -> Self {
        let root = std::env::temp_dir().join(format!("rentnest-test-{}", Uuid::new_v4()));
        let public_dir = root.join("public");
        let models_dir = root.join("models");
        std::fs::create_dir_all(&public_dir).unwrap();
        std::fs::create_dir_all(&models_dir).unwrap();
        std::fs::write(public_dir.join("index.html"), "<h1>RentNest</h1>").unwrap();
        std::fs::write(models_dir.join("house.glb"), b"glTF").unwrap();

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                uri: "memory://".to_string(),
            },
            jwt: JwtConfig {
                secret: TEST_SECRET.to_string(),
                expires_in_seconds: 3600,
            },
            uploads: UploadConfig {
                dir: root.join("uploads"),
                ..Default::default()
            },
            assets: AssetConfig {
                public_dir,
                models_dir,
            },
            admin: AdminConfig::default(),
        };

        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), config.clone()));
        let user = insert_user(&store, "owner@example.com", UserRole::User).await;
        let token = token_for(&user);

        TestContext {
            app,
            store,
            config,
            root,
            user,
            token,
        }
    }

    /// Inserts another user and returns it with a valid token
    pub async fn create_user(&self, email: &str, role: UserRole) -> (User, String) {
        let user = insert_user(&self.store, email, role).await;
        let token = token_for(&user);
        (user, token)
    }

    /// Sends a request and returns the status and parsed JSON body
    ///
    /// Non-JSON bodies come back as `Value::Null`.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Sends a JSON request, optionally authenticated
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Sends a multipart request with the given text fields and files
    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        files: &[FilePart],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, files)))
            .unwrap();

        self.send(request).await
    }

    /// Creates a valid listing owned by the context user, returning its JSON
    pub async fn create_listing(&self, city: &str, price: f64) -> Value {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/properties",
                Some(&self.token),
                Some(listing_json(city, price)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Inserts a user whose password is [`TEST_PASSWORD`]
pub async fn insert_user(store: &MemoryStore, email: &str, role: UserRole) -> User {
    store
        .insert_user(User::new(CreateUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role,
            phone: Some("555-0100".to_string()),
            is_verified: false,
        }))
        .await
        .unwrap()
}

pub fn token_for(user: &User) -> String {
    let claims = Claims::new(user.id, user.role, chrono::Duration::hours(1));
    create_token(&claims, TEST_SECRET).unwrap()
}

/// One file in a multipart body
pub struct FilePart {
    pub field: &'static str,
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

impl FilePart {
    pub fn image(file_name: &'static str, content_type: &'static str, size: usize) -> Self {
        Self {
            field: "images",
            file_name,
            content_type,
            data: vec![0u8; size],
        }
    }
}

pub fn multipart_body(fields: &[(&str, &str)], files: &[FilePart]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    for file in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&file.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// A complete, valid listing body
pub fn listing_json(city: &str, price: f64) -> Value {
    serde_json::json!({
        "title": format!("Apartment in {}", city),
        "description": "Two bedrooms, close to transit",
        "price": price,
        "location": "Downtown",
        "address": {
            "street": "1 Main St",
            "city": city,
            "country": "USA"
        },
        "bedrooms": 2,
        "bathrooms": 1,
        "propertyType": "apartment",
        "amenities": ["parking"]
    })
}

/// Form fields for a complete, valid listing
pub fn listing_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("title", "Garden flat"),
        ("description", "Ground floor with a private garden"),
        ("price", "1450"),
        ("location", "Old Town"),
        ("address[city]", "Portland"),
        ("address[zipCode]", "97201"),
        ("bedrooms", "1"),
        ("bathrooms", "1"),
        ("propertyType", "apartment"),
        ("amenities", "garden, wifi"),
    ]
}
