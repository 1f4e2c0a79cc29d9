/// User account endpoints
///
/// # Endpoints
///
/// - `POST  /api/users/register` - Register a new account
/// - `POST  /api/users/login` - Exchange credentials for a token
/// - `GET   /api/users/me` - Current user's profile (auth)
/// - `PUT   /api/users/me` - Update name, email, phone or password (auth)
/// - `GET   /api/users` - All users (admin)
/// - `GET   /api/users/:id` - One user (admin)
/// - `PATCH /api/users/:id/verify` - Mark a user verified (admin)

use crate::{
    app::AppState,
    error::{parse_id, ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rentnest_shared::{
    auth::{
        jwt::{create_token, Claims},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, UpdateUser, User, UserProfile, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(
        required(message = "Please provide a name"),
        length(max = 50, message = "Name cannot exceed 50 characters")
    )]
    pub name: Option<String>,

    /// Email address
    #[validate(
        required(message = "Please provide an email"),
        email(message = "Please provide a valid email")
    )]
    pub email: Option<String>,

    /// Plaintext password, hashed before storage
    #[validate(
        required(message = "Please provide a password"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,

    /// Optional contact phone
    pub phone: Option<String>,
}

/// Login request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required(message = "Please provide an email"))]
    pub email: Option<String>,

    #[validate(required(message = "Please provide a password"))]
    pub password: Option<String>,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    pub phone: Option<String>,
}

/// Token plus profile, returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

/// Single user response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserProfile,
}

/// User directory response
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<UserProfile>,
}

/// Trims a text field, treating blank input as absent
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let claims = Claims::new(user.id, user.role, state.config.jwt.lifetime());
    Ok(create_token(&claims, state.jwt_secret())?)
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/users/register
/// Content-Type: application/json
///
/// {
///   "name": "Jane Doe",
///   "email": "jane@example.com",
///   "password": "secret123",
///   "phone": "+1 555 0100"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{ success, message, token, user }`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the email is already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let req = RegisterRequest {
        name: trimmed(req.name),
        email: trimmed(req.email),
        password: req.password.filter(|p| !p.is_empty()),
        phone: trimmed(req.phone),
    };
    req.validate()?;

    let (Some(name), Some(email), Some(password)) = (req.name, req.email, req.password) else {
        return Err(ApiError::BadRequest("Please provide name, email and password".to_string()));
    };

    let password_hash = password::hash_password(&password)?;

    // Uniqueness is enforced by the store; a taken email surfaces as a duplicate-field error
    let user = state
        .store
        .insert_user(User::new(CreateUser {
            name,
            email,
            password_hash,
            role: UserRole::User,
            phone: req.phone,
            is_verified: false,
        }))
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully".to_string(),
            token,
            user: user.profile(),
        }),
    ))
}

/// Log in with email and password
///
/// # Errors
///
/// - `400 Bad Request`: Missing email or password
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let req = LoginRequest {
        email: trimmed(req.email),
        password: req.password.filter(|p| !p.is_empty()),
    };
    req.validate()?;

    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::BadRequest("Please provide email and password".to_string()));
    };

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: user.profile(),
    }))
}

/// Current user's profile
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(UserResponse {
        success: true,
        message: None,
        user: user.profile(),
    }))
}

/// Update the current user's profile
///
/// An empty `phone` clears it. A new password is re-hashed.
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    let req = UpdateProfileRequest {
        name: req.name.map(|n| n.trim().to_string()),
        email: req.email.map(|e| e.trim().to_string()),
        password: req.password,
        phone: req.phone,
    };
    req.validate()?;

    let password_hash = match req.password.as_deref() {
        Some(password) => Some(password::hash_password(password)?),
        None => None,
    };

    let user = state
        .store
        .update_user(
            auth.user_id,
            UpdateUser {
                name: req.name,
                email: req.email,
                password_hash,
                phone: req.phone,
                is_verified: None,
            },
        )
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(UserResponse {
        success: true,
        message: Some("Profile updated successfully".to_string()),
        user: user.profile(),
    }))
}

/// All users, newest first (admin)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserListResponse>> {
    let users: Vec<UserProfile> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(User::profile)
        .collect();

    Ok(Json(UserListResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

/// One user by id (admin)
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .store
        .find_user(parse_id(&id)?)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(UserResponse {
        success: true,
        message: None,
        user: user.profile(),
    }))
}

/// Mark a user as verified (admin)
pub async fn verify_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .store
        .update_user(
            parse_id(&id)?,
            UpdateUser {
                is_verified: Some(true),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %user.id, "User verified");

    Ok(Json(UserResponse {
        success: true,
        message: Some("User verified successfully".to_string()),
        user: user.profile(),
    }))
}
