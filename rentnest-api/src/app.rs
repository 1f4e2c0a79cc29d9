/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use rentnest_api::{app::AppState, config::Config};
/// use rentnest_shared::db::mongo::MongoStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = MongoStore::connect(&config.database.uri).await?;
/// let state = AppState::new(Arc::new(store), config);
/// let app = rentnest_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{security::SecurityHeadersLayer, static_files},
    routes,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Extension, Router,
};
use rentnest_shared::{
    auth::{
        authorization::require_admin,
        middleware::{bearer_claims, AuthContext, AuthError},
    },
    db::Store,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Document storage
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /api/
/// │   ├── GET /health
/// │   ├── /users/
/// │   │   ├── POST  /register
/// │   │   ├── POST  /login
/// │   │   ├── GET   /me            (auth)
/// │   │   ├── PUT   /me            (auth)
/// │   │   ├── GET   /              (admin)
/// │   │   ├── GET   /:id           (admin)
/// │   │   └── PATCH /:id/verify    (admin)
/// │   └── /properties/
/// │       ├── GET    /
/// │       ├── GET    /mine         (auth)
/// │       ├── GET    /:id
/// │       ├── POST   /             (auth)
/// │       ├── PUT    /:id          (auth, owner or admin)
/// │       └── DELETE /:id          (auth, owner or admin)
/// ├── /uploads/*                   # uploaded images
/// ├── /models/*                    # 3D model assets
/// └── /*                           # public frontend, JSON 404 under /api
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. JSON envelope for 405 responses under `/api`
/// 5. Authentication and admin checks (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let require_auth = from_fn_with_state(state.clone(), jwt_auth_layer);

    // User routes
    let public_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login));

    let own_user_routes = Router::new()
        .route(
            "/me",
            get(routes::users::current_user).put(routes::users::update_current_user),
        )
        .route_layer(require_auth.clone());

    let admin_user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user))
        .route("/:id/verify", patch(routes::users::verify_user))
        .route_layer(from_fn(admin_layer))
        .route_layer(require_auth.clone());

    let user_routes = public_user_routes
        .merge(own_user_routes)
        .merge(admin_user_routes);

    // Property routes
    let public_property_routes = Router::new()
        .route("/", get(routes::properties::list_properties))
        .route("/:id", get(routes::properties::get_property));

    let owner_property_routes = Router::new()
        .route("/", post(routes::properties::create_property))
        .route("/mine", get(routes::properties::my_properties))
        .route(
            "/:id",
            put(routes::properties::update_property).delete(routes::properties::delete_property),
        )
        .route_layer(require_auth);

    let property_routes = public_property_routes
        .merge(owner_property_routes)
        .layer(DefaultBodyLimit::max(state.config.uploads.max_body_size()));

    let api_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/users", user_routes)
        .nest("/properties", property_routes);

    let model_files = ServiceBuilder::new()
        .layer(from_fn(static_files::model_headers))
        .service(ServeDir::new(&state.config.assets.models_dir));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .nest_service("/models", model_files)
        .fallback(static_files::fallback)
        .layer(from_fn(method_not_allowed_envelope))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, checks that its user still exists, then
/// injects an [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = bearer_claims(auth_header, state.jwt_secret())?;
    let user_id = claims.user_id().map_err(AuthError::from)?;

    // Role comes from the stored user, not the token
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    req.extensions_mut().insert(AuthContext::from_user(&user));

    Ok(next.run(req).await)
}

/// Admin-only middleware layer; must run after [`jwt_auth_layer`]
async fn admin_layer(
    Extension(auth): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_admin(&auth)?;
    Ok(next.run(req).await)
}

/// Replaces axum's empty 405 response on API routes with the error envelope
///
/// The `Allow` header of the original response is kept.
async fn method_not_allowed_envelope(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED || !static_files::is_api_path(&path) {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut envelope =
        ApiError::MethodNotAllowed(format!("Method {} not allowed for {}", method, path))
            .into_response();
    if let Some(allow) = allow {
        envelope.headers_mut().insert(header::ALLOW, allow);
    }

    envelope
}
