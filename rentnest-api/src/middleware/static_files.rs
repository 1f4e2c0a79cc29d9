/// Static asset serving
///
/// - `/models/*`: 3D model files, served with model content types
/// - everything outside `/api`: the public frontend directory
///
/// Unknown `/api/*` paths never fall through to the frontend; they get the
/// JSON 404 envelope instead.

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header::CONTENT_TYPE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::path::Path;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::{app::AppState, error::ApiError};

/// Content types for 3D model assets, by extension
const MODEL_TYPES: &[(&str, &str)] = &[
    ("glb", "model/gltf-binary"),
    ("gltf", "model/gltf+json"),
    ("obj", "model/obj"),
    ("stl", "model/stl"),
];

/// Content type for a model file path, if it has a known model extension
pub fn model_content_type(path: &str) -> Option<&'static str> {
    let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();

    MODEL_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Overrides the content type of successful model file responses
pub async fn model_headers(request: Request, next: Next) -> Response {
    let content_type = model_content_type(request.uri().path());
    let mut response = next.run(request).await;

    if let Some(content_type) = content_type {
        if response.status().is_success() {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }

    response
}

/// Whether a path belongs to the JSON API
pub fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Router fallback: JSON 404 for API paths, public files for the rest
pub async fn fallback(State(state): State<AppState>, request: Request) -> Response {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if is_api_path(&path) {
        return ApiError::NotFound(format!("API route not found: {}", path)).into_response();
    }

    match ServeDir::new(&state.config.assets.public_dir)
        .oneshot(request)
        .await
    {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
