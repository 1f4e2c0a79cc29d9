/// Extractors whose rejections use the API error envelope
///
/// Axum's built-in `Json` and `Query` reject with plain-text bodies. These
/// wrappers route the rejection through [`ApiError`] so malformed input gets
/// the same `{success: false, message}` response as every other failure.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

use crate::error::ApiError;

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
