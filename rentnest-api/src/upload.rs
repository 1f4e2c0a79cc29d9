/// Listing submissions and image uploads
///
/// Property create and update accept either a JSON object or a
/// `multipart/form-data` body. [`PropertySubmission`] reads both into the same
/// raw field map that the listing schema casts and validates.
///
/// # Multipart rules
///
/// - Files are accepted only under the `images` field
/// - At most `max_files` files, each at most `max_file_size` bytes
/// - Allowed types: jpeg, jpg, png, gif, webp (extension and MIME type must agree)
/// - Text fields `address[city]` and `address.city` build the nested address;
///   `amenities[]` and repeated keys build lists
///
/// Files are buffered in memory and only written to disk by [`save_images`]
/// once the listing has validated. They are stored as `<uuid>.<ext>` and
/// referenced as `/uploads/<uuid>.<ext>`.

use axum::{
    async_trait,
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request,
    },
    http::{header::CONTENT_TYPE, StatusCode},
};
use bytes::{Bytes, BytesMut};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{app::AppState, config::UploadConfig, error::ApiError, extract::ApiJson};

/// Public URL prefix of uploaded images
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// Form field that carries image files
pub const IMAGE_FIELD: &str = "images";

/// Accepted extensions and the MIME type each must be sent with
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

/// Upload failures
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File too large. Maximum size is {max_mb}MB")]
    FileTooLarge { max_mb: usize },

    #[error("Too many files. Maximum is {max} images")]
    TooManyFiles { max: usize },

    #[error("Unexpected file field '{0}'. Upload images using the 'images' field")]
    UnexpectedField(String),

    #[error("Only image files are allowed (jpeg, jpg, png, gif, webp)")]
    UnsupportedType,

    #[error("Invalid multipart request: {0}")]
    Malformed(String),

    /// Writing to the upload directory failed
    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded image that passed type and size checks, not yet on disk
#[derive(Debug, Clone)]
pub struct PendingImage {
    /// Normalized file extension
    pub extension: &'static str,
    pub data: Bytes,
}

/// Raw listing fields plus any uploaded images
#[derive(Debug, Default)]
pub struct PropertySubmission {
    pub fields: Map<String, Value>,
    pub images: Vec<PendingImage>,
}

#[async_trait]
impl FromRequest<AppState> for PropertySubmission {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

            return Ok(read_multipart(multipart, &state.config.uploads).await?);
        }

        match ApiJson::<Value>::from_request(req, state).await? {
            ApiJson(Value::Object(fields)) => Ok(Self {
                fields,
                images: Vec::new(),
            }),
            _ => Err(ApiError::BadRequest(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }
}

/// Reads every multipart field, enforcing the upload limits
pub async fn read_multipart(
    mut multipart: Multipart,
    limits: &UploadConfig,
) -> Result<PropertySubmission, UploadError> {
    let mut submission = PropertySubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limits))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            if name != IMAGE_FIELD {
                return Err(UploadError::UnexpectedField(name));
            }
            if submission.images.len() >= limits.max_files {
                return Err(UploadError::TooManyFiles {
                    max: limits.max_files,
                });
            }

            let extension = image_extension(&file_name, field.content_type())?;
            let data = read_limited(field, limits).await?;
            debug!(file = %file_name, bytes = data.len(), "Buffered uploaded image");

            submission.images.push(PendingImage { extension, data });
        } else {
            let text = field.text().await.map_err(|e| multipart_error(e, limits))?;
            insert_form_value(&mut submission.fields, &name, text);
        }
    }

    Ok(submission)
}

fn multipart_error(err: MultipartError, limits: &UploadConfig) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::FileTooLarge {
            max_mb: limits.max_file_size_mb(),
        }
    } else {
        UploadError::Malformed(err.body_text())
    }
}

async fn read_limited(mut field: Field<'_>, limits: &UploadConfig) -> Result<Bytes, UploadError> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limits))? {
        if buffer.len() + chunk.len() > limits.max_file_size {
            return Err(UploadError::FileTooLarge {
                max_mb: limits.max_file_size_mb(),
            });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

/// Checks the file name and declared MIME type against the allowed image types
pub fn image_extension(file_name: &str, content_type: Option<&str>) -> Result<&'static str, UploadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(UploadError::UnsupportedType)?;

    let &(extension, mime) = ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == extension)
        .ok_or(UploadError::UnsupportedType)?;

    match content_type {
        Some(declared) if declared.eq_ignore_ascii_case(mime) => Ok(extension),
        _ => Err(UploadError::UnsupportedType),
    }
}

/// Adds one form value to the raw field map
///
/// `address[city]` and `address.city` become `{"address": {"city": ...}}`;
/// `key[]` and repeated keys accumulate into a list.
pub fn insert_form_value(fields: &mut Map<String, Value>, key: &str, value: String) {
    if let Some((parent, child)) = nested_key(key) {
        let entry = fields
            .entry(parent.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(child.to_string(), Value::String(value));
        }
        return;
    }

    let (key, is_list) = match key.strip_suffix("[]") {
        Some(stripped) => (stripped, true),
        None => (key, false),
    };

    match fields.get_mut(key) {
        Some(Value::Array(items)) => items.push(Value::String(value)),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, Value::String(value)]);
        }
        None if is_list => {
            fields.insert(key.to_string(), Value::Array(vec![Value::String(value)]));
        }
        None => {
            fields.insert(key.to_string(), Value::String(value));
        }
    }
}

fn nested_key(key: &str) -> Option<(&str, &str)> {
    if let Some((parent, rest)) = key.split_once('[') {
        let child = rest.strip_suffix(']')?;
        return (!parent.is_empty() && !child.is_empty()).then_some((parent, child));
    }

    key.split_once('.')
        .filter(|(parent, child)| !parent.is_empty() && !child.is_empty())
}

/// Writes images to `dir`, returning their public URLs
///
/// On failure, images already written by this call are removed.
pub async fn save_images(dir: &Path, images: Vec<PendingImage>) -> Result<Vec<String>, UploadError> {
    if images.is_empty() {
        return Ok(Vec::new());
    }

    tokio::fs::create_dir_all(dir).await?;

    let mut urls = Vec::with_capacity(images.len());
    for image in images {
        let name = format!("{}.{}", Uuid::new_v4(), image.extension);
        if let Err(err) = tokio::fs::write(dir.join(&name), &image.data).await {
            remove_images(dir, &urls).await;
            return Err(err.into());
        }
        urls.push(format!("{}/{}", UPLOAD_URL_PREFIX, name));
    }

    debug!(count = urls.len(), "Stored uploaded images");
    Ok(urls)
}

/// Whether `url` refers to a file in the upload directory
pub fn is_upload_reference(url: &str) -> bool {
    url.strip_prefix(UPLOAD_URL_PREFIX)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Drops upload references that are not in `owned`
///
/// Clients may list external image URLs freely, but an `/uploads/...`
/// reference is only kept if the listing already holds it. Files stored by
/// another listing can never be attached and later deleted through this one.
pub fn retain_owned_uploads(images: &mut Vec<String>, owned: &[String]) {
    images.retain(|image| !is_upload_reference(image) || owned.contains(image));
}

/// Deletes uploaded images by URL, ignoring references outside the upload dir
pub async fn remove_images(dir: &Path, urls: &[String]) {
    for url in urls {
        let Some(name) = url
            .strip_prefix(UPLOAD_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            continue;
        };

        // Only plain file names; no traversal out of the upload dir
        if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
            continue;
        }

        match tokio::fs::remove_file(dir.join(name)).await {
            Ok(()) => debug!(file = %name, "Removed uploaded image"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(file = %name, error = %err, "Failed to remove uploaded image"),
        }
    }
}
