/// Property listing endpoints
///
/// # Endpoints
///
/// - `GET    /api/properties` - Search listings (filters + pagination)
/// - `GET    /api/properties/mine` - Caller's own listings (auth)
/// - `GET    /api/properties/:id` - One listing with owner contact details
/// - `POST   /api/properties` - Create a listing, JSON or multipart (auth)
/// - `PUT    /api/properties/:id` - Update a listing (owner or admin)
/// - `DELETE /api/properties/:id` - Delete a listing (owner or admin)
///
/// Create and update accept the same body shapes; see [`crate::upload`].

use crate::{
    app::AppState,
    error::{parse_id, ApiError, ApiResult},
    extract::ApiQuery,
    upload::{remove_images, retain_owned_uploads, save_images, PropertySubmission},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rentnest_shared::{
    auth::{authorization::require_owner_or_admin, middleware::AuthContext},
    models::{
        filter::{Page, PropertyFilter},
        property::{merge_fields, validate_listing, OwnerSummary, Property, PropertyType, PropertyView},
    },
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Listing search parameters
///
/// ```text
/// GET /api/properties?city=austin&propertyType=house&minPrice=1000&maxPrice=2500&bedrooms=2&available=true&page=2&limit=20
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Minimum bedrooms
    pub bedrooms: Option<i32>,
    pub available: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListQuery {
    /// Splits the query into a store filter and a page
    pub fn into_parts(self) -> ApiResult<(PropertyFilter, Page)> {
        let property_type = match self.property_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(PropertyType::from_str(raw).map_err(ApiError::BadRequest)?),
        };

        let filter = PropertyFilter {
            city: self
                .city
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            property_type,
            min_price: self.min_price,
            max_price: self.max_price,
            min_bedrooms: self.bedrooms,
            is_available: self.available,
            owner: None,
        };

        Ok((filter, Page::new(self.page, self.limit)))
    }
}

/// One page of listings
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    /// Listings on this page
    pub count: usize,
    /// Listings matching the filter across all pages
    pub total: u64,
    pub page: u64,
    pub pages: u64,
    pub data: Vec<PropertyView>,
}

/// Single listing response
#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: PropertyView,
}

/// Acknowledgement without a payload
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

fn property_not_found() -> ApiError {
    ApiError::NotFound("Property not found".to_string())
}

async fn load_property(state: &AppState, id: &str) -> ApiResult<Property> {
    state
        .store
        .find_property(parse_id(id)?)
        .await?
        .ok_or_else(property_not_found)
}

async fn list_page(
    state: &AppState,
    filter: PropertyFilter,
    page: Page,
) -> ApiResult<Json<ListResponse>> {
    let (properties, total) = state.store.list_properties(&filter, page).await?;

    Ok(Json(ListResponse {
        success: true,
        count: properties.len(),
        total,
        page: page.number,
        pages: page.page_count(total),
        data: properties.iter().map(Property::view).collect(),
    }))
}

/// Search listings
///
/// Filters: `city` (case-insensitive, partial), `propertyType`, `minPrice`,
/// `maxPrice`, `bedrooms` (minimum), `available`. Paging: `page` (default 1),
/// `limit` (default 10, max 100). Newest first.
pub async fn list_properties(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let (filter, page) = query.into_parts()?;
    list_page(&state, filter, page).await
}

/// The caller's own listings, with the same filters and paging
pub async fn my_properties(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let (mut filter, page) = query.into_parts()?;
    filter.owner = Some(auth.user_id);
    list_page(&state, filter, page).await
}

/// One listing, with the owner's contact details
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PropertyResponse>> {
    let property = load_property(&state, &id).await?;

    let mut data = property.view();
    data.owner_details = state
        .store
        .find_user(property.owner)
        .await?
        .map(|owner| OwnerSummary {
            id: owner.id.to_hex(),
            name: owner.name,
            email: owner.email,
            phone: owner.phone,
        });

    Ok(Json(PropertyResponse {
        success: true,
        message: None,
        data,
    }))
}

/// Create a listing owned by the caller
///
/// # Response
///
/// `201 Created` with `{ success, message, data }`.
///
/// # Errors
///
/// - `400 Bad Request`: Schema violations (all messages joined), upload violations
/// - `401 Unauthorized`: Missing or invalid token
pub async fn create_property(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    submission: PropertySubmission,
) -> ApiResult<(StatusCode, Json<PropertyResponse>)> {
    let mut listing = validate_listing(&submission.fields)?;
    retain_owned_uploads(&mut listing.images, &[]);

    let upload_dir = &state.config.uploads.dir;
    let uploaded = save_images(upload_dir, submission.images).await?;
    listing.images.extend(uploaded.iter().cloned());

    let property = match state
        .store
        .insert_property(Property::new(auth.user_id, listing))
        .await
    {
        Ok(property) => property,
        Err(err) => {
            remove_images(upload_dir, &uploaded).await;
            return Err(err.into());
        }
    };

    tracing::info!(property_id = %property.id, owner = %property.owner, "Property created");

    Ok((
        StatusCode::CREATED,
        Json(PropertyResponse {
            success: true,
            message: Some("Property created successfully".to_string()),
            data: property.view(),
        }),
    ))
}

/// Update a listing
///
/// The submitted fields are overlaid on the stored listing and the result is
/// validated as a whole. New images are appended; images dropped from the
/// `images` list are deleted from disk. The `images` list can only keep or
/// drop uploads the listing already has.
pub async fn update_property(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    submission: PropertySubmission,
) -> ApiResult<Json<PropertyResponse>> {
    let existing = load_property(&state, &id).await?;
    require_owner_or_admin(&auth, existing.owner)?;

    let merged = merge_fields(existing.to_fields(), &submission.fields);
    let mut listing = validate_listing(&merged)?;
    retain_owned_uploads(&mut listing.images, &existing.images);

    let upload_dir = &state.config.uploads.dir;
    let uploaded = save_images(upload_dir, submission.images).await?;
    listing.images.extend(uploaded.iter().cloned());

    let updated = match state.store.replace_property(existing.revise(listing)).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            remove_images(upload_dir, &uploaded).await;
            return Err(property_not_found());
        }
        Err(err) => {
            remove_images(upload_dir, &uploaded).await;
            return Err(err.into());
        }
    };

    let dropped: Vec<String> = existing
        .images
        .iter()
        .filter(|image| !updated.images.contains(image))
        .cloned()
        .collect();
    remove_images(upload_dir, &dropped).await;

    tracing::info!(property_id = %updated.id, "Property updated");

    Ok(Json(PropertyResponse {
        success: true,
        message: Some("Property updated successfully".to_string()),
        data: updated.view(),
    }))
}

/// Delete a listing and its uploaded images
pub async fn delete_property(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let property = load_property(&state, &id).await?;
    require_owner_or_admin(&auth, property.owner)?;

    if !state.store.delete_property(property.id).await? {
        return Err(property_not_found());
    }

    remove_images(&state.config.uploads.dir, &property.images).await;

    tracing::info!(property_id = %property.id, "Property deleted");

    Ok(Json(MessageResponse {
        success: true,
        message: "Property deleted successfully".to_string(),
    }))
}
