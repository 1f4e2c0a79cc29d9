/// Property listing model and schema
///
/// Listings arrive either as JSON or as multipart form fields, so every value
/// may be a string. Submissions go through two stages before they can be
/// stored:
///
/// 1. **Cast** ([`PropertyInput::cast`]): numeric strings become numbers,
///    `"true"`/`"false"` become booleans, comma-separated strings become
///    lists. Values that cannot be cast are reported per field.
/// 2. **Validate** ([`validate_listing`]): required fields, bounds, the
///    property type enumeration and the year-built window.
///
/// Every failure from both stages is collected into one [`SchemaError`].
///
/// # Example
///
/// ```
/// use rentnest_shared::models::property::validate_listing;
/// use serde_json::json;
///
/// let fields = json!({
///     "title": "Sunny loft",
///     "description": "Top floor, two balconies",
///     "price": "1850",
///     "location": "Riverside",
///     "address": { "city": "Portland" },
///     "bedrooms": 2,
///     "bathrooms": 1.5,
///     "propertyType": "apartment"
/// });
///
/// let listing = validate_listing(fields.as_object().unwrap()).unwrap();
/// assert_eq!(listing.price, 1850.0);
///
/// let err = validate_listing(json!({ "title": "Loft" }).as_object().unwrap()).unwrap_err();
/// assert!(err.message().contains("Please provide a price"));
/// ```

use bson::oid::ObjectId;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::{field_errors, FieldError, SchemaError};

/// Earliest accepted construction year
pub const MIN_YEAR_BUILT: i32 = 1800;

/// Order in which field messages are reported
const FIELD_ORDER: &[&str] = &[
    "title",
    "description",
    "price",
    "location",
    "address",
    "bedrooms",
    "bathrooms",
    "size",
    "property_type",
    "images",
    "amenities",
    "year_built",
    "is_available",
];

/// Closed set of property types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Condo,
    Townhouse,
    Studio,
    Villa,
    Other,
}

impl PropertyType {
    pub const ALL: [PropertyType; 7] = [
        PropertyType::Apartment,
        PropertyType::House,
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::Studio,
        PropertyType::Villa,
        PropertyType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Condo => "condo",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Studio => "studio",
            PropertyType::Villa => "villa",
            PropertyType::Other => "other",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PropertyType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = PropertyType::ALL.iter().map(|t| t.as_str()).collect();
                format!(
                    "'{}' is not a valid property type. Use one of: {}",
                    s.trim(),
                    allowed.join(", ")
                )
            })
    }
}

/// Structured postal address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    pub city: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Stored listing document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    pub address: Address,
    pub bedrooms: i32,
    pub bathrooms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    pub property_type: PropertyType,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    /// Owning user
    pub owner: ObjectId,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_available() -> bool {
    true
}

/// A listing that passed validation, not yet tied to an id or owner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    pub address: Address,
    pub bedrooms: i32,
    pub bathrooms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    pub property_type: PropertyType,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    pub is_available: bool,
}

impl Property {
    /// Creates a new listing owned by `owner`
    pub fn new(owner: ObjectId, data: NewProperty) -> Self {
        let now = Utc::now();

        Self {
            id: ObjectId::new(),
            title: data.title,
            description: data.description,
            price: data.price,
            location: data.location,
            address: data.address,
            bedrooms: data.bedrooms,
            bathrooms: data.bathrooms,
            size: data.size,
            property_type: data.property_type,
            images: data.images,
            amenities: data.amenities,
            year_built: data.year_built,
            owner,
            is_available: data.is_available,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the listing content, keeping id, owner and creation time
    pub fn revise(&self, data: NewProperty) -> Self {
        Self {
            id: self.id,
            owner: self.owner,
            created_at: self.created_at,
            ..Property::new(self.owner, data)
        }
    }

    /// Current content as raw input fields, the base for partial updates
    pub fn to_fields(&self) -> Map<String, Value> {
        let content = NewProperty {
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            location: self.location.clone(),
            address: self.address.clone(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            size: self.size,
            property_type: self.property_type,
            images: self.images.clone(),
            amenities: self.amenities.clone(),
            year_built: self.year_built,
            is_available: self.is_available,
        };

        match serde_json::to_value(content) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Client-facing representation
    pub fn view(&self) -> PropertyView {
        PropertyView {
            id: self.id.to_hex(),
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            location: self.location.clone(),
            address: self.address.clone(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            size: self.size,
            property_type: self.property_type,
            images: self.images.clone(),
            amenities: self.amenities.clone(),
            year_built: self.year_built,
            owner: self.owner.to_hex(),
            owner_details: None,
            is_available: self.is_available,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Owner contact details attached to a single-listing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Client-facing listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    pub address: Address,
    pub bedrooms: i32,
    pub bathrooms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    pub property_type: PropertyType,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_details: Option<OwnerSummary>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address fields after casting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// Listing fields after casting, before validation
#[derive(Debug, Clone, Default, Validate)]
pub struct PropertyInput {
    #[validate(
        required(message = "Please provide a title"),
        length(max = 100, message = "Title cannot exceed 100 characters")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Please provide a description"),
        length(max = 2000, message = "Description cannot exceed 2000 characters")
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "Please provide a price"),
        range(min = 0.0, message = "Price cannot be negative")
    )]
    pub price: Option<f64>,

    #[validate(required(message = "Please provide a location"))]
    pub location: Option<String>,

    pub address: Option<AddressInput>,

    #[validate(
        required(message = "Please provide the number of bedrooms"),
        range(min = 0, message = "Bedrooms cannot be negative")
    )]
    pub bedrooms: Option<i64>,

    #[validate(
        required(message = "Please provide the number of bathrooms"),
        range(min = 0.0, message = "Bathrooms cannot be negative")
    )]
    pub bathrooms: Option<f64>,

    #[validate(range(exclusive_min = 0.0, message = "Size must be greater than 0 square feet"))]
    pub size: Option<f64>,

    #[validate(required(message = "Please specify the property type"))]
    pub property_type: Option<String>,

    pub images: Option<Vec<String>>,

    pub amenities: Option<Vec<String>>,

    pub year_built: Option<i64>,

    pub is_available: Option<bool>,
}

impl PropertyInput {
    /// Casts raw fields into typed input, collecting per-field cast failures
    ///
    /// Unknown keys are ignored.
    pub fn cast(fields: &Map<String, Value>) -> (Self, Vec<FieldError>) {
        let mut errors = Vec::new();
        let mut caster = Caster {
            fields,
            errors: &mut errors,
        };

        let input = PropertyInput {
            title: caster.string("title", "title"),
            description: caster.string("description", "description"),
            price: caster.number("price", "price"),
            location: caster.string("location", "location"),
            address: caster.address(),
            bedrooms: caster.integer("bedrooms", "bedrooms"),
            bathrooms: caster.number("bathrooms", "bathrooms"),
            size: caster.number("size", "size"),
            property_type: caster.string("propertyType", "property_type"),
            images: caster.list("images", "images"),
            amenities: caster.list("amenities", "amenities"),
            year_built: caster.integer("yearBuilt", "year_built"),
            is_available: caster.boolean("isAvailable", "is_available"),
        };

        (input, errors)
    }
}

/// Reads and casts values out of a raw field map
struct Caster<'a> {
    fields: &'a Map<String, Value>,
    errors: &'a mut Vec<FieldError>,
}

impl Caster<'_> {
    fn fail(&mut self, field: &str, key: &str, expected: &str) {
        self.errors.push(FieldError::new(
            field,
            format!("Invalid value for {}: expected {}", key, expected),
        ));
    }

    fn string(&mut self, key: &str, field: &str) -> Option<String> {
        let fields = self.fields;
        match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => match cast_string(value) {
                Ok(s) => s,
                Err(()) => {
                    self.fail(field, key, "text");
                    None
                }
            },
        }
    }

    fn number(&mut self, key: &str, field: &str) -> Option<f64> {
        let fields = self.fields;
        match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => match cast_number(value) {
                Ok(n) => n,
                Err(()) => {
                    self.fail(field, key, "a number");
                    None
                }
            },
        }
    }

    fn integer(&mut self, key: &str, field: &str) -> Option<i64> {
        let fields = self.fields;
        match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => match cast_number(value) {
                Ok(Some(n)) if n.fract() == 0.0 && n.abs() < i32::MAX as f64 => Some(n as i64),
                Ok(None) => None,
                _ => {
                    self.fail(field, key, "a whole number");
                    None
                }
            },
        }
    }

    fn boolean(&mut self, key: &str, field: &str) -> Option<bool> {
        let fields = self.fields;
        match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" => None,
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => {
                    self.fail(field, key, "true or false");
                    None
                }
            },
            Some(_) => {
                self.fail(field, key, "true or false");
                None
            }
        }
    }

    fn list(&mut self, key: &str, field: &str) -> Option<Vec<String>> {
        let fields = self.fields;
        match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(split_list(s)),
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match cast_string(item) {
                        Ok(Some(s)) => out.push(s),
                        Ok(None) => {}
                        Err(()) => {
                            self.fail(field, key, "a list of text values");
                            return None;
                        }
                    }
                }
                Some(out)
            }
            Some(_) => {
                self.fail(field, key, "a list of text values");
                None
            }
        }
    }

    fn address(&mut self) -> Option<AddressInput> {
        let fields = self.fields;
        let parsed;
        let object = match fields.get("address") {
            None | Some(Value::Null) => return None,
            Some(Value::Object(map)) => map,
            // Multipart clients may send the whole address as a JSON string
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => {
                    parsed = map;
                    &parsed
                }
                _ => {
                    self.fail("address", "address", "an object");
                    return None;
                }
            },
            Some(_) => {
                self.fail("address", "address", "an object");
                return None;
            }
        };

        let mut nested = Caster {
            fields: object,
            errors: &mut *self.errors,
        };

        Some(AddressInput {
            street: nested.string("street", "address.street"),
            city: nested.string("city", "address.city"),
            state: nested.string("state", "address.state"),
            zip_code: nested.string("zipCode", "address.zip_code"),
            country: nested.string("country", "address.country"),
        })
    }
}

fn cast_string(value: &Value) -> Result<Option<String>, ()> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(()),
    }
}

fn cast_number(value: &Value) -> Result<Option<f64>, ()> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or(()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(()),
        },
        _ => Err(()),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn field_rank(field: &str) -> usize {
    let root = field.split('.').next().unwrap_or(field);
    FIELD_ORDER
        .iter()
        .position(|f| *f == root)
        .unwrap_or(FIELD_ORDER.len())
}

/// Casts and validates raw listing fields
///
/// # Errors
///
/// Returns a [`SchemaError`] listing every violated rule, in schema order.
pub fn validate_listing(fields: &Map<String, Value>) -> Result<NewProperty, SchemaError> {
    let (input, mut errors) = PropertyInput::cast(fields);

    // A field that failed to cast is already reported; skip its "required" message
    let cast_failed: Vec<String> = errors.iter().map(|e| e.field.clone()).collect();
    if let Err(validation) = input.validate() {
        errors.extend(
            field_errors(&validation)
                .into_iter()
                .filter(|e| !cast_failed.contains(&e.field)),
        );
    }

    let city = input.address.as_ref().and_then(|a| a.city.clone());
    if city.is_none() && !cast_failed.iter().any(|f| f.starts_with("address")) {
        errors.push(FieldError::new("address.city", "Please provide the city"));
    }

    let property_type = match input.property_type.as_deref().map(PropertyType::from_str) {
        Some(Ok(t)) => Some(t),
        Some(Err(message)) => {
            errors.push(FieldError::new("property_type", message));
            None
        }
        None => None,
    };

    let current_year = Utc::now().year();
    let year_built = match input.year_built {
        Some(year) if year < MIN_YEAR_BUILT as i64 || year > current_year as i64 => {
            errors.push(FieldError::new(
                "year_built",
                format!(
                    "Year built must be between {} and {}",
                    MIN_YEAR_BUILT, current_year
                ),
            ));
            None
        }
        other => other.map(|y| y as i32),
    };

    errors.sort_by_key(|e| field_rank(&e.field));

    let (
        Some(title),
        Some(description),
        Some(price),
        Some(location),
        Some(city),
        Some(bedrooms),
        Some(bathrooms),
        Some(property_type),
        true,
    ) = (
        input.title,
        input.description,
        input.price,
        input.location,
        city,
        input.bedrooms,
        input.bathrooms,
        property_type,
        errors.is_empty(),
    )
    else {
        return Err(SchemaError { errors });
    };

    let address = input.address.unwrap_or_default();

    Ok(NewProperty {
        title,
        description,
        price,
        location,
        address: Address {
            street: address.street,
            city,
            state: address.state,
            zip_code: address.zip_code,
            country: address.country,
        },
        bedrooms: bedrooms as i32,
        bathrooms,
        size: input.size,
        property_type,
        images: input.images.unwrap_or_default(),
        amenities: input.amenities.unwrap_or_default(),
        year_built,
        is_available: input.is_available.unwrap_or(true),
    })
}

/// Overlays `patch` onto `base`; the `address` object is merged key by key
pub fn merge_fields(mut base: Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    for (key, value) in patch {
        match (key.as_str(), base.get_mut(key), value) {
            ("address", Some(Value::Object(existing)), Value::Object(update)) => {
                for (k, v) in update {
                    existing.insert(k.clone(), v.clone());
                }
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
    base
}
