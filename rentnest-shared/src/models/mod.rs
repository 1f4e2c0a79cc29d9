/// Document models for RentNest
///
/// # Models
///
/// - `user`: User accounts and roles
/// - `property`: Property listings, input casting and schema validation
/// - `filter`: Listing search filters and pagination
///
/// Schema violations are reported as a [`SchemaError`] carrying every failed
/// field, so clients see all problems with a submission at once.

pub mod filter;
pub mod property;
pub mod user;

use std::fmt;

/// One violated field rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field path, e.g. `price` or `address.city`
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Aggregated schema validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub errors: Vec<FieldError>,
}

impl SchemaError {
    /// All field messages joined with `", "`
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for SchemaError {}

/// Flattens `validator` output into field errors, sorted by field name
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |error| FieldError {
                field: field.clone(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field)),
            })
        })
        .collect();

    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "Name is too short"))]
        name: String,

        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_field_errors_are_sorted_and_defaulted() {
        let sample = Sample {
            name: "x".to_string(),
            email: "nope".to_string(),
        };
        let errors = field_errors(&sample.validate().unwrap_err());

        assert_eq!(
            errors,
            vec![
                FieldError::new("email", "Invalid value for email"),
                FieldError::new("name", "Name is too short"),
            ]
        );
    }

    #[test]
    fn test_schema_error_joins_messages() {
        let err = SchemaError {
            errors: vec![
                FieldError::new("title", "Please provide a title"),
                FieldError::new("price", "Please provide a price"),
            ],
        };

        assert_eq!(err.to_string(), "Please provide a title, Please provide a price");
    }
}
