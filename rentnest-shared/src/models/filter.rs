/// Listing search filters and pagination
///
/// The same [`PropertyFilter`] drives both storage backends: MongoDB turns it
/// into a query document, the in-memory store evaluates [`PropertyFilter::matches`].

use bson::oid::ObjectId;

use super::property::{Property, PropertyType};

/// Default page size
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest accepted page size
pub const MAX_LIMIT: u64 = 100;

/// Criteria a listing must satisfy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    /// Case-insensitive substring of `address.city`
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Minimum number of bedrooms
    pub min_bedrooms: Option<i32>,
    pub is_available: Option<bool>,
    pub owner: Option<ObjectId>,
}

impl PropertyFilter {
    /// Listings owned by one user
    pub fn owned_by(owner: ObjectId) -> Self {
        Self {
            owner: Some(owner),
            ..Default::default()
        }
    }

    pub fn matches(&self, property: &Property) -> bool {
        if let Some(city) = &self.city {
            if !property
                .address
                .city
                .to_lowercase()
                .contains(&city.to_lowercase())
            {
                return false;
            }
        }

        self.property_type.map_or(true, |t| property.property_type == t)
            && self.min_price.map_or(true, |min| property.price >= min)
            && self.max_price.map_or(true, |max| property.price <= max)
            && self.min_bedrooms.map_or(true, |min| property.bedrooms >= min)
            && self.is_available.map_or(true, |a| property.is_available == a)
            && self.owner.map_or(true, |o| property.owner == o)
    }
}

/// One page of a newest-first listing query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub number: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Builds a page, clamping to `1..` and `1..=MAX_LIMIT`
    pub fn new(number: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Number of documents to skip, capped at `i64::MAX` (the largest skip MongoDB takes)
    pub fn offset(&self) -> u64 {
        (self.number - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }

    /// Total number of pages for `total` matches
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::{validate_listing, Property};
    use serde_json::json;

    fn listing(city: &str, price: f64, bedrooms: i32) -> Property {
        let fields = json!({
            "title": "Listing",
            "description": "A place to live",
            "price": price,
            "location": "Central",
            "address": { "city": city },
            "bedrooms": bedrooms,
            "bathrooms": 1,
            "propertyType": "condo"
        });
        Property::new(
            ObjectId::new(),
            validate_listing(fields.as_object().unwrap()).unwrap(),
        )
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(PropertyFilter::default().matches(&listing("Boston", 900.0, 1)));
    }

    #[test]
    fn test_city_is_case_insensitive_substring() {
        let filter = PropertyFilter {
            city: Some("york".to_string()),
            ..Default::default()
        };

        assert!(filter.matches(&listing("New York", 900.0, 1)));
        assert!(!filter.matches(&listing("Boston", 900.0, 1)));
    }

    #[test]
    fn test_price_and_bedroom_bounds_are_inclusive() {
        let filter = PropertyFilter {
            min_price: Some(1000.0),
            max_price: Some(2000.0),
            min_bedrooms: Some(2),
            ..Default::default()
        };

        assert!(filter.matches(&listing("Denver", 1000.0, 2)));
        assert!(filter.matches(&listing("Denver", 2000.0, 3)));
        assert!(!filter.matches(&listing("Denver", 999.0, 2)));
        assert!(!filter.matches(&listing("Denver", 1500.0, 1)));
        assert!(!filter.matches(&listing("Denver", 2001.0, 4)));
    }

    #[test]
    fn test_type_and_owner() {
        let property = listing("Austin", 1200.0, 2);

        assert!(PropertyFilter::owned_by(property.owner).matches(&property));
        assert!(!PropertyFilter::owned_by(ObjectId::new()).matches(&property));

        let houses = PropertyFilter {
            property_type: Some(PropertyType::House),
            ..Default::default()
        };
        assert!(!houses.matches(&property));
    }

    #[test]
    fn test_page_clamping_and_math() {
        let page = Page::new(Some(0), Some(500));
        assert_eq!(page, Page { number: 1, limit: MAX_LIMIT });

        let page = Page::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
        assert_eq!(page.page_count(0), 0);
        assert_eq!(page.page_count(21), 3);
        assert_eq!(Page::default().limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_huge_page_number_saturates() {
        let page = Page::new(Some(u64::MAX), Some(MAX_LIMIT));
        assert_eq!(page.offset(), i64::MAX as u64);

        let page = Page::new(Some(u64::MAX), Some(1));
        assert_eq!(page.offset(), i64::MAX as u64);
    }
}
