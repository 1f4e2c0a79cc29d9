/// Integration tests for the in-memory store
///
/// These exercise the `Store` contract the API relies on: unique emails,
/// partial updates, newest-first listing with filters and pagination.
/// Run with: cargo test -p rentnest-shared --test memory_store_tests

use bson::oid::ObjectId;
use rentnest_shared::db::{memory::MemoryStore, Store, StoreError};
use rentnest_shared::models::filter::{Page, PropertyFilter};
use rentnest_shared::models::property::{validate_listing, Property, PropertyType};
use rentnest_shared::models::user::{CreateUser, UpdateUser, User, UserRole};
use serde_json::json;

fn new_user(email: &str) -> User {
    User::new(CreateUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$test".to_string(),
        role: UserRole::User,
        phone: None,
        is_verified: false,
    })
}

fn new_listing(owner: ObjectId, city: &str, price: f64, kind: &str) -> Property {
    let fields = json!({
        "title": format!("{} {}", kind, city),
        "description": "Bright and quiet",
        "price": price,
        "location": "Center",
        "address": { "city": city },
        "bedrooms": 2,
        "bathrooms": 1,
        "propertyType": kind
    });

    Property::new(owner, validate_listing(fields.as_object().unwrap()).unwrap())
}

#[tokio::test]
async fn test_insert_and_find_user() {
    let store = MemoryStore::new();
    let user = store.insert_user(new_user("Jane@Example.com")).await.unwrap();

    let by_id = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "jane@example.com");

    let by_email = store
        .find_user_by_email("  JANE@example.COM ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, user.id);

    assert!(store.find_user(ObjectId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let store = MemoryStore::new();
    store.insert_user(new_user("dup@example.com")).await.unwrap();

    let err = store
        .insert_user(new_user("DUP@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { ref field } if field == "email"));
}

#[tokio::test]
async fn test_update_user_to_taken_email_fails() {
    let store = MemoryStore::new();
    store.insert_user(new_user("a@example.com")).await.unwrap();
    let b = store.insert_user(new_user("b@example.com")).await.unwrap();

    let result = store
        .update_user(
            b.id,
            UpdateUser {
                email: Some("A@example.com".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(StoreError::Duplicate { .. })));

    // Re-saving one's own email is fine
    let updated = store
        .update_user(
            b.id,
            UpdateUser {
                email: Some("b@example.com".to_string()),
                is_verified: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(updated.is_verified);
}

#[tokio::test]
async fn test_update_missing_user_returns_none() {
    let store = MemoryStore::new();
    let result = store
        .update_user(ObjectId::new(), UpdateUser::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_list_properties_filters_and_paginates() {
    let store = MemoryStore::new();
    let owner = ObjectId::new();

    for i in 0..5 {
        store
            .insert_property(new_listing(owner, "Seattle", 1000.0 + i as f64 * 100.0, "apartment"))
            .await
            .unwrap();
    }
    store
        .insert_property(new_listing(ObjectId::new(), "Tacoma", 800.0, "house"))
        .await
        .unwrap();

    let (all, total) = store
        .list_properties(&PropertyFilter::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(total, 6);
    assert_eq!(all.len(), 6);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let filter = PropertyFilter {
        city: Some("seat".to_string()),
        min_price: Some(1100.0),
        ..Default::default()
    };
    let (page_two, total) = store
        .list_properties(&filter, Page::new(Some(2), Some(3)))
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(page_two.len(), 1);

    let houses = PropertyFilter {
        property_type: Some(PropertyType::House),
        ..Default::default()
    };
    let (found, total) = store
        .list_properties(&houses, Page::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].address.city, "Tacoma");

    let (mine, _) = store
        .list_properties(&PropertyFilter::owned_by(owner), Page::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 5);
}

#[tokio::test]
async fn test_replace_and_delete_property() {
    let store = MemoryStore::new();
    let listing = store
        .insert_property(new_listing(ObjectId::new(), "Reno", 950.0, "condo"))
        .await
        .unwrap();

    let mut changed = listing.clone();
    changed.price = 990.0;
    let replaced = store.replace_property(changed).await.unwrap().unwrap();
    assert_eq!(replaced.price, 990.0);
    assert_eq!(
        store.find_property(listing.id).await.unwrap().unwrap().price,
        990.0
    );

    assert!(store.delete_property(listing.id).await.unwrap());
    assert!(!store.delete_property(listing.id).await.unwrap());
    assert!(store.find_property(listing.id).await.unwrap().is_none());

    let orphan = new_listing(ObjectId::new(), "Reno", 950.0, "condo");
    assert!(store.replace_property(orphan).await.unwrap().is_none());
}
