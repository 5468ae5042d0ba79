//! Catalog and stock read-path tests against an in-memory SQLite database.

use chrono::{Duration, NaiveDate, Utc};

use pharma_core::{new_id, Product, StockBatch};
use pharma_db::{Database, DbConfig, DbError};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_product(db: &Database, name: &str, salt: Option<&str>, barcode: Option<&str>) -> Product {
    let now = Utc::now();
    let product = Product {
        id: new_id(),
        name: name.to_string(),
        barcode: barcode.map(str::to_string),
        salt_formula: salt.map(str::to_string),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}

async fn seed_batch(db: &Database, product_id: &str, batch_number: &str, quantity: i64, expiry: NaiveDate) {
    let now = Utc::now();
    let batch = StockBatch {
        id: new_id(),
        product_id: product_id.to_string(),
        batch_number: batch_number.to_string(),
        quantity,
        cost_price_cents: 100,
        selling_price_cents: 150,
        expiry_date: expiry,
        purchase_date: expiry - Duration::days(300),
        created_at: now,
        updated_at: now,
    };
    db.batches().insert(&batch).await.unwrap();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn search_matches_name_salt_and_barcode() {
    let db = test_db().await;
    seed_product(&db, "Panadol 500mg", Some("Paracetamol 500mg"), Some("8960001001")).await;
    seed_product(&db, "Calpol Syrup", Some("Paracetamol 120mg/5ml"), None).await;
    seed_product(&db, "Brufen 400mg", Some("Ibuprofen 400mg"), None).await;

    // Salt substring match, case-insensitive, hits both paracetamol products
    let hits = db.products().search("paracetamol", 10).await.unwrap();
    assert_eq!(hits.len(), 2);

    // Name match
    let hits = db.products().search("brufen", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Brufen 400mg");

    // Barcode substring
    let hits = db.products().search("8960001001", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Panadol 500mg");

    // Empty query lists actives by name
    let all = db.products().search("", 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].name, "Brufen 400mg");
}

#[tokio::test]
async fn barcode_lookup_skips_inactive_products() {
    let db = test_db().await;
    let product = seed_product(&db, "Zyrtec 10mg", None, Some("8960002002")).await;

    let found = db.products().get_by_barcode("8960002002").await.unwrap();
    assert!(found.is_some());

    db.products().soft_delete(&product.id).await.unwrap();

    // Soft-deleted products drop out of scanner lookups but stay readable
    // by id for sale history.
    let found = db.products().get_by_barcode("8960002002").await.unwrap();
    assert!(found.is_none());
    let by_id = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert!(!by_id.is_active);
}

#[tokio::test]
async fn available_batches_come_back_expiry_ascending_without_empties() {
    let db = test_db().await;
    let product = seed_product(&db, "Amoxil 500mg", Some("Amoxicillin 500mg"), None).await;

    // Seeded out of expiry order, with one drained batch
    seed_batch(&db, &product.id, "BN-LATE", 5, date(2026, 9, 1)).await;
    seed_batch(&db, &product.id, "BN-EMPTY", 0, date(2025, 1, 1)).await;
    seed_batch(&db, &product.id, "BN-EARLY", 7, date(2025, 12, 1)).await;

    let available = db.batches().available_for_product(&product.id).await.unwrap();

    // quantity > 0 only, earliest expiry first: the allocator trusts this
    assert_eq!(available.len(), 2);
    assert_eq!(available[0].batch_number, "BN-EARLY");
    assert_eq!(available[1].batch_number, "BN-LATE");
}

#[tokio::test]
async fn delta_update_refuses_to_go_negative() {
    let db = test_db().await;
    let product = seed_product(&db, "Risek 20mg", Some("Omeprazole 20mg"), None).await;
    seed_batch(&db, &product.id, "BN-1", 4, date(2026, 3, 1)).await;

    let available = db.batches().available_for_product(&product.id).await.unwrap();
    let batch_id = available[0].id.clone();

    // A decrement within stock succeeds
    db.batches().apply_delta(&batch_id, -3).await.unwrap();

    // A decrement past zero is refused as a conflict, stock untouched
    let err = db.batches().apply_delta(&batch_id, -2).await.unwrap_err();
    assert!(matches!(err, DbError::StockConflict { .. }));

    let remaining = db.batches().get_by_id(&batch_id).await.unwrap().unwrap();
    assert_eq!(remaining.quantity, 1);
}

#[tokio::test]
async fn delta_update_on_unknown_batch_is_not_found() {
    let db = test_db().await;

    let err = db.batches().apply_delta(&new_id(), -1).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn batch_insert_validates_at_the_boundary() {
    let db = test_db().await;
    let product = seed_product(&db, "Flagyl 400mg", None, None).await;

    let now = Utc::now();
    let bad = StockBatch {
        id: new_id(),
        product_id: product.id.clone(),
        batch_number: "has spaces!".to_string(),
        quantity: 10,
        cost_price_cents: 100,
        selling_price_cents: 150,
        expiry_date: date(2026, 1, 1),
        purchase_date: date(2025, 1, 1),
        created_at: now,
        updated_at: now,
    };

    let err = db.batches().insert(&bad).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidInput(_)));
}
