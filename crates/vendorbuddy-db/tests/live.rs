//! Live integration tests for vendorbuddy-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. `"../../migrations"` resolves to the workspace
//! migration directory.

use vendorbuddy_core::{search, GeoPoint, SearchFilters, SortKey};
use vendorbuddy_db::{
    backfill_supplier_locations, create_product, delete_product, fetch_all_products,
    fetch_product_by_id, get_supplier, list_products_by_supplier, update_product, upsert_supplier,
    DbError, NewProduct, NewSupplier, ProductPatch,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn register_supplier(pool: &sqlx::PgPool, id: &str, location: Option<GeoPoint>) {
    upsert_supplier(
        pool,
        &NewSupplier {
            id: id.to_string(),
            name: format!("Supplier {id}"),
            location,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("register_supplier failed for '{id}': {e}"));
}

fn new_product(name: &str, price: f64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        category: "Vegetables".to_string(),
        unit_price: price,
        unit_type: "kg".to_string(),
        stock: 100,
        delivery_range_km: 25,
        image_url: None,
        description: None,
    }
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_supplier_updates_in_place(pool: sqlx::PgPool) {
    register_supplier(&pool, "s-1", None).await;
    register_supplier(&pool, "s-1", Some(GeoPoint::new(28.6, 77.2))).await;

    let row = get_supplier(&pool, "s-1")
        .await
        .expect("query")
        .expect("supplier exists");
    assert_eq!(row.location(), Some(GeoPoint::new(28.6, 77.2)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_supplier_returns_none_for_unknown_id(pool: sqlx::PgPool) {
    assert!(get_supplier(&pool, "ghost").await.expect("query").is_none());
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_product_copies_supplier_location(pool: sqlx::PgPool) {
    register_supplier(&pool, "delhi", Some(GeoPoint::new(28.6, 77.2))).await;

    let row = create_product(&pool, "delhi", &new_product("Red Onion", 50.0))
        .await
        .expect("create");

    assert_eq!(row.supplier_id.as_deref(), Some("delhi"));
    assert_eq!(row.supplier_lat, Some(28.6));
    assert_eq!(row.supplier_lng, Some(77.2));
    assert!(!row.id.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_product_for_unknown_supplier_is_not_found(pool: sqlx::PgPool) {
    let err = create_product(&pool, "ghost", &new_product("Tomato", 40.0))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn fetch_product_by_id_round_trips_and_reports_missing(pool: sqlx::PgPool) {
    register_supplier(&pool, "s-1", None).await;
    let created = create_product(&pool, "s-1", &new_product("Tomato", 40.0))
        .await
        .expect("create");

    let fetched = fetch_product_by_id(&pool, &created.id)
        .await
        .expect("fetch");
    assert_eq!(fetched.name, "Tomato");
    assert!(fetched.into_product().supplier_location.is_none());

    let missing = fetch_product_by_id(&pool, "does-not-exist").await;
    assert!(matches!(missing, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_product_applies_patch_only_for_owner(pool: sqlx::PgPool) {
    register_supplier(&pool, "owner", None).await;
    register_supplier(&pool, "intruder", None).await;
    let created = create_product(&pool, "owner", &new_product("Potato", 20.0))
        .await
        .expect("create");

    let patch = ProductPatch {
        unit_price: Some(22.5),
        stock: Some(7),
        ..ProductPatch::default()
    };

    let denied = update_product(&pool, "intruder", &created.id, &patch).await;
    assert!(matches!(denied, Err(DbError::NotFound)));

    let updated = update_product(&pool, "owner", &created.id, &patch)
        .await
        .expect("update");
    assert!((updated.unit_price - 22.5).abs() < f64::EPSILON);
    assert_eq!(updated.stock, 7);
    assert_eq!(updated.name, "Potato");
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_product_removes_only_owned_rows(pool: sqlx::PgPool) {
    register_supplier(&pool, "owner", None).await;
    let created = create_product(&pool, "owner", &new_product("Garlic", 120.0))
        .await
        .expect("create");

    assert!(matches!(
        delete_product(&pool, "someone-else", &created.id).await,
        Err(DbError::NotFound)
    ));
    delete_product(&pool, "owner", &created.id)
        .await
        .expect("delete");
    assert!(matches!(
        delete_product(&pool, "owner", &created.id).await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_by_supplier_filters_owner(pool: sqlx::PgPool) {
    register_supplier(&pool, "a", None).await;
    register_supplier(&pool, "b", None).await;
    create_product(&pool, "a", &new_product("Ginger", 80.0))
        .await
        .expect("create");
    create_product(&pool, "b", &new_product("Chilli", 60.0))
        .await
        .expect("create");

    let rows = list_products_by_supplier(&pool, "a").await.expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Ginger");
}

#[sqlx::test(migrations = "../../migrations")]
async fn backfill_fills_missing_locations_from_supplier(pool: sqlx::PgPool) {
    register_supplier(&pool, "late", None).await;
    register_supplier(&pool, "never", None).await;
    let late = create_product(&pool, "late", &new_product("Okra", 45.0))
        .await
        .expect("create");
    let never = create_product(&pool, "never", &new_product("Peas", 65.0))
        .await
        .expect("create");

    register_supplier(&pool, "late", Some(GeoPoint::new(19.07, 72.88))).await;

    let updated = backfill_supplier_locations(&pool).await.expect("backfill");
    assert_eq!(updated, 1);

    let late = fetch_product_by_id(&pool, &late.id).await.expect("fetch");
    assert_eq!(late.supplier_lat, Some(19.07));
    let never = fetch_product_by_id(&pool, &never.id).await.expect("fetch");
    assert!(never.supplier_lat.is_none());

    assert_eq!(backfill_supplier_locations(&pool).await.expect("rerun"), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn catalog_snapshot_feeds_search(pool: sqlx::PgPool) {
    register_supplier(&pool, "delhi", Some(GeoPoint::new(28.6, 77.2))).await;
    register_supplier(&pool, "mumbai", Some(GeoPoint::new(19.07, 72.88))).await;
    register_supplier(&pool, "unknown", None).await;
    create_product(&pool, "delhi", &new_product("Red Onion", 50.0))
        .await
        .expect("create");
    create_product(&pool, "unknown", &new_product("Tomato", 40.0))
        .await
        .expect("create");
    create_product(&pool, "mumbai", &new_product("White Onion", 55.0))
        .await
        .expect("create");

    let catalog: Vec<_> = fetch_all_products(&pool)
        .await
        .expect("fetch all")
        .into_iter()
        .map(vendorbuddy_db::ProductRow::into_product)
        .collect();
    assert_eq!(catalog.len(), 3);

    let result = search(
        &catalog,
        &SearchFilters {
            search_term: Some("onion".to_string()),
            caller_location: Some(GeoPoint::new(28.6139, 77.2090)),
            max_distance_km: Some(50.0),
            sort: SortKey::PriceAsc,
            ..SearchFilters::default()
        },
    )
    .expect("search");

    assert_eq!(result.total_match_count, 1);
    assert_eq!(result.products[0].product.name, "Red Onion");
}
