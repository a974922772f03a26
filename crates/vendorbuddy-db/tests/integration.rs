//! Offline unit tests for vendorbuddy-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Utc;
use vendorbuddy_core::{AppConfig, Environment, GeoPoint};
use vendorbuddy_db::{PoolConfig, ProductPatch, ProductRow};

fn make_row(lat: Option<f64>, lng: Option<f64>) -> ProductRow {
    let now = Utc::now();
    ProductRow {
        id: "7f1c".to_string(),
        name: "Basmati Rice".to_string(),
        category: "Grains".to_string(),
        unit_price: 92.5,
        unit_type: "kg".to_string(),
        stock: 40,
        delivery_range_km: 30,
        image_url: None,
        description: Some("Aged two years".to_string()),
        supplier_id: Some("supplier-1".to_string()),
        supplier_lat: lat,
        supplier_lng: lng,
        rating: 4.5,
        review_count: 12,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        default_page_size: 10,
        max_page_size: 100,
        backfill_cron: "0 0 3 * * *".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn row_with_both_coordinates_converts_to_located_product() {
    let product = make_row(Some(28.6), Some(77.2)).into_product();

    assert_eq!(product.id, "7f1c");
    assert_eq!(product.supplier_location, Some(GeoPoint::new(28.6, 77.2)));
    assert_eq!(product.stock, 40);
    assert_eq!(product.delivery_range_km, 30);
    assert_eq!(product.review_count, 12);
    assert_eq!(product.description.as_deref(), Some("Aged two years"));
}

#[test]
fn row_with_half_a_coordinate_has_no_location() {
    assert!(make_row(Some(28.6), None).into_product().supplier_location.is_none());
    assert!(make_row(None, Some(77.2)).into_product().supplier_location.is_none());
    assert!(make_row(None, None).into_product().supplier_location.is_none());
}

#[test]
fn negative_counts_clamp_to_zero() {
    let mut row = make_row(None, None);
    row.stock = -3;
    row.review_count = -1;
    let product = row.into_product();
    assert_eq!(product.stock, 0);
    assert_eq!(product.review_count, 0);
}

#[test]
fn default_patch_is_empty() {
    assert!(ProductPatch::default().is_empty());
    let patch = ProductPatch {
        stock: Some(0),
        ..ProductPatch::default()
    };
    assert!(!patch.is_empty());
}
