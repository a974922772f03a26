//! Catalog read handlers: search, single listing, and per-supplier listings.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vendorbuddy_core::{AnnotatedProduct, GeoPoint, Product, SearchFilters, SortKey};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta, SearchSettings};

const DEFAULT_SORT_BY: &str = "name";
const DEFAULT_SORT_DIR: &str = "asc";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductItem {
    id: String,
    name: String,
    category: String,
    unit_price: f64,
    unit_type: String,
    stock: u32,
    in_stock: bool,
    delivery_range_km: u32,
    image_url: Option<String>,
    description: Option<String>,
    supplier_id: Option<String>,
    supplier_lat: Option<f64>,
    supplier_lng: Option<f64>,
    rating: f64,
    review_count: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_delivery_days: Option<u32>,
}

impl From<Product> for ProductItem {
    fn from(product: Product) -> Self {
        let in_stock = product.is_in_stock();
        Self {
            id: product.id,
            name: product.name,
            category: product.category,
            unit_price: product.unit_price,
            unit_type: product.unit_type,
            stock: product.stock,
            in_stock,
            delivery_range_km: product.delivery_range_km,
            image_url: product.image_url,
            description: product.description,
            supplier_id: product.supplier_id,
            supplier_lat: product.supplier_location.map(|p| p.lat),
            supplier_lng: product.supplier_location.map(|p| p.lng),
            rating: product.rating,
            review_count: product.review_count,
            created_at: product.created_at,
            updated_at: product.updated_at,
            distance_km: None,
            estimated_delivery_days: None,
        }
    }
}

impl From<AnnotatedProduct> for ProductItem {
    fn from(annotated: AnnotatedProduct) -> Self {
        Self {
            distance_km: annotated.distance_km,
            estimated_delivery_days: annotated.estimated_delivery_days,
            ..Self::from(annotated.product)
        }
    }
}

impl From<vendorbuddy_db::ProductRow> for ProductItem {
    fn from(row: vendorbuddy_db::ProductRow) -> Self {
        Self::from(row.into_product())
    }
}

/// One page of search results. Pagination fields sit beside `products`
/// rather than under a `data` envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductPage {
    products: Vec<ProductItem>,
    current_page: usize,
    total_items: usize,
    total_pages: usize,
    meta: ResponseMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductSearchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub location_kms: Option<f64>,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

fn require_finite(name: &str, value: Option<f64>) -> Result<Option<f64>, String> {
    match value {
        Some(v) if !v.is_finite() => Err(format!("{name} must be a finite number")),
        other => Ok(other),
    }
}

/// Turns raw query parameters into engine filters.
///
/// The caller location is formed only when both `userLat` and `userLng` are
/// given; a lone coordinate is ignored. `size` falls back to the configured
/// default and is capped at the configured maximum.
pub(super) fn build_filters(
    query: ProductSearchQuery,
    settings: SearchSettings,
) -> Result<SearchFilters, String> {
    let min_price = require_finite("minPrice", query.min_price)?;
    let max_price = require_finite("maxPrice", query.max_price)?;
    let max_distance_km = require_finite("locationKms", query.location_kms)?;
    let user_lat = require_finite("userLat", query.user_lat)?;
    let user_lng = require_finite("userLng", query.user_lng)?;

    let caller_location = match (user_lat, user_lng) {
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng);
            if !point.is_valid() {
                return Err(
                    "userLat must be within [-90, 90] and userLng within [-180, 180]".to_string(),
                );
            }
            Some(point)
        }
        _ => None,
    };

    let page_size = match query.size {
        Some(0) => return Err("size must be at least 1".to_string()),
        Some(size) => size.min(settings.max_page_size),
        None => settings.default_page_size,
    };

    let sort = SortKey::from_sort_params(
        Some(query.sort_by.as_deref().unwrap_or(DEFAULT_SORT_BY)),
        Some(query.sort_dir.as_deref().unwrap_or(DEFAULT_SORT_DIR)),
    );

    Ok(SearchFilters {
        search_term: query.search,
        category: query.category,
        min_price,
        max_price,
        caller_location,
        max_distance_km,
        page: query.page.unwrap_or(0),
        page_size,
        sort,
    })
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ProductSearchQuery>, QueryRejection>,
) -> Result<Json<ProductPage>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "bad_request", rejection.body_text())
    })?;
    let filters = build_filters(query, state.search)
        .map_err(|message| ApiError::validation(&req_id.0, message))?;

    let catalog: Vec<Product> = vendorbuddy_db::fetch_all_products(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e, "product"))?
        .into_iter()
        .map(vendorbuddy_db::ProductRow::into_product)
        .collect();

    let result = vendorbuddy_core::search(&catalog, &filters)
        .map_err(|e| ApiError::validation(&req_id.0, e.to_string()))?;

    tracing::debug!(
        catalog = catalog.len(),
        matches = result.total_match_count,
        page = result.page,
        sort = %filters.sort,
        "product search"
    );

    Ok(Json(ProductPage {
        products: result.products.into_iter().map(ProductItem::from).collect(),
        current_page: result.page,
        total_items: result.total_match_count,
        total_pages: result.total_pages,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let row = vendorbuddy_db::fetch_product_by_id(&state.pool, &id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e, "product"))?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_supplier_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(supplier_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = vendorbuddy_db::list_products_by_supplier(&state.pool, &supplier_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e, "supplier"))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProductItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
