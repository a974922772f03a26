//! Supplier write handlers: supplier registration and listing
//! create/update/delete. The acting supplier is always the `{supplier_id}`
//! path segment; these routes sit behind bearer auth.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vendorbuddy_core::GeoPoint;
use vendorbuddy_db::{NewProduct, NewSupplier, ProductPatch};

use crate::middleware::RequestId;

use super::{map_db_error, products::ProductItem, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_NAME_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpsertSupplierRequest {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateProductRequest {
    pub name: String,
    pub category: String,
    pub unit_price: f64,
    pub unit_type: String,
    pub stock: i64,
    pub delivery_range_km: i64,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<f64>,
    pub unit_type: Option<String>,
    pub stock: Option<i64>,
    pub delivery_range_km: Option<i64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SupplierItem {
    id: String,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedProduct {
    id: String,
    deleted: bool,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn required_text(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LEN {
        return Err(format!("{field} must be 1-{MAX_NAME_LEN} characters"));
    }
    Ok(trimmed.to_owned())
}

fn positive_price(value: f64) -> Result<f64, String> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("unitPrice must be a positive number, got {value}"))
    }
}

fn stock_count(value: i64) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("stock must be a non-negative integer, got {value}"))
}

fn delivery_range(value: i64) -> Result<u32, String> {
    match u32::try_from(value) {
        Ok(km) if km > 0 => Ok(km),
        _ => Err(format!(
            "deliveryRangeKm must be a positive integer, got {value}"
        )),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub(super) fn validate_new_product(body: CreateProductRequest) -> Result<NewProduct, String> {
    Ok(NewProduct {
        name: required_text("name", &body.name)?,
        category: required_text("category", &body.category)?,
        unit_price: positive_price(body.unit_price)?,
        unit_type: required_text("unitType", &body.unit_type)?,
        stock: stock_count(body.stock)?,
        delivery_range_km: delivery_range(body.delivery_range_km)?,
        image_url: optional_text(body.image_url),
        description: optional_text(body.description),
    })
}

pub(super) fn validate_patch(body: UpdateProductRequest) -> Result<ProductPatch, String> {
    let patch = ProductPatch {
        name: body.name.map(|v| required_text("name", &v)).transpose()?,
        category: body
            .category
            .map(|v| required_text("category", &v))
            .transpose()?,
        unit_price: body.unit_price.map(positive_price).transpose()?,
        unit_type: body
            .unit_type
            .map(|v| required_text("unitType", &v))
            .transpose()?,
        stock: body.stock.map(stock_count).transpose()?,
        delivery_range_km: body.delivery_range_km.map(delivery_range).transpose()?,
        image_url: optional_text(body.image_url),
        description: optional_text(body.description),
    };

    if patch.is_empty() {
        return Err("request must update at least one field".to_string());
    }
    Ok(patch)
}

pub(super) fn validate_supplier(
    supplier_id: String,
    body: UpsertSupplierRequest,
) -> Result<NewSupplier, String> {
    let name = required_text("name", &body.name)?;
    let location = match (body.latitude, body.longitude) {
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng);
            if !point.is_valid() {
                return Err(
                    "latitude must be within [-90, 90] and longitude within [-180, 180]"
                        .to_string(),
                );
            }
            Some(point)
        }
        (None, None) => None,
        _ => return Err("latitude and longitude must be provided together".to_string()),
    };

    Ok(NewSupplier {
        id: supplier_id,
        name,
        location,
    })
}

fn json_body<T>(req_id: &str, body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(inner)| inner)
        .map_err(|rejection| ApiError::new(req_id, "bad_request", rejection.body_text()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// PUT /api/v1/suppliers/{supplier_id}: register or update a supplier.
pub(super) async fn upsert_supplier(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(supplier_id): Path<String>,
    body: Result<Json<UpsertSupplierRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SupplierItem>>, ApiError> {
    let rid = &req_id.0;
    let supplier = validate_supplier(supplier_id, json_body(rid, body)?)
        .map_err(|message| ApiError::validation(rid, message))?;

    let row = vendorbuddy_db::upsert_supplier(&state.pool, &supplier)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e, "supplier"))?;

    tracing::info!(supplier_id = %row.id, located = supplier.location.is_some(), "supplier upserted");

    Ok(Json(ApiResponse {
        data: SupplierItem {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/suppliers/{supplier_id}/products: create a listing.
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(supplier_id): Path<String>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let rid = &req_id.0;
    let product = validate_new_product(json_body(rid, body)?)
        .map_err(|message| ApiError::validation(rid, message))?;

    let row = vendorbuddy_db::create_product(&state.pool, &supplier_id, &product)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e, "supplier"))?;

    tracing::info!(supplier_id = %supplier_id, product_id = %row.id, "product created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProductItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/suppliers/{supplier_id}/products/{id}: sparse update.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((supplier_id, id)): Path<(String, String)>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;
    let patch = validate_patch(json_body(rid, body)?)
        .map_err(|message| ApiError::validation(rid, message))?;

    let row = vendorbuddy_db::update_product(&state.pool, &supplier_id, &id, &patch)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e, "product"))?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/suppliers/{supplier_id}/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((supplier_id, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DeletedProduct>>, ApiError> {
    vendorbuddy_db::delete_product(&state.pool, &supplier_id, &id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e, "product"))?;

    tracing::info!(supplier_id = %supplier_id, product_id = %id, "product deleted");

    Ok(Json(ApiResponse {
        data: DeletedProduct { id, deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}
