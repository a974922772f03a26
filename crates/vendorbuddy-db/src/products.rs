//! Database operations for the `products` table: the catalog store behind
//! product search.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vendorbuddy_core::{GeoPoint, Product};

use crate::suppliers::get_supplier;
use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, name, category, unit_price, unit_type, stock, \
     delivery_range_km, image_url, description, supplier_id, supplier_lat, supplier_lng, \
     rating, review_count, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit_price: f64,
    pub unit_type: String,
    /// `CHECK (stock >= 0)` in the schema.
    pub stock: i32,
    pub delivery_range_km: i32,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub supplier_id: Option<String>,
    pub supplier_lat: Option<f64>,
    pub supplier_lng: Option<f64>,
    pub rating: f64,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// Converts the row into the domain type used by search.
    ///
    /// The supplier location is kept only when both coordinates are present;
    /// a half-populated pair is treated as no location.
    #[must_use]
    pub fn into_product(self) -> Product {
        let supplier_location = match (self.supplier_lat, self.supplier_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };

        Product {
            id: self.id,
            name: self.name,
            category: self.category,
            unit_price: self.unit_price,
            unit_type: self.unit_type,
            stock: u32::try_from(self.stock).unwrap_or(0),
            delivery_range_km: u32::try_from(self.delivery_range_km).unwrap_or(0),
            image_url: self.image_url,
            description: self.description,
            supplier_id: self.supplier_id,
            supplier_location,
            rating: self.rating,
            review_count: u32::try_from(self.review_count).unwrap_or(0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input record for a new listing. The id and supplier location are filled
/// in by [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub unit_price: f64,
    pub unit_type: String,
    pub stock: u32,
    pub delivery_range_km: u32,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<f64>,
    pub unit_type: Option<String>,
    pub stock: Option<u32>,
    pub delivery_range_km: Option<u32>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl ProductPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.unit_price.is_none()
            && self.unit_type.is_none()
            && self.stock.is_none()
            && self.delivery_range_km.is_none()
            && self.image_url.is_none()
            && self.description.is_none()
    }
}

fn to_i32(value: u32, column: &'static str) -> Result<i32, DbError> {
    i32::try_from(value).map_err(|_| DbError::OutOfRange(column))
}

fn to_i32_opt(value: Option<u32>, column: &'static str) -> Result<Option<i32>, DbError> {
    value.map(|v| to_i32(v, column)).transpose()
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns the full catalog in insertion order (`created_at`, then `id`).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_all_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single product by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn fetch_product_by_id(pool: &PgPool, id: &str) -> Result<ProductRow, DbError> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns every listing owned by `supplier_id`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_supplier(
    pool: &PgPool,
    supplier_id: &str,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE supplier_id = $1 ORDER BY created_at, id"
    ))
    .bind(supplier_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a listing for `supplier_id` under a fresh UUID.
///
/// The supplier's registered coordinates, if any, are copied onto the
/// listing so it can take part in distance search.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the supplier is not registered,
/// [`DbError::OutOfRange`] if a count does not fit the column, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(
    pool: &PgPool,
    supplier_id: &str,
    product: &NewProduct,
) -> Result<ProductRow, DbError> {
    let supplier = get_supplier(pool, supplier_id)
        .await?
        .ok_or(DbError::NotFound)?;
    let location = supplier.location();

    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
             (id, name, category, unit_price, unit_type, stock, delivery_range_km, \
              image_url, description, supplier_id, supplier_lat, supplier_lng) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.unit_price)
    .bind(&product.unit_type)
    .bind(to_i32(product.stock, "stock")?)
    .bind(to_i32(product.delivery_range_km, "delivery_range_km")?)
    .bind(&product.image_url)
    .bind(&product.description)
    .bind(supplier_id)
    .bind(location.map(|p| p.lat))
    .bind(location.map(|p| p.lng))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies `patch` to a listing owned by `supplier_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no listing with `id` belongs to the
/// supplier, [`DbError::OutOfRange`] if a count does not fit the column, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    supplier_id: &str,
    id: &str,
    patch: &ProductPatch,
) -> Result<ProductRow, DbError> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products SET \
             name              = COALESCE($3, name), \
             category          = COALESCE($4, category), \
             unit_price        = COALESCE($5, unit_price), \
             unit_type         = COALESCE($6, unit_type), \
             stock             = COALESCE($7, stock), \
             delivery_range_km = COALESCE($8, delivery_range_km), \
             image_url         = COALESCE($9, image_url), \
             description       = COALESCE($10, description), \
             updated_at        = NOW() \
         WHERE id = $1 AND supplier_id = $2 \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(supplier_id)
    .bind(&patch.name)
    .bind(&patch.category)
    .bind(patch.unit_price)
    .bind(&patch.unit_type)
    .bind(to_i32_opt(patch.stock, "stock")?)
    .bind(to_i32_opt(patch.delivery_range_km, "delivery_range_km")?)
    .bind(&patch.image_url)
    .bind(&patch.description)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Deletes a listing owned by `supplier_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if nothing was deleted, or [`DbError::Sqlx`]
/// if the delete fails.
pub async fn delete_product(pool: &PgPool, supplier_id: &str, id: &str) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND supplier_id = $2")
        .bind(id)
        .bind(supplier_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Copies supplier coordinates onto every listing that lacks them.
///
/// Listings whose supplier has no coordinates are left untouched. Returns the
/// number of listings updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn backfill_supplier_locations(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products p SET \
             supplier_lat = s.latitude, \
             supplier_lng = s.longitude, \
             updated_at   = NOW() \
         FROM suppliers s \
         WHERE s.id = p.supplier_id \
           AND (p.supplier_lat IS NULL OR p.supplier_lng IS NULL) \
           AND s.latitude IS NOT NULL \
           AND s.longitude IS NOT NULL",
    )
    .execute(pool)
    .await?;

    let updated = result.rows_affected();
    tracing::debug!(updated, "backfilled product supplier locations");
    Ok(updated)
}
