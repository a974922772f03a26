//! Database operations for the `suppliers` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vendorbuddy_core::GeoPoint;

use crate::DbError;

/// A row from the `suppliers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SupplierRow {
    pub id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupplierRow {
    /// Registered coordinates, present only when both halves are set.
    #[must_use]
    pub fn location(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.latitude?, self.longitude?))
    }
}

/// Input record for registering or updating a supplier.
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub id: String,
    pub name: String,
    pub location: Option<GeoPoint>,
}

/// Inserts a supplier or updates its name and coordinates in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_supplier(pool: &PgPool, supplier: &NewSupplier) -> Result<SupplierRow, DbError> {
    let row = sqlx::query_as::<_, SupplierRow>(
        "INSERT INTO suppliers (id, name, latitude, longitude) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (id) DO UPDATE SET \
             name       = EXCLUDED.name, \
             latitude   = EXCLUDED.latitude, \
             longitude  = EXCLUDED.longitude, \
             updated_at = NOW() \
         RETURNING id, name, latitude, longitude, created_at, updated_at",
    )
    .bind(&supplier.id)
    .bind(&supplier.name)
    .bind(supplier.location.map(|p| p.lat))
    .bind(supplier.location.map(|p| p.lng))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the supplier with `id`, or `None` if it is not registered.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_supplier(pool: &PgPool, id: &str) -> Result<Option<SupplierRow>, DbError> {
    let row = sqlx::query_as::<_, SupplierRow>(
        "SELECT id, name, latitude, longitude, created_at, updated_at \
         FROM suppliers \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
