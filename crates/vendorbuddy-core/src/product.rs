use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A catalog listing offered by a supplier.
///
/// Owned by the catalog store; search treats it as read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Opaque identifier assigned by the catalog store.
    pub id: String,
    pub name: String,
    pub category: String,
    /// Price per `unit_type`; always positive for stored listings.
    pub unit_price: f64,
    /// Selling unit, e.g. `"kg"`, `"litre"`, `"piece"`.
    pub unit_type: String,
    pub stock: u32,
    /// Radius the supplier is willing to deliver within, in kilometres.
    pub delivery_range_km: u32,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub supplier_id: Option<String>,
    /// `None` when the supplier has no registered coordinates.
    pub supplier_location: Option<GeoPoint>,
    pub rating: f64,
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}
