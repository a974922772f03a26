pub mod app_config;
pub mod config;
pub mod geo;
pub mod product;
pub mod search;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{estimate_delivery_days, haversine_km, GeoPoint};
pub use product::Product;
pub use search::{
    search, AnnotatedProduct, SearchError, SearchFilters, SearchResult, SortKey,
    DEFAULT_PAGE_SIZE,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
