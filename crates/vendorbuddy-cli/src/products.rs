//! `products` command handlers: one-off backfill and catalog search.

use clap::Subcommand;
use vendorbuddy_core::{AppConfig, GeoPoint, SearchFilters, SearchResult, SortKey};

/// Sub-commands available under `products`.
#[derive(Debug, Subcommand)]
pub enum ProductsCommands {
    /// Copy supplier coordinates onto listings that lack them
    BackfillLocations,
    /// Search the catalog the same way `GET /api/v1/products` does
    Search(SearchArgs),
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    /// Case-insensitive substring of the product name
    #[arg(long)]
    pub search: Option<String>,

    /// Exact category, case-insensitive
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub min_price: Option<f64>,

    #[arg(long)]
    pub max_price: Option<f64>,

    /// Caller latitude; requires --lng
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Caller longitude; requires --lat
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Only keep listings within this many kilometres of the caller
    #[arg(long)]
    pub max_distance_km: Option<f64>,

    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// Page size; defaults to VENDORBUDDY_DEFAULT_PAGE_SIZE
    #[arg(long)]
    pub size: Option<usize>,

    /// price, name, distance, or a combined key such as price_desc
    #[arg(long, default_value = "name")]
    pub sort_by: String,

    /// asc or desc
    #[arg(long, default_value = "asc")]
    pub sort_dir: String,

    /// Print the full result as pretty JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    fn into_filters(self, config: &AppConfig) -> anyhow::Result<SearchFilters> {
        let caller_location = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                let point = GeoPoint::new(lat, lng);
                if !point.is_valid() {
                    anyhow::bail!("--lat must be within [-90, 90] and --lng within [-180, 180]");
                }
                Some(point)
            }
            _ => None,
        };

        Ok(SearchFilters {
            search_term: self.search,
            category: self.category,
            min_price: self.min_price,
            max_price: self.max_price,
            caller_location,
            max_distance_km: self.max_distance_km,
            page: self.page,
            page_size: self
                .size
                .map_or(config.default_page_size, |s| s.min(config.max_page_size)),
            sort: SortKey::from_sort_params(
                Some(self.sort_by.as_str()),
                Some(self.sort_dir.as_str()),
            ),
        })
    }
}

pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: ProductsCommands,
) -> anyhow::Result<()> {
    match command {
        ProductsCommands::BackfillLocations => {
            let updated = vendorbuddy_db::backfill_supplier_locations(pool).await?;
            println!("backfilled supplier location on {updated} product(s)");
        }
        ProductsCommands::Search(args) => {
            let as_json = args.json;
            let filters = args.into_filters(config)?;
            let catalog: Vec<_> = vendorbuddy_db::fetch_all_products(pool)
                .await?
                .into_iter()
                .map(vendorbuddy_db::ProductRow::into_product)
                .collect();
            tracing::debug!(catalog = catalog.len(), sort = %filters.sort, "running search");

            let result = vendorbuddy_core::search(&catalog, &filters)?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_table(&result);
            }
        }
    }
    Ok(())
}

fn print_table(result: &SearchResult) {
    println!(
        "page {} of {} ({} matching)",
        result.page.saturating_add(1),
        result.total_pages.max(1),
        result.total_match_count
    );
    let header = format!(
        "{:<38}{:<28}{:<16}{:>10}{:>12}{:>6}",
        "ID", "NAME", "CATEGORY", "PRICE", "DISTANCE", "DAYS"
    );
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    for item in &result.products {
        let product = &item.product;
        let distance = item
            .distance_km
            .map_or_else(|| "-".to_string(), |d| format!("{d:.1} km"));
        let days = item
            .estimated_delivery_days
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        println!(
            "{:<38}{:<28}{:<16}{:>10.2}{:>12}{:>6}",
            product.id,
            truncate(&product.name, 27),
            truncate(&product.category, 15),
            product.unit_price,
            distance,
            days
        );
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_table_handles_last_representable_page() {
        let filters = SearchFilters {
            page: usize::MAX,
            ..SearchFilters::default()
        };
        let result = vendorbuddy_core::search(&[], &filters).expect("search");
        assert!(result.products.is_empty());
        assert_eq!(result.total_pages, 0);

        print_table(&result);
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("Basmati", 10), "Basmati");
        assert_eq!(truncate("Basmati Rice", 8), "Basmati~");
    }
}
