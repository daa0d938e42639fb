//! `stock` command: combinations and inventory totals for one product.

use std::collections::BTreeMap;

use podshop_backend::{
    find_product_by_slug, load_combinations, load_inventory, BackendClient, BackendError, Query,
};
use podshop_core::{ConfigError, InventoryRow, Product};
use thiserror::Error;

/// Route pattern used when no slug is given.
const DEFAULT_ROUTE_PATTERN: &str = "*cap*";

/// Failures of the lookup commands, each with its process exit code.
#[derive(Debug, Error)]
pub(crate) enum LookupError {
    #[error("configuration: {0}")]
    Config(#[source] ConfigError),

    #[error("product not found: {0}")]
    NotFound(String),

    #[error("inventory query failed: {0}")]
    Inventory(#[source] BackendError),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl LookupError {
    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            LookupError::Config(_) => 2,
            LookupError::NotFound(_) => 3,
            LookupError::Inventory(_) => 4,
            LookupError::Unexpected(_) => 5,
        }
    }
}

/// Totals over a product's inventory rows.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct StockReport {
    pub rows: usize,
    pub total_quantity: u64,
    /// Keyed by `inventory.status`; rows without one count as `unknown`.
    pub by_status: BTreeMap<String, u64>,
}

impl StockReport {
    pub(crate) fn from_rows(rows: &[InventoryRow]) -> Self {
        let mut report = StockReport {
            rows: rows.len(),
            ..StockReport::default()
        };
        for row in rows {
            let quantity = u64::try_from(row.quantity).unwrap_or(0);
            report.total_quantity = report.total_quantity.saturating_add(quantity);
            let status = row.status.clone().unwrap_or_else(|| "unknown".to_string());
            *report.by_status.entry(status).or_default() += quantity;
        }
        report
    }
}

/// Resolves the product, then prints its combinations and inventory totals.
///
/// # Errors
///
/// - [`LookupError::NotFound`] when no product matches.
/// - [`LookupError::Inventory`] when combinations or inventory cannot be read.
/// - [`LookupError::Unexpected`] when the product lookup itself fails.
pub(crate) async fn run_stock(
    client: &BackendClient,
    slug: Option<&str>,
) -> Result<(), LookupError> {
    let product = match slug {
        Some(slug) => find_product_by_slug(client, slug)
            .await
            .map_err(|e| LookupError::Unexpected(e.into()))?
            .ok_or_else(|| LookupError::NotFound(slug.to_string()))?,
        None => first_cap_product(client).await?,
    };

    let combinations = load_combinations(client, product.id)
        .await
        .map_err(LookupError::Inventory)?;
    let combination_ids: Vec<i64> = combinations.iter().map(|c| c.id).collect();
    let rows = load_inventory(client, &combination_ids, None)
        .await
        .map_err(LookupError::Inventory)?;

    println!(
        "product {} \"{}\" (route {})",
        product.id,
        product.name,
        product.route.as_deref().unwrap_or("-")
    );
    println!("combinations: {}", combinations.len());
    for combination in &combinations {
        let quantity: i64 = rows
            .iter()
            .filter(|r| r.combination_id == combination.id)
            .map(|r| r.quantity.max(0))
            .sum();
        println!(
            "  #{:<6} variants {:?} quantity {quantity}",
            combination.id, combination.variants
        );
    }

    let report = StockReport::from_rows(&rows);
    println!("inventory rows: {}", report.rows);
    println!("total quantity: {}", report.total_quantity);
    for (status, quantity) in &report.by_status {
        println!("  {status}: {quantity}");
    }

    tracing::debug!(product_id = product.id, rows = report.rows, "stock report printed");
    Ok(())
}

async fn first_cap_product(client: &BackendClient) -> Result<Product, LookupError> {
    let rows: Vec<Product> = client
        .select(
            "products",
            &Query::new()
                .select("id,name,starting_price,image_url,route,slug")
                .ilike("route", DEFAULT_ROUTE_PATTERN)
                .order("id", true)
                .limit(1),
        )
        .await
        .map_err(|e| LookupError::Unexpected(e.into()))?;

    rows.into_iter()
        .next()
        .ok_or_else(|| LookupError::NotFound(format!("route like {DEFAULT_ROUTE_PATTERN}")))
}
