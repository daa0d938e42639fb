//! Stock for the current selection.

use podshop_core::{
    aggregate_inventory, matching_combinations, Selection, StockLevel, StockPolicy, VariantGroup,
    IN_STOCK,
};

use crate::catalog::{load_combinations, load_inventory};
use crate::client::BackendClient;
use crate::error::BackendError;

/// Resolves stock for `selection`.
///
/// - Incomplete selection: `None`; stock is unknown, not zero.
/// - No matching combination: `Some(StockLevel::zero())`.
/// - Backend failure: `None`, logged at warn.
///
/// Under [`StockPolicy::Exact`] only `in_stock` rows are read; under
/// [`StockPolicy::Subset`] every matching row is summed regardless of status.
pub async fn resolve_stock(
    client: &BackendClient,
    product_id: i64,
    selection: &Selection,
    groups: &[VariantGroup],
    policy: StockPolicy,
) -> Option<StockLevel> {
    if !selection.is_complete(groups) {
        return None;
    }

    match fetch_stock(client, product_id, selection, policy).await {
        Ok(level) => Some(level),
        Err(e) => {
            tracing::warn!(product_id, %policy, error = %e, "stock lookup failed");
            None
        }
    }
}

async fn fetch_stock(
    client: &BackendClient,
    product_id: i64,
    selection: &Selection,
    policy: StockPolicy,
) -> Result<StockLevel, BackendError> {
    let combinations = load_combinations(client, product_id).await?;
    let selected = selection.variant_ids();
    let matched: Vec<i64> = matching_combinations(policy, &selected, &combinations)
        .into_iter()
        .map(|c| c.id)
        .collect();

    if matched.is_empty() {
        tracing::debug!(product_id, ?selected, "no combination matches selection");
        return Ok(StockLevel::zero());
    }

    let level = match policy {
        StockPolicy::Exact => {
            let rows = load_inventory(client, &matched[..1], Some(IN_STOCK)).await?;
            rows.first().map(StockLevel::from_row).unwrap_or_default()
        }
        StockPolicy::Subset => {
            let rows = load_inventory(client, &matched, None).await?;
            aggregate_inventory(&rows)
        }
    };
    Ok(level)
}
