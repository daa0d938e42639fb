//! Matching a selection against precomputed combinations and reading stock.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{InventoryRow, ProductVariantCombination};
use crate::CoreError;

/// `inventory.status` value for rows that count toward exact-match stock.
pub const IN_STOCK: &str = "in_stock";

/// How a selection is matched to `product_variant_combinations` rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    /// The combination must list exactly the selected ids.
    #[default]
    Exact,
    /// Every id the combination lists must be selected; the combination may
    /// constrain fewer groups than exist. Matching rows are summed.
    Subset,
}

impl std::fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockPolicy::Exact => write!(f, "exact"),
            StockPolicy::Subset => write!(f, "subset"),
        }
    }
}

impl std::str::FromStr for StockPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(StockPolicy::Exact),
            "subset" => Ok(StockPolicy::Subset),
            other => Err(CoreError::UnknownStockPolicy(other.to_string())),
        }
    }
}

/// Known stock for a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub quantity: u64,
    pub low_stock_limit: Option<u64>,
}

impl StockLevel {
    /// Stock reported when no combination matches.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_row(row: &InventoryRow) -> Self {
        Self {
            quantity: clamp_quantity(row.quantity),
            low_stock_limit: row.low_stock_limit.map(clamp_quantity),
        }
    }

    #[must_use]
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    /// In stock but at or under the low-stock threshold.
    #[must_use]
    pub fn is_low(&self) -> bool {
        match self.low_stock_limit {
            Some(limit) => self.quantity > 0 && self.quantity <= limit,
            None => false,
        }
    }
}

fn clamp_quantity(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

/// Returns the combinations that match `selected_ids` under `policy`.
///
/// `selected_ids` need not be sorted.
#[must_use]
pub fn matching_combinations<'a>(
    policy: StockPolicy,
    selected_ids: &[i64],
    combinations: &'a [ProductVariantCombination],
) -> Vec<&'a ProductVariantCombination> {
    let mut sorted_selected = selected_ids.to_vec();
    sorted_selected.sort_unstable();

    match policy {
        StockPolicy::Exact => combinations
            .iter()
            .filter(|c| {
                let mut ids = c.variants.clone();
                ids.sort_unstable();
                ids == sorted_selected
            })
            .collect(),
        StockPolicy::Subset => {
            let selected: BTreeSet<i64> = sorted_selected.into_iter().collect();
            combinations
                .iter()
                .filter(|c| c.variants.iter().all(|id| selected.contains(id)))
                .collect()
        }
    }
}

/// Sums clamped quantities across `rows`; the first row's threshold
/// represents the group. No rows means zero stock.
#[must_use]
pub fn aggregate_inventory(rows: &[InventoryRow]) -> StockLevel {
    let quantity = rows
        .iter()
        .map(|r| clamp_quantity(r.quantity))
        .fold(0u64, u64::saturating_add);
    let low_stock_limit = rows
        .first()
        .and_then(|r| r.low_stock_limit)
        .map(clamp_quantity);
    StockLevel {
        quantity,
        low_stock_limit,
    }
}
