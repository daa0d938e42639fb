//! Variant catalog shaping.
//!
//! Product pages receive a flat list of `product_variant_values` rows joined
//! to their value and group. [`group_variant_rows`] turns that list into the
//! per-group option lists the purchasing UI renders.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ProductVariantValueRow;

/// How a variant group is presented for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Radio,
    Color,
}

impl InputType {
    /// Maps the raw `input_type` column; unknown or missing values are radio.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("color") => InputType::Color,
            _ => InputType::Radio,
        }
    }
}

/// One purchasable option within a [`VariantGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    /// `product_variant_values.id`, the id stored on cart variants and
    /// listed in combinations.
    pub id: i64,
    /// Display name from `variant_values.value_name`, e.g. `"Black"`.
    pub name: String,
    /// `variant_values.id`.
    pub value_id: i64,
    /// Price delta over the product's starting price.
    pub price: Decimal,
    pub is_default: bool,
}

/// A named axis of customization (e.g. `COLOR`) with its options for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantGroup {
    pub id: i64,
    pub name: String,
    pub input_type: InputType,
    pub values: Vec<VariantOption>,
}

impl VariantGroup {
    /// Option flagged `is_default`, else the first option.
    #[must_use]
    pub fn default_option(&self) -> Option<&VariantOption> {
        self.values
            .iter()
            .find(|v| v.is_default)
            .or_else(|| self.values.first())
    }

    #[must_use]
    pub fn option(&self, product_variant_value_id: i64) -> Option<&VariantOption> {
        self.values
            .iter()
            .find(|v| v.id == product_variant_value_id)
    }
}

/// Buckets joined variant rows into groups.
///
/// - Rows are deduplicated by product-variant-value id; the first occurrence wins.
/// - Rows missing their embedded value or group are skipped.
/// - Groups keep first-seen order, as do the options inside them.
/// - Groups with a blank name or no options are dropped, so every returned
///   group id is unique and non-empty.
#[must_use]
pub fn group_variant_rows(rows: &[ProductVariantValueRow]) -> Vec<VariantGroup> {
    let mut seen_values: HashSet<i64> = HashSet::new();
    let mut groups: Vec<VariantGroup> = Vec::new();

    for row in rows {
        if !seen_values.insert(row.id) {
            continue;
        }
        let Some(value) = row.variant_values.as_ref() else {
            continue;
        };
        let Some(group_row) = value.variant_groups.as_ref() else {
            continue;
        };

        let option = VariantOption {
            id: row.id,
            name: value.value_name.clone(),
            value_id: value.id,
            price: row.price.unwrap_or(Decimal::ZERO),
            is_default: row.is_default.unwrap_or(false),
        };

        if let Some(group) = groups.iter_mut().find(|g| g.id == group_row.id) {
            group.values.push(option);
        } else {
            groups.push(VariantGroup {
                id: group_row.id,
                name: group_row
                    .name
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
                input_type: InputType::from_raw(group_row.input_type.as_deref()),
                values: vec![option],
            });
        }
    }

    groups.retain(|g| !g.name.is_empty() && !g.values.is_empty());
    groups
}

/// Returns the last non-empty segment of a URL path, ignoring any query or
/// fragment. `"/products/trucker-cap/"` yields `Some("trucker-cap")`.
#[must_use]
pub fn slug_from_path(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit('/').find(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
