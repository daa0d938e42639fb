//! The user's on-page variant selection.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{VariantGroup, VariantOption};

/// The option chosen for one variant group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedVariant {
    /// `product_variant_values.id`.
    pub value_id: i64,
    pub price: Decimal,
}

impl From<&VariantOption> for SelectedVariant {
    fn from(option: &VariantOption) -> Self {
        Self {
            value_id: option.id,
            price: option.price,
        }
    }
}

/// Selected options keyed by variant-group id. At most one option per group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    entries: BTreeMap<i64, SelectedVariant>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `option` for `group_id`, replacing any previous choice.
    pub fn select(&mut self, group_id: i64, option: &VariantOption) {
        self.entries.insert(group_id, option.into());
    }

    #[must_use]
    pub fn get(&self, group_id: i64) -> Option<&SelectedVariant> {
        self.entries.get(&group_id)
    }

    #[must_use]
    pub fn contains_group(&self, group_id: i64) -> bool {
        self.entries.contains_key(&group_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &SelectedVariant)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// True when every group has a selected option.
    #[must_use]
    pub fn is_complete(&self, groups: &[VariantGroup]) -> bool {
        groups.iter().all(|g| self.contains_group(g.id))
    }

    /// Selected product-variant-value ids, sorted ascending.
    #[must_use]
    pub fn variant_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.entries.values().map(|v| v.value_id).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn variant_id_set(&self) -> BTreeSet<i64> {
        self.entries.values().map(|v| v.value_id).collect()
    }

    /// Sum of the selected options' price deltas.
    #[must_use]
    pub fn price_delta(&self) -> Decimal {
        self.entries.values().map(|v| v.price).sum()
    }
}

/// Rebuilds a selection from the product-variant-value ids stored on a cart
/// line. Ids that no longer belong to any loaded group are ignored; if two
/// ids land in the same group the first one is kept.
#[must_use]
pub fn restore_selection(cart_variant_ids: &[i64], groups: &[VariantGroup]) -> Selection {
    let mut selection = Selection::new();
    for id in cart_variant_ids {
        let found = groups
            .iter()
            .find_map(|g| g.option(*id).map(|option| (g.id, option)));
        if let Some((group_id, option)) = found {
            if !selection.contains_group(group_id) {
                selection.select(group_id, option);
            }
        }
    }
    selection
}

/// Fills in the default option for every group that has no selection yet.
///
/// Groups already present (e.g. restored from a cart line being edited) are
/// left untouched, so restore-then-fill never clobbers the restored choice.
pub fn fill_defaults(selection: &mut Selection, groups: &[VariantGroup]) {
    for group in groups {
        if selection.contains_group(group.id) {
            continue;
        }
        if let Some(option) = group.default_option() {
            selection.select(group.id, option);
        }
    }
}
