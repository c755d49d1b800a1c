//! Per-card option selection state
//!
//! Each product card instance owns one [`SelectionState`]; nothing here is
//! shared or global. Derived values (matching variant, pricing,
//! availability) are pure functions of `(Product, SelectionState)` and are
//! recomputed after every update.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::catalog::Product;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState(BTreeMap<String, String>);

impl SelectionState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seed from the first in-stock variant's assignment so a concrete
    /// price shows before the user touches anything. Products without a
    /// sellable variant start empty and fall back to base pricing.
    pub fn seeded(product: &Product) -> Self {
        match product.first_in_stock_variant() {
            Some(variant) => Self(variant.options.clone()),
            None => Self::empty(),
        }
    }

    /// Set one option value; selecting again overwrites. Entries are only
    /// removed by [`SelectionState::reset`].
    pub fn select(&mut self, option: impl Into<String>, value: impl Into<String>) {
        self.0.insert(option.into(), value.into());
    }

    pub fn reset(&mut self) {
        self.0.clear();
    }

    pub fn get(&self, option: &str) -> Option<&str> {
        self.0.get(option).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Owned copy of the assignment, e.g. for cart line snapshots.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every declared option has a chosen value.
    pub fn is_complete_for(&self, product: &Product) -> bool {
        product.options.iter().all(|o| self.0.contains_key(&o.name))
    }
}

impl From<BTreeMap<String, String>> for SelectionState {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }
}
