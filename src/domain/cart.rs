//! Cart Aggregate
//!
//! The cart capability the card engine hands off to once the eligibility
//! gate says yes: add a line item (with the selected-option snapshot),
//! report the total item count. One cart per storefront session.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::events::CartEvent;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    session_id: String,
    items: Vec<LineItem>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<CartEvent>,
}

#[derive(Clone, Debug)]
pub struct LineItem {
    pub id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub title: String,
    /// Option assignment at the moment of adding, kept for display and
    /// order creation downstream.
    pub selected_options: BTreeMap<String, String>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

impl Cart {
    pub fn new(session_id: impl Into<String>, currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            items: vec![],
            subtotal: Money::zero(currency),
            currency: currency.to_string(),
            created_at: now,
            updated_at: now,
            events: vec![],
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn line_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Total units across all lines; what the header badge shows.
    pub fn total_item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Lines are keyed by (product, variant); adding the same combination
    /// again merges quantities.
    pub fn add_line_item(&mut self, item: LineItem) {
        self.raise_event(CartEvent::LineItemAdded {
            cart_id: self.id.clone(),
            product_id: item.product_id.clone(),
            variant_id: item.variant_id.clone(),
            quantity: item.quantity,
        });
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id && i.variant_id == item.variant_id)
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
        self.recalculate();
    }

    pub fn update_quantity(
        &mut self,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: u32,
    ) -> Result<(), CartError> {
        let position = self
            .items
            .iter()
            .position(|i| i.product_id == product_id && i.variant_id.as_deref() == variant_id)
            .ok_or(CartError::ItemNotFound)?;
        if quantity == 0 {
            self.items.remove(position);
        } else {
            self.items[position].quantity = quantity;
        }
        self.raise_event(CartEvent::QuantityUpdated {
            cart_id: self.id.clone(),
            product_id: product_id.to_string(),
            quantity,
        });
        self.recalculate();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str, variant_id: Option<&str>) -> Result<(), CartError> {
        let before = self.items.len();
        self.items
            .retain(|i| !(i.product_id == product_id && i.variant_id.as_deref() == variant_id));
        if self.items.len() == before {
            return Err(CartError::ItemNotFound);
        }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.raise_event(CartEvent::Cleared { cart_id: self.id.clone() });
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.subtotal = self
            .items
            .iter()
            .fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc));
        self.updated_at = Utc::now();
    }

    pub fn take_events(&mut self) -> Vec<CartEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(e); }
}

#[derive(Debug, Clone)] pub enum CartError { ItemNotFound }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Item not found") }
}
