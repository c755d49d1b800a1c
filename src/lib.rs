//! Driftwell Storefront Core
//!
//! Headless engine behind the storefront's product cards.
//!
//! ## Features
//! - Variant resolution from per-card option selections
//! - Option-value availability for dimming dead-end choices
//! - Price / compare-at / discount projection with base-price fallback
//! - Add-to-cart eligibility gating
//! - Session carts with merged line items and total item count
//!
//! The engine is pure and synchronous: every derived value is a function
//! of `(Product, SelectionState)` and recomputing is cheap enough to do on
//! each interaction. Catalog data is a JSON snapshot loaded by the caller;
//! the HTTP surface in `main.rs` is a thin shell over this crate.

use thiserror::Error;

pub mod domain;

pub use domain::card::{can_add_to_cart, is_option_value_available, resolve_variant, CardView};
pub use domain::cart::{Cart, CartError, LineItem};
pub use domain::catalog::{Catalog, IntegrityFault, OptionDefinition, Product, ProductImage, Variant};
pub use domain::pricing::PriceView;
pub use domain::selection::SelectionState;
pub use domain::value_objects::{Money, Sku};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Cart not found")]
    CartNotFound,

    #[error("Selection does not resolve to a purchasable variant")]
    NotAddable,

    #[error("Invalid quantity")]
    InvalidQuantity,

    #[error("Catalog snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
