//! Pricing projection
//!
//! Projects the price the card displays from the resolved variant, falling
//! back to the base product fields when no variant matches. Pure data out;
//! display formatting is [`Money`]'s concern.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::catalog::{Product, Variant};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PriceView {
    pub price: Money,
    /// Kept only when strictly above the current price.
    pub compare_at: Option<Money>,
    /// `round(100 * (compare_at - price) / compare_at)`; absent unless a
    /// strikethrough price applies (never zero, never negative).
    pub discount_percentage: Option<u32>,
}

impl PriceView {
    pub fn project(product: &Product, variant: Option<&Variant>) -> Self {
        let (price, compare_at) = match variant {
            Some(v) => (v.price.clone(), v.compare_at_price.clone()),
            None => (product.price.clone(), product.compare_at_price.clone()),
        };
        let compare_at = compare_at.filter(|c| c.exceeds(&price));
        let discount_percentage = compare_at
            .as_ref()
            .and_then(|c| discount_percentage(&price, c));
        Self { price, compare_at, discount_percentage }
    }
}

/// Saved percentage relative to the compare-at price, rounded half away
/// from zero. `None` unless `compare_at` strictly exceeds `price`.
pub fn discount_percentage(price: &Money, compare_at: &Money) -> Option<u32> {
    if !compare_at.exceeds(price) {
        return None;
    }
    let saved = (compare_at.amount() - price.amount()) * Decimal::ONE_HUNDRED / compare_at.amount();
    saved
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .filter(|pct| *pct > 0)
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Applying the rounded discount to the compare-at price lands back
        /// on the current price within rounding tolerance (half a percent
        /// of the compare-at price).
        #[test]
        fn discount_inverts_within_rounding(price_cents in 1i64..1_000_000, compare_cents in 1i64..1_000_000) {
            let price = Money::usd(Decimal::new(price_cents, 2));
            let compare = Money::usd(Decimal::new(compare_cents, 2));
            match discount_percentage(&price, &compare) {
                Some(pct) => {
                    prop_assert!(compare_cents > price_cents);
                    prop_assert!(pct >= 1 && pct <= 100);
                    let implied = compare.amount() * (Decimal::ONE_HUNDRED - Decimal::from(pct)) / Decimal::ONE_HUNDRED;
                    let tolerance = compare.amount() * Decimal::new(5, 3); // 0.5%
                    prop_assert!((implied - price.amount()).abs() <= tolerance);
                }
                None => {
                    // Either not a markdown at all, or one that rounds below 1%.
                    let saved = (compare.amount() - price.amount()) * Decimal::ONE_HUNDRED;
                    prop_assert!(compare_cents <= price_cents || saved / compare.amount() < Decimal::new(5, 1));
                }
            }
        }
    }
}
