//! Headless product card engine
//!
//! The resolution pipeline behind every product card: given a catalog
//! record and the card's current [`SelectionState`], resolve the matching
//! variant, work out which option values are still worth offering, project
//! the price and decide whether add-to-cart is allowed. Every function
//! here is pure and total: malformed data degrades to a deterministic
//! fallback, never a panic.

use serde::Serialize;

use crate::domain::catalog::{Product, Variant};
use crate::domain::pricing::PriceView;
use crate::domain::selection::SelectionState;

/// Resolve the unique variant matching a complete selection.
///
/// A variant matches only when every declared option has a selected value
/// equal to the variant's assignment. Partial selections resolve to
/// `None`, which pushes the card onto base pricing and keeps add-to-cart
/// disabled until the user finishes choosing. Products without options
/// have no variant layer and always resolve to `None`.
///
/// Two variants with the same assignment violate the catalog's uniqueness
/// invariant; the first in catalog order wins and the collision is logged.
pub fn resolve_variant<'a>(product: &'a Product, selection: &SelectionState) -> Option<&'a Variant> {
    if !product.has_options() || !selection.is_complete_for(product) {
        return None;
    }
    let mut matches = product.well_formed_variants().filter(|variant| {
        product
            .options
            .iter()
            .all(|o| selection.get(&o.name) == variant.value_for(&o.name))
    });
    let resolved = matches.next()?;
    if let Some(shadowed) = matches.next() {
        tracing::warn!(
            product_id = %product.id,
            resolved = %resolved.id,
            shadowed = %shadowed.id,
            "duplicate variant assignment, keeping first in catalog order"
        );
    }
    Some(resolved)
}

/// Whether choosing `candidate` for `option_name` can still lead to an
/// in-stock variant, holding every *other* currently-selected option
/// fixed. Options the user has not touched act as wildcards, so with an
/// empty selection this degenerates to "any in-stock variant carries this
/// value". Drives dimming/disabling in the UI; never mutates anything.
pub fn is_option_value_available(
    product: &Product,
    option_name: &str,
    candidate: &str,
    selection: &SelectionState,
) -> bool {
    product.well_formed_variants().any(|variant| {
        variant.in_stock
            && variant.value_for(option_name) == Some(candidate)
            && selection
                .entries()
                .filter(|(name, _)| *name != option_name)
                .all(|(name, value)| variant.value_for(name) == Some(value))
    })
}

/// Gate for the add-to-cart action. Products without options are addable
/// whenever the product itself is in stock; products with options require
/// a resolved, in-stock variant. The gate decides only; the cart mutation
/// lives with the cart store.
pub fn can_add_to_cart(product: &Product, variant: Option<&Variant>) -> bool {
    if !product.has_options() {
        return product.in_stock;
    }
    variant.is_some_and(|v| v.in_stock)
}

/// One selectable value within an option row.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OptionValueView {
    pub value: String,
    pub selected: bool,
    pub available: bool,
    /// CSS color when the option renders as a swatch row.
    pub swatch: Option<String>,
}

/// One option row, in catalog order, ready for the presentation layer to
/// wire click handlers back into selection updates.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OptionView {
    pub id: String,
    pub name: String,
    pub is_swatch: bool,
    pub values: Vec<OptionValueView>,
}

/// Everything a product card displays, derived from one
/// `(Product, SelectionState)` pair. Recomputed per interaction; two calls
/// with the same inputs yield the same view.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CardView {
    pub product_id: String,
    pub matching_variant_id: Option<String>,
    #[serde(flatten)]
    pub pricing: PriceView,
    pub in_stock: bool,
    pub can_add_to_cart: bool,
    /// Matching variant's image override, else the first product image.
    pub display_image: Option<String>,
    pub options: Vec<OptionView>,
}

impl CardView {
    pub fn project(product: &Product, selection: &SelectionState) -> Self {
        let variant = resolve_variant(product, selection);
        let pricing = PriceView::project(product, variant);
        let in_stock = match variant {
            Some(v) => v.in_stock,
            None if product.has_options() => product.any_variant_in_stock(),
            None => product.in_stock,
        };
        let display_image = variant
            .and_then(|v| v.image.as_deref())
            .or_else(|| product.primary_image())
            .map(str::to_string);
        let options = product
            .options
            .iter()
            .map(|option| OptionView {
                id: option.id.clone(),
                name: option.name.clone(),
                is_swatch: option.is_swatch(),
                values: option
                    .values
                    .iter()
                    .map(|value| OptionValueView {
                        value: value.clone(),
                        selected: selection.get(&option.name) == Some(value.as_str()),
                        available: is_option_value_available(product, &option.name, value, selection),
                        swatch: option.swatch_for(value).map(str::to_string),
                    })
                    .collect(),
            })
            .collect();
        Self {
            product_id: product.id.clone(),
            matching_variant_id: variant.map(|v| v.id.clone()),
            pricing,
            in_stock,
            can_add_to_cart: can_add_to_cart(product, variant),
            display_image,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::fixtures::*;
    use crate::domain::value_objects::Money;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn select(pairs: &[(&str, &str)]) -> SelectionState {
        let mut selection = SelectionState::empty();
        for (option, value) in pairs {
            selection.select(*option, *value);
        }
        selection
    }

    #[test]
    fn test_selecting_king_resolves_but_stays_unbuyable() {
        // Scenario: the King size exists, shows its own price, is sold out.
        let product = cooling_pillow();
        let selection = select(&[("Size", "King")]);
        let view = CardView::project(&product, &selection);
        assert_eq!(view.matching_variant_id.as_deref(), Some("v-king"));
        assert_eq!(view.pricing.price, Money::usd(Decimal::new(99, 0)));
        assert!(!view.can_add_to_cart);
        assert!(!view.in_stock);
    }

    #[test]
    fn test_empty_selection_falls_back_to_base_price() {
        let product = cooling_pillow();
        let selection = SelectionState::empty();
        assert!(resolve_variant(&product, &selection).is_none());
        let view = CardView::project(&product, &selection);
        assert_eq!(view.pricing.price, Money::usd(Decimal::new(79, 0)));
        assert!(!view.can_add_to_cart);
        // Some size is sellable, so the card is not badged out-of-stock.
        assert!(view.in_stock);
    }

    #[test]
    fn test_partial_selection_never_resolves() {
        let mut product = cooling_pillow();
        product.options.push(option_def("Color", &["White", "Blue"]));
        product.variants = vec![
            variant("v1", &[("Size", "Standard"), ("Color", "White")], 79, true),
            variant("v2", &[("Size", "King"), ("Color", "White")], 99, true),
        ];
        let selection = select(&[("Size", "King")]);
        assert!(resolve_variant(&product, &selection).is_none());
        assert!(!CardView::project(&product, &selection).can_add_to_cart);
    }

    #[test]
    fn test_unavailable_value_resolves_to_absent_not_panic() {
        // Only a White variant exists; Blue is a dead end the UI dims.
        let mut product = bare_product("throw", 45);
        product.options = vec![option_def("Color", &["White", "Blue"])];
        product.variants = vec![variant("v-white", &[("Color", "White")], 45, true)];
        let selection = SelectionState::empty();
        assert!(is_option_value_available(&product, "Color", "White", &selection));
        assert!(!is_option_value_available(&product, "Color", "Blue", &selection));
        // Clicking Blue anyway just resolves to absent.
        let view = CardView::project(&product, &select(&[("Color", "Blue")]));
        assert_eq!(view.matching_variant_id, None);
        assert!(!view.can_add_to_cart);
        assert_eq!(view.pricing.price, Money::usd(Decimal::new(45, 0)));
    }

    #[test]
    fn test_availability_holds_other_selections_fixed() {
        let mut product = bare_product("sheet-set", 120);
        product.options = vec![
            option_def("Size", &["Queen", "King"]),
            option_def("Color", &["White", "Blue"]),
        ];
        product.variants = vec![
            variant("v1", &[("Size", "Queen"), ("Color", "White")], 120, true),
            variant("v2", &[("Size", "Queen"), ("Color", "Blue")], 120, false),
            variant("v3", &[("Size", "King"), ("Color", "White")], 140, false),
            variant("v4", &[("Size", "King"), ("Color", "Blue")], 140, true),
        ];
        // Nothing picked: both colors reachable somewhere in stock.
        let empty = SelectionState::empty();
        assert!(is_option_value_available(&product, "Color", "White", &empty));
        assert!(is_option_value_available(&product, "Color", "Blue", &empty));
        // Queen picked: Blue's only Queen variant is sold out.
        let queen = select(&[("Size", "Queen")]);
        assert!(is_option_value_available(&product, "Color", "White", &queen));
        assert!(!is_option_value_available(&product, "Color", "Blue", &queen));
        // Substituting within the candidate's own option stays allowed:
        // with Queen+White picked, King is judged against Color=White only.
        let full = select(&[("Size", "Queen"), ("Color", "White")]);
        assert!(!is_option_value_available(&product, "Size", "King", &full));
        assert!(is_option_value_available(&product, "Size", "Queen", &full));
    }

    #[test]
    fn test_duplicate_assignment_resolves_first_in_order() {
        let mut product = cooling_pillow();
        product.variants.push(variant("v-king-dup", &[("Size", "King")], 89, true));
        let resolved = resolve_variant(&product, &select(&[("Size", "King")])).unwrap();
        assert_eq!(resolved.id, "v-king");
    }

    #[test]
    fn test_malformed_variant_never_matches() {
        let mut product = cooling_pillow();
        product.variants[0].options.clear(); // loses its Size value
        assert!(resolve_variant(&product, &select(&[("Size", "Standard")])).is_none());
        assert!(!is_option_value_available(
            &product,
            "Size",
            "Standard",
            &SelectionState::empty()
        ));
    }

    #[test]
    fn test_product_without_options_is_gated_by_own_stock() {
        let mut product = bare_product("eye-mask", 25);
        let view = CardView::project(&product, &SelectionState::empty());
        assert!(view.can_add_to_cart);
        assert!(view.in_stock);
        product.in_stock = false;
        let view = CardView::project(&product, &SelectionState::empty());
        assert!(!view.can_add_to_cart);
        assert!(!view.in_stock);
    }

    #[test]
    fn test_swatch_convention_is_case_insensitive() {
        let mut product = bare_product("duvet", 150);
        let mut color = option_def("COLOR", &["Cloud", "Midnight"]);
        color.swatches = Some(BTreeMap::from([
            ("Cloud".to_string(), "#f5f5f5".to_string()),
            ("Midnight".to_string(), "#191970".to_string()),
        ]));
        product.options = vec![color, option_def("Size", &["Full", "King"])];
        product.variants = vec![
            variant("v1", &[("COLOR", "Cloud"), ("Size", "Full")], 150, true),
            variant("v2", &[("COLOR", "Midnight"), ("Size", "King")], 160, true),
        ];
        let view = CardView::project(&product, &SelectionState::empty());
        assert!(view.options[0].is_swatch);
        assert_eq!(view.options[0].values[0].swatch.as_deref(), Some("#f5f5f5"));
        assert!(!view.options[1].is_swatch);
        assert_eq!(view.options[1].values[0].swatch, None);
    }

    #[test]
    fn test_variant_image_overrides_product_image() {
        let mut product = cooling_pillow();
        product.images = vec![image("https://cdn.example/pillow.jpg")];
        product.variants[1].image = Some("https://cdn.example/pillow-king.jpg".into());
        let base = CardView::project(&product, &SelectionState::empty());
        assert_eq!(base.display_image.as_deref(), Some("https://cdn.example/pillow.jpg"));
        let king = CardView::project(&product, &select(&[("Size", "King")]));
        assert_eq!(king.display_image.as_deref(), Some("https://cdn.example/pillow-king.jpg"));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let product = cooling_pillow();
        let selection = select(&[("Size", "Standard")]);
        assert_eq!(
            CardView::project(&product, &selection),
            CardView::project(&product, &selection)
        );
    }
}
