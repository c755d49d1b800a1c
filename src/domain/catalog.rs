//! Product catalog model
//!
//! Catalog records arrive as a JSON snapshot fetched by the surrounding
//! data-loading layer. Everything here is plain data plus integrity
//! checks; resolution and pricing live in [`crate::domain::card`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::value_objects::{Money, Sku};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub featured: bool,
    /// Stock state of the product itself; only consulted when the product
    /// has no option dimensions (variants carry their own flag).
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

fn default_in_stock() -> bool { true }

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub position: u32,
}

/// A named option dimension ("Size", "Color") with its ordered values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub id: String,
    pub name: String,
    pub values: Vec<String>,
    /// Value → CSS color, present only for options rendered as swatches.
    #[serde(default)]
    pub swatches: Option<BTreeMap<String, String>>,
}

impl OptionDefinition {
    /// Convention: the option named, case-insensitively, "color" is
    /// rendered as a swatch row when a swatch map is supplied.
    pub fn is_swatch(&self) -> bool {
        self.name.eq_ignore_ascii_case("color") && self.swatches.is_some()
    }

    pub fn swatch_for(&self, value: &str) -> Option<&str> {
        self.swatches.as_ref()?.get(value).map(String::as_str)
    }
}

/// A concrete purchasable combination of option values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub sku: Option<Sku>,
    /// Option name → value assignment; must cover every declared option.
    pub options: BTreeMap<String, String>,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub in_stock: bool,
    /// Image override shown when this variant is resolved.
    pub image: Option<String>,
}

impl Variant {
    pub fn value_for(&self, option_name: &str) -> Option<&str> {
        self.options.get(option_name).map(String::as_str)
    }

    /// Whether this variant supplies a value for every declared option.
    /// Variants that do not are data-integrity faults and never match.
    pub fn covers(&self, product: &Product) -> bool {
        product.options.iter().all(|o| self.options.contains_key(&o.name))
    }
}

impl Product {
    pub fn has_options(&self) -> bool { !self.options.is_empty() }

    /// Well-formed variants in catalog order. Malformed ones (missing a
    /// declared option value) are skipped everywhere.
    pub fn well_formed_variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|v| v.covers(self))
    }

    pub fn first_in_stock_variant(&self) -> Option<&Variant> {
        self.well_formed_variants().find(|v| v.in_stock)
    }

    pub fn any_variant_in_stock(&self) -> bool {
        self.first_in_stock_variant().is_some()
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }

    /// Card copy with markup stripped from the catalog description.
    pub fn plain_description(&self) -> Option<String> {
        self.description.as_ref().map(|html| {
            let mut out = String::with_capacity(html.len());
            let mut in_tag = false;
            for ch in html.chars() {
                match ch {
                    '<' => in_tag = true,
                    '>' => in_tag = false,
                    c if !in_tag => out.push(c),
                    _ => {}
                }
            }
            out.trim().to_string()
        })
    }

    /// Audit the record for data-integrity faults. Faults are recoverable
    /// (the engine degrades deterministically) but worth surfacing.
    pub fn audit(&self) -> Vec<IntegrityFault> {
        let mut faults = Vec::new();

        for option in &self.options {
            let mut seen = Vec::with_capacity(option.values.len());
            for value in &option.values {
                if seen.contains(&value) {
                    faults.push(IntegrityFault::DuplicateOptionValue {
                        option: option.name.clone(),
                        value: value.clone(),
                    });
                } else {
                    seen.push(value);
                }
            }
        }

        if self.has_options() {
            if self.variants.is_empty() {
                faults.push(IntegrityFault::NoVariants { product_id: self.id.clone() });
            }
            for variant in &self.variants {
                for option in &self.options {
                    if !variant.options.contains_key(&option.name) {
                        faults.push(IntegrityFault::MissingOptionValue {
                            variant_id: variant.id.clone(),
                            option: option.name.clone(),
                        });
                    }
                }
            }
            // Variants are addressable by assignment, so two identical
            // assignments shadow each other (first in order wins).
            let covering: Vec<&Variant> = self.well_formed_variants().collect();
            for (i, a) in covering.iter().enumerate() {
                for b in covering.iter().skip(i + 1) {
                    if self.options.iter().all(|o| a.value_for(&o.name) == b.value_for(&o.name)) {
                        faults.push(IntegrityFault::DuplicateAssignment {
                            variant_id: b.id.clone(),
                            shadowed_by: a.id.clone(),
                        });
                    }
                }
            }
        }

        faults
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrityFault {
    #[error("variant {variant_id} has no value for option '{option}'")]
    MissingOptionValue { variant_id: String, option: String },
    #[error("variant {variant_id} duplicates the assignment of {shadowed_by}")]
    DuplicateAssignment { variant_id: String, shadowed_by: String },
    #[error("option '{option}' lists value '{value}' more than once")]
    DuplicateOptionValue { option: String, value: String },
    #[error("product {product_id} declares options but has no variants")]
    NoVariants { product_id: String },
}

/// In-memory catalog snapshot, loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Wrap a set of product records, logging any integrity faults.
    pub fn new(products: Vec<Product>) -> Self {
        for product in &products {
            for fault in product.audit() {
                tracing::warn!(product_id = %product.id, "catalog integrity: {fault}");
            }
        }
        Self { products }
    }

    pub fn from_json_str(raw: &str) -> crate::Result<Self> {
        let products: Vec<Product> = serde_json::from_str(raw)?;
        Ok(Self::new(products))
    }

    pub fn products(&self) -> &[Product] { &self.products }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }

    /// Look up by id or URL slug.
    pub fn find(&self, key: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == key || p.slug == key)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_audit_missing_option_value() {
        let mut product = cooling_pillow();
        product.variants[1].options.clear();
        let faults = product.audit();
        assert!(faults.iter().any(|f| matches!(
            f,
            IntegrityFault::MissingOptionValue { variant_id, .. } if variant_id == "v-king"
        )));
        // The malformed variant drops out of the well-formed view.
        assert_eq!(product.well_formed_variants().count(), 1);
    }

    #[test]
    fn test_audit_duplicate_assignment() {
        let mut product = cooling_pillow();
        product.variants.push(variant("v-dup", &[("Size", "Standard")], 81, true));
        let faults = product.audit();
        assert_eq!(
            faults,
            vec![IntegrityFault::DuplicateAssignment {
                variant_id: "v-dup".into(),
                shadowed_by: "v-std".into(),
            }]
        );
    }

    #[test]
    fn test_audit_options_without_variants() {
        let mut product = cooling_pillow();
        product.variants.clear();
        assert!(product
            .audit()
            .iter()
            .any(|f| matches!(f, IntegrityFault::NoVariants { .. })));
    }

    #[test]
    fn test_plain_description_strips_markup() {
        let mut product = bare_product("p", 10);
        product.description = Some("<p>Cool <b>gel</b> core.</p>".into());
        assert_eq!(product.plain_description().unwrap(), "Cool gel core.");
    }

    #[test]
    fn test_catalog_find_by_id_or_slug() {
        let mut product = cooling_pillow();
        product.slug = "cooling-pillow-2024".into();
        let catalog = Catalog::new(vec![product]);
        assert!(catalog.find("cooling-pillow").is_some());
        assert!(catalog.find("cooling-pillow-2024").is_some());
        assert!(catalog.find("nope").is_none());
    }

    #[test]
    fn test_catalog_from_json() {
        let raw = r#"[{
            "id": "p1", "slug": "p1", "title": "P1",
            "description": null,
            "price": { "amount": "79", "currency": "USD" },
            "compare_at_price": null,
            "variants": [{
                "id": "v1", "sku": "DW-001",
                "options": { "Size": "Standard" },
                "price": { "amount": "79", "currency": "USD" },
                "compare_at_price": null,
                "in_stock": true, "image": null
            }],
            "options": [{ "id": "o1", "name": "Size", "values": ["Standard"] }]
        }]"#;
        let catalog = Catalog::from_json_str(raw).unwrap();
        assert_eq!(catalog.len(), 1);
        let product = catalog.find("p1").unwrap();
        assert!(product.in_stock); // defaulted
        assert_eq!(product.variants[0].sku.as_ref().unwrap().as_str(), "DW-001");
    }
}
