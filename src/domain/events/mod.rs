//! Domain events
//!
//! Raised by the cart aggregate and drained by the service layer after
//! each mutation; the core engine itself is pure and raises nothing.

#[derive(Clone, Debug)]
pub enum CartEvent {
    LineItemAdded {
        cart_id: String,
        product_id: String,
        variant_id: Option<String>,
        quantity: u32,
    },
    QuantityUpdated {
        cart_id: String,
        product_id: String,
        quantity: u32,
    },
    Cleared {
        cart_id: String,
    },
}
