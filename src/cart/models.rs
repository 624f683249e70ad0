//! Cart Models

use serde::{Deserialize, Serialize};

use crate::products::ProductId;

/// A product and how many of it are in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product in the cart
    pub product_id: ProductId,

    /// Units of the product, always at least one
    pub quantity: u32,
}

impl CartLine {
    /// Create a line.
    #[must_use]
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Lines of a cart frozen at one version, for pricing without holding the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Cart version the lines were taken from.
    pub version: u64,

    /// Cart lines at that version.
    pub lines: Vec<CartLine>,
}

/// Drop empty lines and fold repeated products into one line.
pub(super) fn normalise(lines: impl IntoIterator<Item = CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::new();

    for line in lines {
        if line.quantity == 0 {
            continue;
        }

        match merged
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_merges_duplicates_and_drops_zero() {
        let lines = [
            CartLine::new(ProductId::from("p1"), 1),
            CartLine::new(ProductId::from("p2"), 0),
            CartLine::new(ProductId::from("p1"), 2),
        ];

        assert_eq!(
            normalise(lines),
            vec![CartLine::new(ProductId::from("p1"), 3)]
        );
    }
}
