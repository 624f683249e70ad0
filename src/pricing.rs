//! Pricing
//!
//! Turns cart lines and catalog prices into a [`CartCalculation`].

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::CartLine,
    config::PricingConfig,
    products::{CatalogError, Product, ProductCatalog},
};

/// Errors raised while building a [`PricingPolicy`].
#[derive(Debug, Error)]
pub enum PricingError {
    /// The currency code is not an ISO 4217 currency.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A rate, threshold or fee is negative.
    #[error("{0} must not be negative")]
    Negative(&'static str),
}

/// Tax, shipping and currency rules applied to every calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    tax_rate: Decimal,
    free_shipping_threshold: Decimal,
    shipping_fee: Decimal,
    currency: &'static Currency,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            free_shipping_threshold: Decimal::new(50_00, 2),
            shipping_fee: Decimal::new(5_99, 2),
            currency: iso::GBP,
        }
    }
}

impl PricingPolicy {
    /// Create a policy.
    ///
    /// `tax_rate` is a fraction, so `0.10` is 10%.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Negative`] if any amount is below zero.
    pub fn new(
        tax_rate: Decimal,
        free_shipping_threshold: Decimal,
        shipping_fee: Decimal,
        currency: &'static Currency,
    ) -> Result<Self, PricingError> {
        for (name, value) in [
            ("tax rate", tax_rate),
            ("free shipping threshold", free_shipping_threshold),
            ("shipping fee", shipping_fee),
        ] {
            if value.is_sign_negative() {
                return Err(PricingError::Negative(name));
            }
        }

        Ok(Self {
            tax_rate,
            free_shipping_threshold,
            shipping_fee,
            currency,
        })
    }

    /// Build a policy from CLI/env configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the currency is unknown or an amount is negative.
    pub fn from_config(config: &PricingConfig) -> Result<Self, PricingError> {
        let code = config.currency.to_ascii_uppercase();
        let currency = iso::find(&code).ok_or(PricingError::UnknownCurrency(code))?;

        Self::new(
            config.tax_rate,
            config.free_shipping_threshold,
            config.shipping_fee,
            currency,
        )
    }

    /// Currency every amount is expressed in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Tax due on `subtotal`.
    #[must_use]
    pub fn tax_on(&self, subtotal: Decimal) -> Decimal {
        Percentage::from(self.tax_rate) * subtotal
    }

    /// Shipping due on `subtotal`; free once the subtotal exceeds the threshold.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }

    /// Round to the currency's minor unit.
    #[must_use]
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.currency.exponent, RoundingStrategy::MidpointAwayFromZero)
    }

    fn money(&self, amount: Decimal) -> Money<'static, Currency> {
        Money::from_decimal(amount, self.currency)
    }
}

/// A cart line joined with the product it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedItem {
    /// The line as it was in the cart.
    pub line: CartLine,

    /// Product data used for pricing (a placeholder if it could not be found).
    pub product: Product,

    /// The catalog had no product for this line.
    pub missing: bool,

    /// Unit price times quantity.
    pub line_total: Money<'static, Currency>,
}

/// Totals for a cart at a given point in time.
///
/// Derived on demand and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CartCalculation {
    /// Priced lines, in cart order.
    pub items: Vec<CalculatedItem>,

    /// Sum of line totals.
    pub subtotal: Money<'static, Currency>,

    /// Tax on the subtotal.
    pub tax_amount: Money<'static, Currency>,

    /// Shipping fee, zero above the free-shipping threshold.
    pub shipping_amount: Money<'static, Currency>,

    /// Promotional discount.
    pub discount_amount: Money<'static, Currency>,

    /// Amount payable, rounded to the currency's minor unit.
    pub total_amount: Money<'static, Currency>,

    /// Currency of every amount above.
    pub currency: &'static Currency,

    /// Version of the cart these totals were computed from.
    pub cart_version: u64,
}

impl CartCalculation {
    /// All-zero totals for an empty cart.
    #[must_use]
    pub fn empty(policy: &PricingPolicy) -> Self {
        let zero = policy.money(Decimal::ZERO);

        Self {
            items: Vec::new(),
            subtotal: zero,
            tax_amount: zero,
            shipping_amount: zero,
            discount_amount: zero,
            total_amount: zero,
            currency: policy.currency,
            cart_version: 0,
        }
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.line.quantity))
            .sum()
    }

    /// Check if there are no priced items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Price lines whose products have already been looked up. Lines without a
/// product are priced as a zero-cost placeholder.
///
/// Pure: the same input always yields the same output.
#[must_use]
pub fn price_lines(
    policy: &PricingPolicy,
    resolved: impl IntoIterator<Item = (CartLine, Option<Product>)>,
) -> CartCalculation {
    let mut subtotal = Decimal::ZERO;

    let items: Vec<CalculatedItem> = resolved
        .into_iter()
        .map(|(line, product)| {
            let missing = product.is_none();
            let product = product.unwrap_or_else(|| Product::placeholder(line.product_id.clone()));
            let line_total = product.line_total(line.quantity);
            subtotal += line_total;

            CalculatedItem {
                line,
                product,
                missing,
                line_total: policy.money(line_total),
            }
        })
        .collect();

    if items.is_empty() {
        return CartCalculation::empty(policy);
    }

    let tax = policy.tax_on(subtotal);
    let shipping = policy.shipping_for(subtotal);
    // Promotions are not applied to carts yet.
    let discount = Decimal::ZERO;
    let total = policy.round(subtotal + tax + shipping - discount);

    CartCalculation {
        items,
        subtotal: policy.money(subtotal),
        tax_amount: policy.money(tax),
        shipping_amount: policy.money(shipping),
        discount_amount: policy.money(discount),
        total_amount: policy.money(total),
        currency: policy.currency,
        cart_version: 0,
    }
}

/// Resolve every line against `catalog` and price the result.
///
/// Products the catalog does not know are priced as a zero-cost
/// "Unknown Product" rather than failing the whole calculation.
///
/// # Errors
///
/// Returns a [`CatalogError`] if the catalog fails for any reason other than
/// a missing product.
pub async fn calculate_cart(
    catalog: &dyn ProductCatalog,
    policy: &PricingPolicy,
    lines: &[CartLine],
) -> Result<CartCalculation, CatalogError> {
    if lines.is_empty() {
        return Ok(CartCalculation::empty(policy));
    }

    let mut resolved = Vec::with_capacity(lines.len());

    for line in lines {
        let product = match catalog.get_product(&line.product_id).await {
            Ok(product) => Some(product),
            Err(CatalogError::NotFound(id)) => {
                debug!(product = %id, "pricing unknown product at zero");
                None
            }
            Err(error) => return Err(error),
        };

        resolved.push((line.clone(), product));
    }

    Ok(price_lines(policy, resolved))
}
