//! Cart Context

use std::{fmt, sync::Arc};

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    cart::models::{CartLine, CartSnapshot, normalise},
    orders::{OrdersService, OrdersServiceError},
    pricing::CartCalculation,
    products::{Product, ProductId},
    storage::{CART_KEY, CART_PRODUCTS_KEY, LocalStore, StorageError},
};

/// Reactive cart state.
///
/// Every change bumps the cart version, drops any cached calculation and
/// rewrites both storage keys.
pub struct CartContext {
    store: Arc<dyn LocalStore>,
    lines: Vec<CartLine>,
    products: FxHashMap<ProductId, Product>,
    version: u64,
    calculation: Option<CartCalculation>,
}

impl fmt::Debug for CartContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartContext")
            .field("lines", &self.lines)
            .field("version", &self.version)
            .field("cached", &self.calculation.is_some())
            .finish_non_exhaustive()
    }
}

impl CartContext {
    /// Create an empty cart persisting to `store`. Nothing is read from it.
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            lines: Vec::new(),
            products: FxHashMap::default(),
            version: 0,
            calculation: None,
        }
    }

    /// Restore the cart persisted in `store`.
    ///
    /// Entries that cannot be read or parsed are logged and treated as empty.
    pub fn load(store: Arc<dyn LocalStore>) -> Self {
        let lines: Vec<CartLine> = read_entry(store.as_ref(), CART_KEY).unwrap_or_default();
        let mut products: FxHashMap<ProductId, Product> =
            read_entry(store.as_ref(), CART_PRODUCTS_KEY).unwrap_or_default();

        let lines = normalise(lines);
        products.retain(|id, _| lines.iter().any(|line| line.product_id == *id));

        debug!(lines = lines.len(), "cart restored");

        Self {
            lines,
            products,
            ..Self::new(store)
        }
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// Stock is not checked. A quantity of zero is ignored.
    pub fn add_item(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }

        match self.line_mut(&product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine::new(product.id.clone(), quantity)),
        }

        self.products.insert(product.id.clone(), product.clone());

        self.changed();
    }

    /// Remove the line for `product`. Does nothing if it is not in the cart.
    pub fn remove_item(&mut self, product: &ProductId) {
        let before = self.lines.len();

        self.lines.retain(|line| line.product_id != *product);

        if self.lines.len() != before {
            self.products.remove(product);
            self.changed();
        }
    }

    /// Set the quantity for `product`; zero or less removes the line.
    ///
    /// Does nothing if the product is not in the cart.
    pub fn update_quantity(&mut self, product: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        if let Some(line) = self.line_mut(product) {
            if line.quantity != quantity {
                line.quantity = quantity;
                self.changed();
            }
        }
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.lines.clear();
        self.products.clear();

        self.changed();
    }

    /// Totals for the cart as it is now.
    ///
    /// A cached result is reused while the cart is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an [`OrdersServiceError`] if pricing fails.
    pub async fn calculate_cart(
        &mut self,
        orders: &dyn OrdersService,
    ) -> Result<CartCalculation, OrdersServiceError> {
        if let Some(calculation) = self.cached_calculation() {
            return Ok(calculation.clone());
        }

        let calculation = orders.calculate_cart(&self.snapshot()).await?;

        self.store_calculation(calculation.clone());

        Ok(calculation)
    }

    /// Keep `calculation` as the cached result if it was computed from the
    /// current version of the cart. Stale results are discarded.
    pub fn store_calculation(&mut self, calculation: CartCalculation) -> bool {
        if calculation.cart_version != self.version {
            debug!(
                stale = calculation.cart_version,
                current = self.version,
                "discarding stale cart calculation"
            );
            return false;
        }

        self.calculation = Some(calculation);

        true
    }

    /// The cached calculation, if the cart has not changed since it was made.
    #[must_use]
    pub fn cached_calculation(&self) -> Option<&CartCalculation> {
        self.calculation
            .as_ref()
            .filter(|calculation| calculation.cart_version == self.version)
    }

    /// Freeze the current lines for pricing.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            version: self.version,
            lines: self.lines.clone(),
        }
    }

    /// Lines in the order they were added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Product snapshot taken when `product` was added.
    #[must_use]
    pub fn product(&self, product: &ProductId) -> Option<&Product> {
        self.products.get(product)
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Counter bumped on every change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn line_mut(&mut self, product: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == *product)
    }

    fn changed(&mut self) {
        self.version += 1;
        self.calculation = None;

        if let Err(error) = self.persist() {
            warn!(?error, "failed to persist cart");
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.store.set(CART_KEY, &serde_json::to_string(&self.lines)?)?;
        self.store
            .set(CART_PRODUCTS_KEY, &serde_json::to_string(&self.products)?)?;

        Ok(())
    }
}

fn read_entry<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(error) => {
            warn!(key, ?error, "failed to read persisted cart");
            return None;
        }
    };

    serde_json::from_str(&raw)
        .inspect_err(|error| warn!(key, %error, "discarding unparsable persisted cart"))
        .ok()
}
