//! Products
//!
//! Menu items as the cart and checkout see them, plus the [`ProductCatalog`]
//! seam used to resolve them by id.

use std::fmt::{Display, Formatter, Result as FmtResult};

use async_trait::async_trait;
use mockall::automock;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Name given to products the catalog no longer knows about.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// Product identifier, as used by the catalog (e.g. `"p1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog id
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// Menu description
    #[serde(default)]
    pub description: String,

    /// Unit price in the catalog currency
    pub price: Decimal,

    /// Menu category (e.g. "mains", "sides")
    #[serde(default)]
    pub category: String,

    /// Spice level from 0 (mild) upwards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spice_level: Option<u8>,

    /// Suitable for vegetarians
    #[serde(default)]
    pub vegetarian: bool,

    /// Whether the product can currently be ordered
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,

    /// Units left, when stock is tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,

    /// Image location for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Create an in-stock product with just a name and price.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            category: String::new(),
            spice_level: None,
            vegetarian: false,
            in_stock: true,
            stock_quantity: None,
            image_url: None,
        }
    }

    /// Zero-priced stand-in for a product that could not be resolved.
    #[must_use]
    pub fn placeholder(id: ProductId) -> Self {
        Self {
            in_stock: false,
            ..Self::new(id, UNKNOWN_PRODUCT_NAME, Decimal::ZERO)
        }
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Decimal {
        self.price * Decimal::from(quantity)
    }
}

/// Errors raised while resolving products.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no product with this id.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The catalog could not be queried at all.
    #[error("product catalog unavailable: {0}")]
    Unavailable(String),
}

/// Source of product data.
#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Resolve a single product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id, or
    /// [`CatalogError::Unavailable`] if the catalog cannot be queried.
    async fn get_product(&self, product: &ProductId) -> Result<Product, CatalogError>;

    /// List every product, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unavailable`] if the catalog cannot be queried.
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError>;
}

/// Catalog held entirely in memory, seeded at start-up.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogEntries>,
}

#[derive(Debug, Default)]
struct CatalogEntries {
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
}

impl InMemoryCatalog {
    /// Create a catalog holding the given products.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::default();

        for product in products {
            catalog.upsert(product);
        }

        catalog
    }

    /// Insert a product, or replace the one with the same id.
    pub fn upsert(&self, product: Product) {
        let mut inner = self.inner.write();

        if let Some(&idx) = inner.index.get(&product.id) {
            if let Some(existing) = inner.products.get_mut(idx) {
                debug!(product = %product.id, "replacing catalog entry");
                *existing = product;
                return;
            }
        }

        let idx = inner.products.len();
        inner.index.insert(product.id.clone(), idx);
        inner.products.push(product);
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().products.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().products.is_empty()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get_product(&self, product: &ProductId) -> Result<Product, CatalogError> {
        let inner = self.inner.read();

        inner
            .index
            .get(product)
            .and_then(|&idx| inner.products.get(idx))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(product.clone()))
    }

    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.inner.read().products.clone())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn korma() -> Product {
        Product::new("p1", "Chicken Korma", Decimal::new(5_99, 2))
    }

    #[tokio::test]
    async fn get_product_returns_known_product() -> TestResult {
        let catalog = InMemoryCatalog::new([korma()]);

        let product = catalog.get_product(&ProductId::from("p1")).await?;

        assert_eq!(product.name, "Chicken Korma");
        assert_eq!(product.price, Decimal::new(5_99, 2));

        Ok(())
    }

    #[tokio::test]
    async fn get_product_unknown_id_returns_not_found() {
        let catalog = InMemoryCatalog::new([korma()]);

        let result = catalog.get_product(&ProductId::from("nope")).await;

        assert!(
            matches!(&result, Err(CatalogError::NotFound(id)) if id.as_str() == "nope"),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() -> TestResult {
        let catalog = InMemoryCatalog::new([
            korma(),
            Product::new("p2", "Pilau Rice", Decimal::new(2_50, 2)),
        ]);

        catalog.upsert(Product::new("p1", "Chicken Korma", Decimal::new(6_49, 2)));

        let products = catalog.list_products().await?;

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            products.first().map(|p| p.price),
            Some(Decimal::new(6_49, 2))
        );

        Ok(())
    }

    #[test]
    fn placeholder_is_free_and_named_unknown() {
        let product = Product::placeholder(ProductId::from("gone"));

        assert_eq!(product.name, UNKNOWN_PRODUCT_NAME);
        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.line_total(3), Decimal::ZERO);
    }

    #[test]
    fn deserializes_camel_case_with_defaults() -> TestResult {
        let product: Product = serde_json::from_str(
            r#"{"id":"p9","name":"Onion Bhaji","price":"3.20","spiceLevel":1}"#,
        )?;

        assert_eq!(product.spice_level, Some(1));
        assert!(product.in_stock);
        assert!(!product.vegetarian);
        assert_eq!(product.line_total(2), Decimal::new(6_40, 2));

        Ok(())
    }
}
