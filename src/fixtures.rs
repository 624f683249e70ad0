//! Fixtures
//!
//! Seed data for a fresh session: the menu, the known users and a handful of
//! historical orders. A copy is compiled into the binary; a directory holding
//! `products.yaml`, `users.yaml` and `orders.yaml` can replace it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{orders::Order, products::Product, users::User};

const PRODUCTS_FILE: &str = "products.yaml";
const USERS_FILE: &str = "users.yaml";
const ORDERS_FILE: &str = "orders.yaml";

const BUNDLED_PRODUCTS: &str = include_str!("../fixtures/products.yaml");
const BUNDLED_USERS: &str = include_str!("../fixtures/users.yaml");
const BUNDLED_ORDERS: &str = include_str!("../fixtures/orders.yaml");

/// Seed Loading Errors
#[derive(Debug, Error)]
pub enum SeedError {
    /// IO error reading a seed file
    #[error("failed to read seed file {path}")]
    Io {
        /// File that could not be read
        path: PathBuf,

        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("failed to parse {file}")]
    Yaml {
        /// Seed file name
        file: &'static str,

        /// Underlying parse error
        #[source]
        source: serde_norway::Error,
    },
}

/// Seed data for the catalog and order store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedData {
    /// The menu.
    pub products: Vec<Product>,

    /// Registered users.
    pub users: Vec<User>,

    /// Historical orders, in any order.
    pub orders: Vec<Order>,
}

impl SeedData {
    /// Seed data compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled YAML does not parse.
    pub fn bundled() -> Result<Self, SeedError> {
        Ok(Self {
            products: parse(PRODUCTS_FILE, BUNDLED_PRODUCTS)?,
            users: parse(USERS_FILE, BUNDLED_USERS)?,
            orders: parse(ORDERS_FILE, BUNDLED_ORDERS)?,
        })
    }

    /// Load seed data from the three YAML files in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing, unreadable or malformed.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, SeedError> {
        let dir = dir.as_ref();

        let seed = Self {
            products: load(dir, PRODUCTS_FILE)?,
            users: load(dir, USERS_FILE)?,
            orders: load(dir, ORDERS_FILE)?,
        };

        debug!(
            dir = %dir.display(),
            products = seed.products.len(),
            users = seed.users.len(),
            orders = seed.orders.len(),
            "loaded seed data"
        );

        Ok(seed)
    }
}

fn load<T: DeserializeOwned>(dir: &Path, file: &'static str) -> Result<Vec<T>, SeedError> {
    let path = dir.join(file);

    let contents = fs::read_to_string(&path).map_err(|source| SeedError::Io { path, source })?;

    parse(file, &contents)
}

fn parse<T: DeserializeOwned>(file: &'static str, contents: &str) -> Result<Vec<T>, SeedError> {
    serde_norway::from_str(contents).map_err(|source| SeedError::Yaml { file, source })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use tempfile::tempdir;
    use testresult::TestResult;

    use crate::{
        orders::{OrderStatus, PaymentStatus},
        products::ProductId,
        users::Role,
    };

    use super::*;

    #[test]
    fn bundled_seed_parses() -> TestResult {
        let seed = SeedData::bundled()?;

        assert!(!seed.products.is_empty(), "menu should not be empty");
        assert!(!seed.users.is_empty(), "users should not be empty");
        assert!(!seed.orders.is_empty(), "orders should not be empty");

        Ok(())
    }

    #[test]
    fn bundled_menu_has_expected_prices() -> TestResult {
        let seed = SeedData::bundled()?;

        let korma = seed
            .products
            .iter()
            .find(|product| product.id == ProductId::from("p1"))
            .ok_or("p1 missing from menu")?;

        assert_eq!(korma.price, Decimal::new(5_99, 2));
        assert!(korma.in_stock, "in_stock should default to true");

        Ok(())
    }

    #[test]
    fn bundled_orders_reference_known_users() -> TestResult {
        let seed = SeedData::bundled()?;

        for order in &seed.orders {
            assert!(
                seed.users.iter().any(|user| user.id == order.user_id),
                "order {} belongs to unknown user {}",
                order.order_number,
                order.user_id
            );
        }

        Ok(())
    }

    #[test]
    fn bundled_order_totals_are_consistent() -> TestResult {
        let seed = SeedData::bundled()?;

        for order in &seed.orders {
            let subtotal: Decimal = order.items.iter().map(|item| item.total_price).sum();

            assert_eq!(subtotal, order.subtotal, "subtotal of {}", order.order_number);

            let total = (order.subtotal + order.tax_amount + order.shipping_amount
                - order.discount_amount)
                .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);

            assert_eq!(total, order.total_amount, "total of {}", order.order_number);
        }

        Ok(())
    }

    #[test]
    fn bundled_seed_covers_every_role() -> TestResult {
        let seed = SeedData::bundled()?;

        for role in [Role::Customer, Role::Admin, Role::Driver] {
            assert!(
                seed.users.iter().any(|user| user.role == role),
                "no {role:?} in seed users"
            );
        }

        assert!(
            seed.orders
                .iter()
                .any(|order| order.status == OrderStatus::Shipped),
            "expected at least one shipped order"
        );

        assert!(
            seed.orders
                .iter()
                .any(|order| order.payment_status == PaymentStatus::Pending),
            "expected at least one unpaid order"
        );

        Ok(())
    }

    #[test]
    fn from_dir_reads_all_three_files() -> TestResult {
        let dir = tempdir()?;

        fs::write(
            dir.path().join(PRODUCTS_FILE),
            "- id: x1\n  name: Paneer Tikka\n  price: \"7.25\"\n",
        )?;
        fs::write(
            dir.path().join(USERS_FILE),
            "- id: u9\n  email: a@b.c\n  role: driver\n  firstName: A\n  lastName: B\n",
        )?;
        fs::write(dir.path().join(ORDERS_FILE), "[]\n")?;

        let seed = SeedData::from_dir(dir.path())?;

        let product = seed.products.first().ok_or("no products loaded")?;

        assert_eq!(seed.products.len(), 1);
        assert_eq!(product.price, Decimal::new(7_25, 2));
        assert_eq!(seed.users.len(), 1);
        assert!(seed.orders.is_empty());

        Ok(())
    }

    #[test]
    fn from_dir_reports_missing_file() -> TestResult {
        let dir = tempdir()?;

        let result = SeedData::from_dir(dir.path());

        assert!(
            matches!(result, Err(SeedError::Io { .. })),
            "expected Io error, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn from_dir_reports_malformed_yaml() -> TestResult {
        let dir = tempdir()?;

        fs::write(dir.path().join(PRODUCTS_FILE), "- id: [unterminated\n")?;

        let result = SeedData::from_dir(dir.path());

        assert!(
            matches!(result, Err(SeedError::Yaml { file: PRODUCTS_FILE, .. })),
            "expected Yaml error for products, got {result:?}"
        );

        Ok(())
    }
}
