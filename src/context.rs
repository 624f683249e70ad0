//! App Context

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::info;

use crate::{
    auth::{AuthContext, AuthError},
    cart::CartContext,
    config::{PricingConfig, StorageConfig},
    fixtures::{SeedData, SeedError},
    orders::{InMemoryOrdersService, OrderStore},
    pricing::{PricingError, PricingPolicy},
    products::InMemoryCatalog,
    storage::{FileLocalStore, LocalStore, StorageError},
    users::User,
};

/// Errors raised while assembling the application.
#[derive(Debug, Error)]
pub enum AppInitError {
    /// Seed data could not be loaded.
    #[error("failed to load seed data")]
    Seed(#[from] SeedError),

    /// Pricing settings are invalid.
    #[error("invalid pricing configuration")]
    Pricing(#[from] PricingError),

    /// The cart file could not be opened.
    #[error("failed to open cart storage")]
    Storage(#[from] StorageError),
}

/// Everything a session needs, wired together once at start-up.
#[derive(Clone)]
pub struct AppContext {
    /// Orders and users.
    pub store: Arc<OrderStore>,

    /// Product menu.
    pub catalog: Arc<InMemoryCatalog>,

    /// Login state.
    pub auth: Arc<AuthContext>,

    /// Pricing, checkout and order queries.
    pub orders: Arc<InMemoryOrdersService>,

    /// Backing store for the cart.
    pub local: Arc<dyn LocalStore>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("store", &self.store)
            .field("catalog", &self.catalog)
            .field("auth", &self.auth)
            .field("orders", &self.orders)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build the application from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the seed data, pricing settings or cart file
    /// cannot be used.
    pub fn from_config(
        pricing: &PricingConfig,
        storage: &StorageConfig,
    ) -> Result<Self, AppInitError> {
        let seed = match &storage.seed_dir {
            Some(dir) => SeedData::from_dir(dir)?,
            None => SeedData::bundled()?,
        };

        let policy = PricingPolicy::from_config(pricing)?;
        let local = Arc::new(FileLocalStore::open(&storage.cart_file)?);

        info!(
            products = seed.products.len(),
            orders = seed.orders.len(),
            currency = policy.currency().iso_alpha_code,
            "application initialised"
        );

        Ok(Self::new(seed, policy, local))
    }

    /// Build the application from already-loaded parts.
    #[must_use]
    pub fn new(seed: SeedData, policy: PricingPolicy, local: Arc<dyn LocalStore>) -> Self {
        let store = Arc::new(OrderStore::from_seed(&seed));
        let catalog = Arc::new(InMemoryCatalog::new(seed.products));
        let auth = Arc::new(AuthContext::new());

        let orders = Arc::new(InMemoryOrdersService::new(
            store.clone(),
            catalog.clone(),
            auth.clone(),
            policy,
        ));

        Self {
            store,
            catalog,
            auth,
            orders,
            local,
        }
    }

    /// Restore the persisted cart.
    #[must_use]
    pub fn cart(&self) -> CartContext {
        CartContext::load(self.local.clone())
    }

    /// Sign in as the user registered under `email`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownUser`] if no such user exists.
    pub fn sign_in(&self, email: &str) -> Result<User, AuthError> {
        self.auth.login(&self.store, email)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;
    use testresult::TestResult;

    use crate::{products::ProductCatalog, storage::MemoryLocalStore};

    use super::*;

    fn storage_config(dir: &std::path::Path) -> StorageConfig {
        StorageConfig {
            cart_file: dir.join("cart.json"),
            seed_dir: None,
        }
    }

    #[test]
    fn new_wires_seed_into_store_and_catalog() -> TestResult {
        let seed = SeedData::bundled()?;
        let (products, orders) = (seed.products.len(), seed.orders.len());

        let app = AppContext::new(
            seed,
            PricingPolicy::default(),
            Arc::new(MemoryLocalStore::new()),
        );

        assert_eq!(app.catalog.len(), products);
        assert_eq!(app.store.orders().len(), orders);
        assert!(!app.auth.is_authenticated(), "session should start signed out");

        Ok(())
    }

    #[tokio::test]
    async fn from_config_uses_bundled_seed_by_default() -> TestResult {
        let dir = tempdir()?;

        let app = AppContext::from_config(&PricingConfig::default(), &storage_config(dir.path()))?;

        let products = app.catalog.list_products().await?;

        assert!(!products.is_empty(), "bundled menu should be loaded");
        assert_eq!(app.orders.policy().currency().iso_alpha_code, "GBP");

        Ok(())
    }

    #[test]
    fn from_config_rejects_unknown_currency() -> TestResult {
        let dir = tempdir()?;
        let pricing = PricingConfig {
            currency: "NOPE".to_string(),
            ..PricingConfig::default()
        };

        let result = AppContext::from_config(&pricing, &storage_config(dir.path()));

        assert!(
            matches!(result, Err(AppInitError::Pricing(PricingError::UnknownCurrency(_)))),
            "expected unknown currency, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn from_config_reports_missing_seed_dir() -> TestResult {
        let dir = tempdir()?;
        let mut storage = storage_config(dir.path());
        storage.seed_dir = Some(dir.path().join("missing"));

        let result = AppContext::from_config(&PricingConfig::default(), &storage);

        assert!(
            matches!(result, Err(AppInitError::Seed(SeedError::Io { .. }))),
            "expected seed IO error, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn cart_is_restored_from_the_cart_file() -> TestResult {
        let dir = tempdir()?;
        let storage = storage_config(dir.path());

        fs::write(
            &storage.cart_file,
            r#"{"cart":"[{\"productId\":\"p1\",\"quantity\":2}]"}"#,
        )?;

        let app = AppContext::from_config(&PricingConfig::default(), &storage)?;
        let cart = app.cart();

        assert_eq!(cart.item_count(), 2);

        Ok(())
    }

    #[test]
    fn sign_in_finds_seeded_user() -> TestResult {
        let app = AppContext::new(
            SeedData::bundled()?,
            PricingPolicy::default(),
            Arc::new(MemoryLocalStore::new()),
        );

        let user = app.sign_in("PRIYA@example.com")?;

        assert_eq!(user.email, "priya@example.com");
        assert!(app.auth.is_authenticated());

        Ok(())
    }
}
