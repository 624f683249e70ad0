//! Orders service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::{
    auth::CurrentUser,
    cart::{CartContext, CartSnapshot},
    orders::{
        errors::OrdersServiceError,
        models::{CheckoutDetails, Order, OrderId, OrderItem, OrderStatus, OrderUpdate},
        store::OrderStore,
    },
    pricing::{self, CartCalculation, PricingPolicy},
    products::ProductCatalog,
};

/// Orders service backed by the in-memory [`OrderStore`].
pub struct InMemoryOrdersService {
    store: Arc<OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    session: Arc<dyn CurrentUser>,
    policy: PricingPolicy,
}

impl fmt::Debug for InMemoryOrdersService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryOrdersService")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl InMemoryOrdersService {
    /// Build a service over a shared store, catalog and session.
    #[must_use]
    pub fn new(
        store: Arc<OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        session: Arc<dyn CurrentUser>,
        policy: PricingPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            session,
            policy,
        }
    }

    /// Pricing rules used for every calculation.
    #[must_use]
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

#[async_trait]
impl OrdersService for InMemoryOrdersService {
    async fn calculate_cart(
        &self,
        cart: &CartSnapshot,
    ) -> Result<CartCalculation, OrdersServiceError> {
        let mut calculation =
            pricing::calculate_cart(self.catalog.as_ref(), &self.policy, &cart.lines).await?;

        calculation.cart_version = cart.version;

        Ok(calculation)
    }

    async fn user_orders(&self) -> Result<Vec<Order>, OrdersServiceError> {
        let user = self
            .session
            .current_user_id()
            .ok_or(OrdersServiceError::Unauthenticated)?;

        Ok(self.store.user_orders(&user))
    }

    async fn order(&self, id: OrderId) -> Result<Order, OrdersServiceError> {
        self.store.order(id).ok_or(OrdersServiceError::NotFound)
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Order, OrdersServiceError> {
        if !self.store.update_order(id, update) {
            return Err(OrdersServiceError::NotFound);
        }

        self.store.order(id).ok_or(OrdersServiceError::NotFound)
    }

    async fn checkout(
        &self,
        cart: &mut CartContext,
        details: CheckoutDetails,
    ) -> Result<Order, OrdersServiceError> {
        let user_id = self
            .session
            .current_user_id()
            .ok_or(OrdersServiceError::Unauthenticated)?;

        if cart.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        // Price against the catalog as it is now, not the cart's cached totals.
        let calculation = self.calculate_cart(&cart.snapshot()).await?;

        if let Some(item) = calculation.items.iter().find(|item| item.missing) {
            return Err(OrdersServiceError::UnavailableProduct(
                item.line.product_id.clone(),
            ));
        }

        let items = calculation
            .items
            .iter()
            .map(|item| {
                OrderItem::new(
                    item.product.id.clone(),
                    item.product.name.clone(),
                    item.line.quantity,
                    item.product.price,
                )
            })
            .collect();

        let CheckoutDetails {
            shipping_address,
            billing_address,
            payment_method,
            notes,
        } = details;

        let now = Timestamp::now();

        let order = Order {
            id: OrderId::new(),
            user_id,
            order_number: self.store.next_order_number(),
            status: OrderStatus::Pending,
            items,
            subtotal: *calculation.subtotal.amount(),
            tax_amount: *calculation.tax_amount.amount(),
            shipping_amount: *calculation.shipping_amount.amount(),
            discount_amount: *calculation.discount_amount.amount(),
            total_amount: *calculation.total_amount.amount(),
            currency: calculation.currency.iso_alpha_code.to_string(),
            billing_address: billing_address.unwrap_or_else(|| shipping_address.clone()),
            shipping_address,
            payment_method,
            payment_status: payment_method.initial_payment_status(),
            notes,
            created_at: now,
            updated_at: now,
        };

        info!(
            order = %order.id,
            number = %order.order_number,
            items = order.item_count(),
            total = %order.total_amount,
            "checkout complete"
        );

        self.store.add_order(order.clone());

        cart.clear_cart();

        Ok(order)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Price a cart snapshot against the current catalog.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::Catalog`] if the catalog cannot be queried.
    async fn calculate_cart(&self, cart: &CartSnapshot)
    -> Result<CartCalculation, OrdersServiceError>;

    /// Orders placed by the signed-in user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::Unauthenticated`] if nobody is signed in.
    async fn user_orders(&self) -> Result<Vec<Order>, OrdersServiceError>;

    /// Retrieve a single order.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::NotFound`] if no order has this id.
    async fn order(&self, id: OrderId) -> Result<Order, OrdersServiceError>;

    /// Merge a partial update into an order and return the result.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::NotFound`] if no order has this id.
    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Order, OrdersServiceError>;

    /// Turn the cart into an order for the signed-in user, then empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::Unauthenticated`] if nobody is signed in,
    /// [`OrdersServiceError::EmptyCart`] if the cart has no lines,
    /// [`OrdersServiceError::UnavailableProduct`] if a line's product is gone
    /// from the menu, or [`OrdersServiceError::Catalog`] if pricing fails.
    /// The cart is left untouched on error.
    async fn checkout(
        &self,
        cart: &mut CartContext,
        details: CheckoutDetails,
    ) -> Result<Order, OrdersServiceError>;
}
