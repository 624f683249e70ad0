//! SU Curries prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    auth::{AuthContext, AuthError, CurrentUser},
    cart::{CartContext, CartLine, CartSnapshot},
    context::{AppContext, AppInitError},
    fixtures::{SeedData, SeedError},
    orders::{
        Address, CheckoutDetails, InMemoryOrdersService, Order, OrderId, OrderItem, OrderStatus,
        OrderStore, OrderUpdate, OrdersService, OrdersServiceError, PaymentMethod, PaymentStatus,
        StoreEvent, Subscription,
    },
    pricing::{CalculatedItem, CartCalculation, PricingError, PricingPolicy},
    products::{CatalogError, InMemoryCatalog, Product, ProductCatalog, ProductId},
    receipt::ReceiptError,
    storage::{FileLocalStore, LocalStore, MemoryLocalStore, StorageError},
    users::{Role, User, UserId},
};
