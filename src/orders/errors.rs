//! Orders service errors.

use thiserror::Error;

use crate::products::{CatalogError, ProductId};

/// Failure from an [`OrdersService`](super::OrdersService) operation.
#[derive(Debug, Error)]
pub enum OrdersServiceError {
    /// No order has the requested id.
    #[error("order not found")]
    NotFound,

    /// The operation needs a signed-in user.
    #[error("no user is signed in")]
    Unauthenticated,

    /// Checkout was attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line refers to a product the catalog no longer has.
    #[error("product is no longer on the menu: {0}")]
    UnavailableProduct(ProductId),

    /// The catalog could not be queried.
    #[error("product catalog error")]
    Catalog(#[from] CatalogError),
}
