//! Cart
//!
//! Client-side cart state: the lines a customer has picked, persisted to a
//! [`LocalStore`](crate::storage::LocalStore) on every change.

mod context;
mod models;

pub use context::CartContext;
pub use models::{CartLine, CartSnapshot};
