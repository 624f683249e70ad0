//! Orders

pub mod errors;
pub mod models;
pub mod service;
pub mod store;

pub use errors::OrdersServiceError;
pub use models::*;
pub use service::*;
pub use store::{OrderStore, StoreEvent, Subscription};
