//! SU Curries
//!
//! Cart and order core for the SU Curries takeaway: catalog lookup, a
//! persisted shopping cart, pricing with tax and shipping, checkout, and an
//! in-memory order store with change notification.

pub mod auth;
pub mod cart;
pub mod config;
pub mod context;
pub mod fixtures;
pub mod ids;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod storage;
pub mod users;

#[cfg(test)]
mod test;
