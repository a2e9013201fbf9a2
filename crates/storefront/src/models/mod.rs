//! Domain models for storefront.

pub mod cart;
pub mod catalog;
pub mod upload;
pub mod user;
