//! JSON API routes.

pub mod auth;
pub mod cart;
pub mod cart_cache;
pub mod categories;
pub mod upload;
pub mod user_details;
