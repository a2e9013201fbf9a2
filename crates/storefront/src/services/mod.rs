//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Local accounts (argon2) and HS256 tokens
//! - `catalog` - Categories and filtered category pages, cached in-process
//! - `cart` - Persistent cart and the cache-only cart
//! - `delivery` - Client for the postcode delivery-pricing service
//! - `uploads` - Files stored under the uploads directory
//! - `user_details` - Profile details, read through the cache

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod delivery;
pub mod uploads;
pub mod user_details;
