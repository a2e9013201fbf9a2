//! Flagstone Core - Shared domain types.
//!
//! This crate provides the types used across all Flagstone components:
//! - `storefront` - Catalog API, carts, user details and server-rendered pages
//! - `delivery` - Postcode delivery-pricing service
//! - `cli` - Migrations, catalog seeding and postcode import
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Facet counting lives here because it operates on
//! an already-fetched product list.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, postcodes and catalog variations
//! - [`facets`] - Category filter parsing and per-dimension filter counts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod facets;
pub mod types;

pub use facets::{
    Facet, FacetError, FacetFilters, Faceted, FilterCounts, OptionCounts, PriceRange,
    compute_filter_counts, filter_products,
};
pub use types::*;
