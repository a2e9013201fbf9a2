//! Core types for Flagstone.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod postcode;
pub mod variation;

pub use email::{Email, EmailError};
pub use id::*;
pub use postcode::{Postcode, PostcodeError, normalize_prefix};
pub use variation::{Variation, VariationRef};
