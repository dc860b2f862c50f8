//! Core types for House.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod currency;
pub mod id;
pub mod product;

pub use currency::{CurrencyCode, Price};
pub use id::*;
pub use product::{CartItem, Product};
