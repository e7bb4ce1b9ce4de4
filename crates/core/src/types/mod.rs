//! Core types for Foodgram.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod quantity;

pub use email::{Email, EmailError};
pub use id::*;
pub use quantity::{Amount, CookingTime, QuantityError};
