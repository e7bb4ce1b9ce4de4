//! Business logic services for the API.
//!
//! # Services
//!
//! - `auth` - Registration, token login/logout, password changes
//! - `media` - Decoding and storing uploaded images

pub mod auth;
pub mod media;
