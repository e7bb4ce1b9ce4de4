//! Foodgram Core - Domain types and recipe logic.
//!
//! This crate provides the pieces of Foodgram that do not touch the network
//! or the database. It is shared by:
//! - `server` - JSON API for recipes, users, favorites and shopping carts
//! - `cli` - Migrations and reference data import
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no I/O,
//! no database access, no HTTP. Storage is reached through traits such as
//! [`shopping_list::CartSource`], implemented by the server.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails and bounded quantities
//! - [`composition`] - Tag/ingredient validation for recipe writes
//! - [`shopping_list`] - Cart aggregation and the downloadable report

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod composition;
pub mod shopping_list;
pub mod types;

pub use types::*;
