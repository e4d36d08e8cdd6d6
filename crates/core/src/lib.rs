//! AI Portal Core - Shared types library.
//!
//! This crate provides common types used across all AI portal components:
//! - `server` - Session resolution, capability gating and the HTTP surface
//! - `integration-tests` - End-to-end checks of the server pipeline
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no session storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identity, role, feature-flag and capability types
//! - [`catalog`] - Catalog data types and the `CatalogStore` interface

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod types;

pub use types::*;
