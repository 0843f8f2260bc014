//! Ruway Core - Shared domain library.
//!
//! This crate provides the domain types and the stateful rules shared by the
//! storefront binary and its tests:
//! - `storefront` - Public-facing e-commerce site (JSON over HTTP)
//! - `integration-tests` - End-to-end tests against a mocked backend
//!
//! # Architecture
//!
//! The core crate contains types, pure functions and in-memory state machines
//! only - no HTTP clients, no async runtime. Persistence goes through the
//! [`cart::CartStorage`] trait so callers decide where snapshots live.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, statuses and catalog shapes
//! - [`cart`] - The cart engine: line items, derived totals, snapshot persistence
//! - [`checkout`] - Customer form validation, payment eligibility, checkout stages
//! - [`catalog`] - Pure catalog queries (search, category filter, id-or-sku lookup)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;

pub use types::*;
