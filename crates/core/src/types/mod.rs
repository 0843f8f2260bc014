//! Core types for Ruway.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod profile;
pub mod settings;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use product::{Category, PLACEHOLDER_IMAGE, Product};
pub use profile::AccountProfile;
pub use settings::{DEFAULT_COMPANY_NAME, StoreSettings};
pub use status::*;
