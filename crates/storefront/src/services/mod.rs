//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Sign-in, sign-up and sign-out against Supabase auth
//! - `cart` - Session-backed cart and checkout state

pub mod auth;
pub mod cart;
