//! Shared types for the yield vault ledger indexer.
//!
//! - [`objects`]: request and response bodies of the read and admin APIs.
//! - [`address`]: Ethereum address validation and normalization.
//! - `client` (feature-gated): typed HTTP clients for both APIs.

pub mod address;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;

/// Header name for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "Yvault-Admin-Authorization";
