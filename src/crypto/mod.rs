//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 hashing
//! - Address derivation and validation

pub mod address;
pub mod hash;

pub use address::Address;
pub use hash::{derive_address, is_valid_address, random_address, sha256, sha256_hex};
