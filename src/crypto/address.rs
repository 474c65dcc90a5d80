//! Account addresses
//!
//! An `Address` is an opaque identity handle. The engine never inspects it
//! beyond equality and ordering; callers are authenticated upstream.

use crate::crypto::hash::{derive_address, random_address};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account or contract address (`0x`-prefixed hex, 20 bytes)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap an existing address string
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Derive an address from seed bytes
    pub fn from_seed(seed: &[u8]) -> Self {
        Self(derive_address(seed))
    }

    /// Generate a random address (test accounts, recipients)
    pub fn random() -> Self {
        Self(random_address())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
