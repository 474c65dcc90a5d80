//! Hashing and address utilities
//!
//! Provides SHA-256 based hashing used for wallet address derivation,
//! call data digests, and random identity generation.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of bytes in an address (EVM style, 20 bytes)
pub const ADDRESS_LEN: usize = 20;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Derive a `0x`-prefixed address from arbitrary seed data
///
/// Address = "0x" || hex(SHA256(seed)[..20])
pub fn derive_address(seed: &[u8]) -> String {
    let hash = sha256(seed);
    format!("0x{}", hex::encode(&hash[..ADDRESS_LEN]))
}

/// Generate a fresh random address
pub fn random_address() -> String {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    derive_address(&seed)
}

/// Check that a string is a well-formed `0x` address
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => {
            body.len() == ADDRESS_LEN * 2 && body.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            sha256_hex(data),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_derive_address() {
        let address = derive_address(b"hello world");
        assert_eq!(address, "0xb94d27b9934d3e08a52e52d7da7dabfac484efe3");
        assert!(is_valid_address(&address));
    }

    #[test]
    fn test_random_addresses_are_distinct() {
        let a = random_address();
        let b = random_address();
        assert!(is_valid_address(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_address("b94d27b9934d3e08a52e52d7da7dabfac484efe3"));
        assert!(!is_valid_address("0x1234"));
        assert!(!is_valid_address("0xzz4d27b9934d3e08a52e52d7da7dabfac484efe3"));
    }
}
