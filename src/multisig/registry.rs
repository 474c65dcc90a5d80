//! Owner registry
//!
//! The fixed set of identities allowed to act on the wallet, and the
//! confirmation threshold M. Immutable once constructed.

use crate::crypto::{sha256, Address};
use crate::multisig::error::MultisigError;
use serde::Serialize;
use std::collections::HashSet;

/// M-of-N owner configuration
#[derive(Clone, Debug, Serialize)]
pub struct OwnerRegistry {
    /// Minimum confirmations required (M in M-of-N)
    threshold: usize,
    /// Owners in construction order
    owners: Vec<Address>,
    #[serde(skip)]
    members: HashSet<Address>,
}

impl OwnerRegistry {
    /// Create a new owner registry
    ///
    /// # Arguments
    /// * `owners` - Authorized identities (N), in the order they are listed
    /// * `threshold` - Minimum confirmations required (M)
    ///
    /// # Errors
    /// Fails if the owner list is empty, contains duplicates, or
    /// `threshold` is outside `1..=N`
    pub fn new(owners: Vec<Address>, threshold: usize) -> Result<Self, MultisigError> {
        if owners.is_empty() {
            return Err(MultisigError::NoOwners);
        }

        if threshold == 0 {
            return Err(MultisigError::InvalidThreshold(
                "threshold must be at least 1".to_string(),
            ));
        }

        if threshold > owners.len() {
            return Err(MultisigError::InvalidThreshold(format!(
                "threshold {} exceeds owner count {}",
                threshold,
                owners.len()
            )));
        }

        let mut members = HashSet::with_capacity(owners.len());
        for owner in &owners {
            if !members.insert(owner.clone()) {
                return Err(MultisigError::DuplicateOwner(owner.clone()));
            }
        }

        Ok(Self {
            threshold,
            owners,
            members,
        })
    }

    /// Check if an identity is an owner
    pub fn is_owner(&self, identity: &Address) -> bool {
        self.members.contains(identity)
    }

    /// Total owner count (N)
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Required confirmations (M)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Owners in construction order
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }

    /// Deterministic wallet address for this owner set
    ///
    /// Address = "0x" || hex(SHA256(SHA256(threshold || for each sorted
    /// owner: len || owner))[..20]), with big-endian `u64` integers
    pub fn wallet_address(&self) -> Address {
        let mut sorted: Vec<&Address> = self.owners.iter().collect();
        sorted.sort();

        let mut script_data = (self.threshold as u64).to_be_bytes().to_vec();
        for owner in sorted {
            let bytes = owner.as_str().as_bytes();
            script_data.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
            script_data.extend_from_slice(bytes);
        }

        Address::from_seed(&sha256(&script_data))
    }
}
