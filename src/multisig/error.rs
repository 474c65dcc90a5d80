//! Errors raised by the authorization engine

use crate::crypto::Address;
use crate::executor::ExecutionError;
use thiserror::Error;

/// Errors related to multisig operations
///
/// Every variant except `Execution` is raised before any state changes.
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Owner list is empty")]
    NoOwners,
    #[error("Duplicate owner: {0}")]
    DuplicateOwner(Address),
    #[error("Not an owner: {0}")]
    NotOwner(Address),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(u64),
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(u64),
    #[error("Insufficient confirmations for transaction {index}: have {have}, need {need}")]
    InsufficientConfirmations {
        index: u64,
        have: usize,
        need: usize,
    },
    #[error("Transaction {index} is not confirmed by {owner}")]
    NotConfirmed { index: u64, owner: Address },
    #[error("Transaction must contain at least one call")]
    EmptyBatch,
    #[error("Execution of transaction {index} failed: {source}")]
    Execution {
        index: u64,
        #[source]
        source: ExecutionError,
    },
}

impl MultisigError {
    /// True for errors raised while constructing the owner registry
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MultisigError::InvalidThreshold(_)
                | MultisigError::NoOwners
                | MultisigError::DuplicateOwner(_)
        )
    }
}
