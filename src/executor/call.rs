//! Outbound calls and the executor contract
//!
//! A `Call` is a single `(target, value, payload)` triple. The environment
//! that actually performs calls implements `CallExecutor`, including the
//! checkpoint/rollback boundary used for atomic batches.

use crate::crypto::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by an individual outbound call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("Execution reverted: {0}")]
    Reverted(String),
    #[error("Out of gas: used {used}, limit {limit}")]
    OutOfGas { used: u64, limit: u64 },
    #[error("Insufficient value: have {have}, need {need}")]
    InsufficientValue { have: u128, need: u128 },
    #[error("Target is not a contract: {0}")]
    NotAContract(Address),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// A single outbound call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Address being called
    pub target: Address,
    /// Native value sent along with the call
    pub value: u128,
    /// Encoded call data (empty for plain value transfers)
    pub payload: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, value: u128, payload: Vec<u8>) -> Self {
        Self {
            target,
            value,
            payload,
        }
    }

    /// A plain value transfer with no call data
    pub fn value_transfer(target: Address, value: u128) -> Self {
        Self::new(target, value, Vec::new())
    }
}

/// Output of a successful call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutput {
    /// Raw return data
    pub return_data: Vec<u8>,
    /// Gas consumed by the call
    pub gas_used: u64,
}

/// The environment that performs outbound calls
///
/// Implementations must make every effect since `checkpoint` undoable by
/// `rollback`. `BatchExecutor` never applies its own undo.
pub trait CallExecutor {
    /// Opaque handle to a point the environment can roll back to
    type Checkpoint;

    /// Open an all-or-nothing boundary
    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Keep every effect since the checkpoint
    fn commit(&mut self, checkpoint: Self::Checkpoint);

    /// Discard every effect since the checkpoint
    fn rollback(&mut self, checkpoint: Self::Checkpoint);

    /// Perform one call on behalf of `caller`, bounded by `gas_limit`
    fn call(
        &mut self,
        caller: &Address,
        call: &Call,
        gas_limit: u64,
    ) -> Result<CallOutput, CallError>;
}
