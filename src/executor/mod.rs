//! Outbound call execution
//!
//! Provides the executor contract consumed by the authorization engine and
//! an atomic, gas-bounded batch runner on top of it.
//!
//! # Example
//!
//! ```ignore
//! use multisig_wallet::executor::{BatchExecutor, Call};
//!
//! let executor = BatchExecutor::default();
//! let receipt = executor.execute_batch(&mut env, &wallet, &[
//!     Call::value_transfer(alice, 10),
//!     Call::value_transfer(bob, 20),
//! ])?;
//! println!("gas used: {}", receipt.gas_used);
//! ```

pub mod batch;
pub mod call;

pub use batch::{
    BatchExecutor, BatchReceipt, ExecutionError, DEFAULT_BATCH_GAS_LIMIT,
    DEFAULT_GAS_LIMIT_PER_CALL,
};
pub use call::{Call, CallError, CallExecutor, CallOutput};
