//! Multisig-Wallet: an M-of-N transaction authorization engine in Rust
//!
//! This crate provides:
//! - A fixed owner registry with a confirmation threshold
//! - An append-only ledger of proposed transactions (single calls or batches)
//! - The authorization state machine: submit, confirm, revoke, execute
//! - Atomic, gas-bounded batch execution with rollback on any failure
//! - Structured audit events (log, in-memory, broadcast sinks)
//! - An in-process ERC-20 token environment to execute calls against
//!
//! # Example
//!
//! ```rust
//! use multisig_wallet::crypto::Address;
//! use multisig_wallet::executor::Call;
//! use multisig_wallet::multisig::{AuthorizationEngine, EngineConfig, OwnerRegistry};
//! use multisig_wallet::token::WorldState;
//!
//! let owners: Vec<Address> = (0..3).map(|_| Address::random()).collect();
//! let registry = OwnerRegistry::new(owners.clone(), 2).unwrap();
//!
//! let mut world = WorldState::new();
//! world.deposit(&registry.wallet_address(), 100);
//! let mut engine = AuthorizationEngine::new(registry, world, EngineConfig::default());
//!
//! let recipient = Address::random();
//! let index = engine
//!     .submit(&owners[0], vec![Call::value_transfer(recipient.clone(), 40)], false)
//!     .unwrap()
//!     .index;
//! engine.confirm(&owners[0], index, false).unwrap();
//! engine.confirm(&owners[1], index, false).unwrap();
//! engine.execute(&owners[2], index).unwrap();
//!
//! assert_eq!(engine.executor().balance(&recipient), 40);
//! ```

pub mod cli;
pub mod crypto;
pub mod executor;
pub mod multisig;
pub mod token;

// Re-export commonly used types
pub use crypto::Address;
pub use executor::{BatchExecutor, BatchReceipt, Call, CallError, CallExecutor, ExecutionError};
pub use multisig::{
    AuthorizationEngine, EngineConfig, MultisigError, MultisigEvent, OwnerRegistry,
    SharedEngine, Transaction, TransactionLedger, TransactionStatus,
};
pub use token::{Token, TokenCall, WorldState};
