//! Multi-signature transaction authorization
//!
//! A fixed set of owners jointly authorizes batches of outbound calls. A
//! batch runs only once M of the N owners have confirmed it, runs
//! atomically, and can never run twice.
//!
//! # Example
//!
//! ```ignore
//! use multisig_wallet::multisig::{AuthorizationEngine, EngineConfig, OwnerRegistry};
//!
//! // 2-of-3 wallet
//! let registry = OwnerRegistry::new(vec![alice.clone(), bob.clone(), carol], 2)?;
//! let mut engine = AuthorizationEngine::new(registry, world, EngineConfig::default());
//!
//! // Propose a batch, collect confirmations
//! let index = engine.submit(&alice, calls, false)?.index;
//! engine.confirm(&alice, index, false)?;
//! engine.confirm(&bob, index, false)?;
//!
//! // Quorum reached; any owner may execute
//! let receipt = engine.execute(&alice, index)?;
//! ```

pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod service;
pub mod transaction;

pub use engine::{AuthorizationEngine, ConfirmOutcome, EngineConfig, ExecutionStatus, Submission};
pub use error::MultisigError;
pub use events::{AuditRecord, AuditSink, BroadcastSink, LogSink, MemorySink, MultisigEvent};
pub use ledger::TransactionLedger;
pub use registry::OwnerRegistry;
pub use service::SharedEngine;
pub use transaction::{Transaction, TransactionStatus};
