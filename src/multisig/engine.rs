//! Authorization engine
//!
//! The multisig state machine. Owners submit batches, confirm and revoke
//! them, and once a batch has a quorum of confirmations any owner can have
//! it executed, exactly once, through the `BatchExecutor`.
//!
//! Every precondition is checked before any state changes, so a rejected
//! operation leaves the ledger untouched.

use crate::crypto::Address;
use crate::executor::{
    BatchExecutor, BatchReceipt, Call, CallExecutor, ExecutionError, DEFAULT_BATCH_GAS_LIMIT,
    DEFAULT_GAS_LIMIT_PER_CALL,
};
use crate::multisig::error::MultisigError;
use crate::multisig::events::{AuditRecord, AuditSink, LogSink, MultisigEvent};
use crate::multisig::ledger::TransactionLedger;
use crate::multisig::registry::OwnerRegistry;
use crate::multisig::transaction::{Transaction, TransactionStatus};
use chrono::Utc;
use std::sync::Arc;

/// Engine configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Gas available to each call in a batch
    pub gas_limit_per_call: u64,
    /// Gas available to a whole batch
    pub batch_gas_limit: u64,
    /// Record the submitter's confirmation as part of `submit`
    pub auto_confirm_on_submit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gas_limit_per_call: DEFAULT_GAS_LIMIT_PER_CALL,
            batch_gas_limit: DEFAULT_BATCH_GAS_LIMIT,
            auto_confirm_on_submit: false,
        }
    }
}

/// What happened to execution during a call that may trigger it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Execution was not requested or quorum was not reached
    NotAttempted,
    /// The batch ran and the transaction is now Executed
    Executed(BatchReceipt),
    /// The batch reverted and the transaction is now Failed
    Failed(ExecutionError),
}

impl ExecutionStatus {
    pub fn is_executed(&self) -> bool {
        matches!(self, ExecutionStatus::Executed(_))
    }
}

impl From<Result<BatchReceipt, ExecutionError>> for ExecutionStatus {
    fn from(result: Result<BatchReceipt, ExecutionError>) -> Self {
        match result {
            Ok(receipt) => ExecutionStatus::Executed(receipt),
            Err(err) => ExecutionStatus::Failed(err),
        }
    }
}

/// Result of `submit`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub index: u64,
    pub execution: ExecutionStatus,
}

/// Result of `confirm`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmOutcome {
    /// Confirmation count after this call
    pub confirmations: usize,
    /// Whether the count meets the threshold
    pub quorum_reached: bool,
    pub execution: ExecutionStatus,
}

/// M-of-N authorization state machine over a call environment `E`
pub struct AuthorizationEngine<E> {
    registry: OwnerRegistry,
    ledger: TransactionLedger,
    batch: BatchExecutor,
    executor: E,
    sink: Arc<dyn AuditSink>,
    config: EngineConfig,
    wallet: Address,
    audit_sequence: u64,
}

impl<E: CallExecutor> AuthorizationEngine<E> {
    /// Create an engine; events go to the log until a sink is attached
    pub fn new(registry: OwnerRegistry, executor: E, config: EngineConfig) -> Self {
        let ledger = TransactionLedger::new(&registry);
        let wallet = registry.wallet_address();
        let batch = BatchExecutor::new(config.gas_limit_per_call, config.batch_gas_limit);

        log::info!(
            "Multisig wallet {} created ({})",
            wallet,
            registry.description()
        );

        Self {
            registry,
            ledger,
            batch,
            executor,
            sink: Arc::new(LogSink),
            config,
            wallet,
            audit_sequence: 0,
        }
    }

    /// Attach an audit sink
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = sink;
        self
    }

    // =========================================================================
    // State-changing operations
    // =========================================================================

    /// Propose a batch of calls
    ///
    /// The submitter is not counted as confirming unless
    /// `auto_confirm_on_submit` is set. With it set and a threshold of 1,
    /// `execute_immediately` runs the batch before returning.
    pub fn submit(
        &mut self,
        caller: &Address,
        calls: Vec<Call>,
        execute_immediately: bool,
    ) -> Result<Submission, MultisigError> {
        self.ensure_owner(caller)?;

        let index = self.ledger.create(caller, calls)?;
        let tx = self.ledger.get(index)?;
        let event = MultisigEvent::Submitted {
            index,
            submitter: caller.clone(),
            call_count: tx.calls.len(),
            data: tx.call_data(),
        };
        self.emit(event);

        let mut execution = ExecutionStatus::NotAttempted;
        if self.config.auto_confirm_on_submit {
            let outcome = self.record_confirmation(caller, index, execute_immediately)?;
            execution = outcome.execution;
        }

        Ok(Submission { index, execution })
    }

    /// Confirm a transaction
    ///
    /// Confirming twice is accepted and leaves the count unchanged. If the
    /// count reaches the threshold and `execute_immediately` is set, the
    /// batch runs within this call; a failed run is reported in the outcome
    /// and does not undo the confirmation.
    pub fn confirm(
        &mut self,
        caller: &Address,
        index: u64,
        execute_immediately: bool,
    ) -> Result<ConfirmOutcome, MultisigError> {
        self.ensure_owner(caller)?;
        self.ensure_not_executed(index)?;

        self.record_confirmation(caller, index, execute_immediately)
    }

    /// Withdraw a previous confirmation
    ///
    /// Returns the confirmation count after revocation.
    pub fn revoke(&mut self, caller: &Address, index: u64) -> Result<usize, MultisigError> {
        self.ensure_owner(caller)?;
        let tx = self.ensure_not_executed(index)?;

        if !tx.is_confirmed_by(caller) {
            return Err(MultisigError::NotConfirmed {
                index,
                owner: caller.clone(),
            });
        }

        self.ledger.set_confirmation(index, caller, false)?;
        let confirmations = self.ledger.get(index)?.confirmation_count();
        log::debug!("tx {} revoked by {}, {} remaining", index, caller, confirmations);

        self.emit(MultisigEvent::Revoked {
            index,
            owner: caller.clone(),
            confirmations,
        });

        Ok(confirmations)
    }

    /// Execute a transaction that has reached quorum
    ///
    /// On failure the transaction is marked Failed, keeps its
    /// confirmations, and may be executed again later.
    pub fn execute(&mut self, caller: &Address, index: u64) -> Result<BatchReceipt, MultisigError> {
        self.ensure_owner(caller)?;
        let tx = self.ensure_not_executed(index)?;

        let have = tx.confirmation_count();
        let need = self.registry.threshold();
        if have < need {
            return Err(MultisigError::InsufficientConfirmations { index, have, need });
        }

        self.run_batch(caller, index)?
            .map_err(|source| MultisigError::Execution { index, source })
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    /// Whether `owner` currently confirms transaction `index`
    pub fn is_confirmed(&self, index: u64, owner: &Address) -> Result<bool, MultisigError> {
        Ok(self.ledger.get(index)?.is_confirmed_by(owner))
    }

    pub fn transaction(&self, index: u64) -> Result<&Transaction, MultisigError> {
        self.ledger.get(index)
    }

    pub fn confirmation_count(&self, index: u64) -> Result<usize, MultisigError> {
        Ok(self.ledger.get(index)?.confirmation_count())
    }

    /// Owners currently confirming transaction `index`
    pub fn confirmers(&self, index: u64) -> Result<Vec<&Address>, MultisigError> {
        Ok(self.ledger.get(index)?.confirmers())
    }

    pub fn status(&self, index: u64) -> Result<TransactionStatus, MultisigError> {
        Ok(self.ledger.get(index)?.status(self.registry.threshold()))
    }

    pub fn transaction_count(&self) -> usize {
        self.ledger.len()
    }

    /// Transactions not yet executed, in index order
    pub fn pending_transactions(&self) -> Vec<&Transaction> {
        self.ledger.pending()
    }

    pub fn owners(&self) -> &[Address] {
        self.registry.owners()
    }

    pub fn threshold(&self) -> usize {
        self.registry.threshold()
    }

    pub fn registry(&self) -> &OwnerRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Address the batches execute from
    pub fn address(&self) -> &Address {
        &self.wallet
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Mutable access to the environment (funding, deployments)
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_owner(&self, caller: &Address) -> Result<(), MultisigError> {
        if self.registry.is_owner(caller) {
            Ok(())
        } else {
            Err(MultisigError::NotOwner(caller.clone()))
        }
    }

    fn ensure_not_executed(&self, index: u64) -> Result<&Transaction, MultisigError> {
        let tx = self.ledger.get(index)?;
        if tx.is_executed() {
            return Err(MultisigError::AlreadyExecuted(index));
        }
        Ok(tx)
    }

    /// Set the caller's flag, then run the batch if asked and at quorum
    fn record_confirmation(
        &mut self,
        caller: &Address,
        index: u64,
        execute_immediately: bool,
    ) -> Result<ConfirmOutcome, MultisigError> {
        self.ledger.set_confirmation(index, caller, true)?;
        let confirmations = self.ledger.get(index)?.confirmation_count();
        let quorum_reached = confirmations >= self.registry.threshold();
        log::debug!("tx {} confirmed by {}, {} total", index, caller, confirmations);

        self.emit(MultisigEvent::Confirmed {
            index,
            owner: caller.clone(),
            confirmations,
        });

        let execution = if quorum_reached && execute_immediately {
            self.run_batch(caller, index)?.into()
        } else {
            ExecutionStatus::NotAttempted
        };

        Ok(ConfirmOutcome {
            confirmations,
            quorum_reached,
            execution,
        })
    }

    /// Run the batch and record the outcome on the ledger
    ///
    /// The outer error covers ledger lookups; the inner result is the batch
    /// outcome, already recorded.
    fn run_batch(
        &mut self,
        caller: &Address,
        index: u64,
    ) -> Result<Result<BatchReceipt, ExecutionError>, MultisigError> {
        let tx = self.ledger.get(index)?;
        let result = self
            .batch
            .execute_batch(&mut self.executor, &self.wallet, &tx.calls);

        match &result {
            Ok(receipt) => {
                self.ledger.mark_executed(index, receipt.gas_used)?;
                log::info!(
                    "tx {} executed: {} calls, gas used {}",
                    index,
                    receipt.outputs.len(),
                    receipt.gas_used
                );
                self.emit(MultisigEvent::Executed {
                    index,
                    executor: caller.clone(),
                    gas_used: receipt.gas_used,
                });
            }
            Err(err) => {
                self.ledger.mark_failed(index, err.to_string())?;
                log::warn!("tx {} failed: {}", index, err);
                self.emit(MultisigEvent::ExecutionFailed {
                    index,
                    executor: caller.clone(),
                    call_index: err.call_index,
                    reason: err.source.to_string(),
                });
            }
        }

        Ok(result)
    }

    fn emit(&mut self, event: MultisigEvent) {
        self.audit_sequence += 1;
        let record = AuditRecord {
            sequence: self.audit_sequence,
            timestamp: Utc::now(),
            event,
        };
        self.sink.record(&record);
    }
}
