//! Proposed multisig transactions
//!
//! A transaction is an ordered batch of outbound calls together with the
//! per-owner confirmation flags collected for it.

use crate::crypto::Address;
use crate::executor::Call;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Waiting for more confirmations
    Proposed,
    /// Quorum reached, not yet executed
    Confirmed,
    /// Executed successfully (terminal)
    Executed,
    /// Last execution attempt reverted; may be retried
    Failed,
}

/// A transaction awaiting confirmations or already settled
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Ledger index, assigned at submission
    pub index: u64,
    /// Owner who submitted the transaction
    pub submitter: Address,
    /// Calls to execute, in order
    pub calls: Vec<Call>,
    /// Confirmation flag per owner
    confirmations: BTreeMap<Address, bool>,
    executed: bool,
    failed: bool,
    /// Gas used by the successful execution
    pub gas_used: Option<u64>,
    /// Reason for the most recent failed execution
    pub last_error: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// When state last changed
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn new(index: u64, submitter: Address, calls: Vec<Call>) -> Self {
        let now = Utc::now();
        Self {
            index,
            submitter,
            calls,
            confirmations: BTreeMap::new(),
            executed: false,
            failed: false,
            gas_used: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of owners whose flag is currently true
    pub fn confirmation_count(&self) -> usize {
        self.confirmations.values().filter(|&&confirmed| confirmed).count()
    }

    /// Whether `owner` currently confirms this transaction
    pub fn is_confirmed_by(&self, owner: &Address) -> bool {
        self.confirmations.get(owner).copied().unwrap_or(false)
    }

    /// Owners currently confirming, ordered by address
    pub fn confirmers(&self) -> Vec<&Address> {
        self.confirmations
            .iter()
            .filter(|(_, &confirmed)| confirmed)
            .map(|(owner, _)| owner)
            .collect()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Current lifecycle state under the given threshold
    pub fn status(&self, threshold: usize) -> TransactionStatus {
        if self.executed {
            TransactionStatus::Executed
        } else if self.failed {
            TransactionStatus::Failed
        } else if self.confirmation_count() >= threshold {
            TransactionStatus::Confirmed
        } else {
            TransactionStatus::Proposed
        }
    }

    /// Hex-encoded call data, as carried by the submission event
    pub fn call_data(&self) -> String {
        serde_json::to_vec(&self.calls)
            .map(hex::encode)
            .unwrap_or_default()
    }

    pub(crate) fn set_confirmation(&mut self, owner: &Address, confirmed: bool) {
        self.confirmations.insert(owner.clone(), confirmed);
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_executed(&mut self, gas_used: u64) {
        self.executed = true;
        self.failed = false;
        self.gas_used = Some(gas_used);
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_failed(&mut self, reason: String) {
        self.failed = true;
        self.last_error = Some(reason);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction::new(
            0,
            Address::from("owner1"),
            vec![Call::value_transfer(Address::from("recipient"), 50)],
        )
    }

    #[test]
    fn test_new_transaction_is_proposed() {
        let tx = sample_tx();

        assert_eq!(tx.confirmation_count(), 0);
        assert!(!tx.is_executed());
        assert!(!tx.is_failed());
        assert_eq!(tx.status(2), TransactionStatus::Proposed);
    }

    #[test]
    fn test_count_follows_flags() {
        let mut tx = sample_tx();
        let a = Address::from("owner1");
        let b = Address::from("owner2");

        tx.set_confirmation(&a, true);
        tx.set_confirmation(&a, true);
        assert_eq!(tx.confirmation_count(), 1);

        tx.set_confirmation(&b, true);
        assert_eq!(tx.status(2), TransactionStatus::Confirmed);
        assert_eq!(tx.confirmers(), vec![&a, &b]);

        tx.set_confirmation(&a, false);
        assert_eq!(tx.confirmation_count(), 1);
        assert!(!tx.is_confirmed_by(&a));
        assert!(tx.is_confirmed_by(&b));
    }

    #[test]
    fn test_executed_clears_failed() {
        let mut tx = sample_tx();

        tx.mark_failed("reverted".to_string());
        assert_eq!(tx.status(1), TransactionStatus::Failed);

        tx.mark_executed(21_000);
        assert!(tx.is_executed());
        assert!(!tx.is_failed());
        assert_eq!(tx.status(1), TransactionStatus::Executed);
        assert_eq!(tx.gas_used, Some(21_000));
    }

    #[test]
    fn test_call_data_is_hex_json() {
        let tx = sample_tx();
        let decoded = hex::decode(tx.call_data()).unwrap();
        let calls: Vec<Call> = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(calls, tx.calls);
    }
}
