//! Transaction ledger
//!
//! Append-only store of proposed transactions keyed by a monotonically
//! increasing index. Entries are never removed.

use crate::crypto::Address;
use crate::executor::Call;
use crate::multisig::error::MultisigError;
use crate::multisig::registry::OwnerRegistry;
use crate::multisig::transaction::Transaction;
use serde::Serialize;
use std::collections::BTreeSet;

/// Ledger of all transactions ever submitted to one wallet
#[derive(Debug, Clone, Serialize)]
pub struct TransactionLedger {
    /// Identities allowed to hold a confirmation entry
    owners: BTreeSet<Address>,
    /// Transactions; position equals index
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    /// Create an empty ledger for the given owner set
    pub fn new(registry: &OwnerRegistry) -> Self {
        Self {
            owners: registry.owners().iter().cloned().collect(),
            transactions: Vec::new(),
        }
    }

    /// Append a new transaction and return its index
    pub fn create(&mut self, submitter: &Address, calls: Vec<Call>) -> Result<u64, MultisigError> {
        if calls.is_empty() {
            return Err(MultisigError::EmptyBatch);
        }

        let index = self.transactions.len() as u64;
        self.transactions
            .push(Transaction::new(index, submitter.clone(), calls));

        Ok(index)
    }

    /// Get a transaction by index
    pub fn get(&self, index: u64) -> Result<&Transaction, MultisigError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.transactions.get(i))
            .ok_or(MultisigError::TransactionNotFound(index))
    }

    fn get_mut(&mut self, index: u64) -> Result<&mut Transaction, MultisigError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.transactions.get_mut(i))
            .ok_or(MultisigError::TransactionNotFound(index))
    }

    /// Set an owner's confirmation flag on a transaction
    pub fn set_confirmation(
        &mut self,
        index: u64,
        owner: &Address,
        confirmed: bool,
    ) -> Result<(), MultisigError> {
        let is_owner = self.owners.contains(owner);
        let tx = self.get_mut(index)?;
        if !is_owner {
            return Err(MultisigError::NotOwner(owner.clone()));
        }

        tx.set_confirmation(owner, confirmed);
        Ok(())
    }

    /// Mark a transaction as successfully executed
    pub fn mark_executed(&mut self, index: u64, gas_used: u64) -> Result<(), MultisigError> {
        self.get_mut(index)?.mark_executed(gas_used);
        Ok(())
    }

    /// Mark a transaction's latest execution attempt as failed
    pub fn mark_failed(&mut self, index: u64, reason: String) -> Result<(), MultisigError> {
        self.get_mut(index)?.mark_failed(reason);
        Ok(())
    }

    /// Number of transactions ever submitted
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All transactions in index order
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Transactions not yet executed
    pub fn pending(&self) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|tx| !tx.is_executed())
            .collect()
    }
}
