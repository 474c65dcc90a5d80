//! Shared engine handle
//!
//! Wraps an `AuthorizationEngine` behind an async read-write lock. Every
//! state-changing operation takes the write lock, so operations are applied
//! one at a time in the order they acquire it. Reads share the lock and see
//! a consistent snapshot.

use crate::crypto::Address;
use crate::executor::{BatchReceipt, Call, CallExecutor};
use crate::multisig::engine::{AuthorizationEngine, ConfirmOutcome, Submission};
use crate::multisig::error::MultisigError;
use crate::multisig::transaction::{Transaction, TransactionStatus};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cloneable handle to one engine
pub struct SharedEngine<E> {
    inner: Arc<RwLock<AuthorizationEngine<E>>>,
}

impl<E> Clone for SharedEngine<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: CallExecutor> SharedEngine<E> {
    pub fn new(engine: AuthorizationEngine<E>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub async fn submit(
        &self,
        caller: &Address,
        calls: Vec<Call>,
        execute_immediately: bool,
    ) -> Result<Submission, MultisigError> {
        self.inner
            .write()
            .await
            .submit(caller, calls, execute_immediately)
    }

    pub async fn confirm(
        &self,
        caller: &Address,
        index: u64,
        execute_immediately: bool,
    ) -> Result<ConfirmOutcome, MultisigError> {
        self.inner
            .write()
            .await
            .confirm(caller, index, execute_immediately)
    }

    pub async fn revoke(&self, caller: &Address, index: u64) -> Result<usize, MultisigError> {
        self.inner.write().await.revoke(caller, index)
    }

    pub async fn execute(
        &self,
        caller: &Address,
        index: u64,
    ) -> Result<BatchReceipt, MultisigError> {
        self.inner.write().await.execute(caller, index)
    }

    pub async fn is_confirmed(&self, index: u64, owner: &Address) -> Result<bool, MultisigError> {
        self.inner.read().await.is_confirmed(index, owner)
    }

    pub async fn confirmation_count(&self, index: u64) -> Result<usize, MultisigError> {
        self.inner.read().await.confirmation_count(index)
    }

    pub async fn status(&self, index: u64) -> Result<TransactionStatus, MultisigError> {
        self.inner.read().await.status(index)
    }

    /// Owned copy of a transaction
    pub async fn transaction(&self, index: u64) -> Result<Transaction, MultisigError> {
        self.inner.read().await.transaction(index).cloned()
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.read().await.transaction_count()
    }

    /// Run `f` against the engine under the read lock
    pub async fn read<R>(&self, f: impl FnOnce(&AuthorizationEngine<E>) -> R) -> R {
        let engine = self.inner.read().await;
        f(&*engine)
    }

    /// Run `f` against the engine under the write lock
    pub async fn write<R>(&self, f: impl FnOnce(&mut AuthorizationEngine<E>) -> R) -> R {
        let mut engine = self.inner.write().await;
        f(&mut *engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::engine::EngineConfig;
    use crate::multisig::registry::OwnerRegistry;
    use crate::token::{TokenCall, WorldState};
    use futures::future::join_all;

    fn setup(owner_count: usize, threshold: usize) -> (SharedEngine<WorldState>, Vec<Address>, Address) {
        let owners: Vec<Address> = (0..owner_count)
            .map(|i| Address::from_seed(format!("owner-{}", i).as_bytes()))
            .collect();
        let registry = OwnerRegistry::new(owners.clone(), threshold).unwrap();
        let wallet = registry.wallet_address();

        let deployer = Address::from_seed(b"deployer");
        let mut world = WorldState::new();
        let token = world
            .deploy_token("TestToken", "TTK", 18, 1_000_000, &deployer)
            .unwrap();
        world
            .token_transfer(&token, &deployer, &wallet, 1_000)
            .unwrap();

        let engine = AuthorizationEngine::new(registry, world, EngineConfig::default());
        (SharedEngine::new(engine), owners, token)
    }

    fn transfer(token: &Address, to: &Address, amount: u128) -> Call {
        let payload = TokenCall::Transfer {
            to: to.clone(),
            amount,
        }
        .encode()
        .unwrap();
        Call::new(token.clone(), 0, payload)
    }

    #[tokio::test]
    async fn test_concurrent_confirmations_count_once_each() {
        let (shared, owners, token) = setup(10, 7);
        let index = shared
            .submit(&owners[0], vec![transfer(&token, &Address::random(), 100)], false)
            .await
            .unwrap()
            .index;

        // Every owner confirms twice, concurrently.
        let tasks: Vec<_> = owners
            .iter()
            .chain(owners.iter())
            .cloned()
            .map(|owner| {
                let shared = shared.clone();
                tokio::spawn(async move { shared.confirm(&owner, index, false).await })
            })
            .collect();

        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(shared.confirmation_count(index).await.unwrap(), 10);
        assert_eq!(
            shared.status(index).await.unwrap(),
            TransactionStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_racing_immediate_execution_runs_once() {
        let (shared, owners, token) = setup(5, 2);
        let recipient = Address::random();
        let index = shared
            .submit(&owners[0], vec![transfer(&token, &recipient, 100)], false)
            .await
            .unwrap()
            .index;

        let tasks: Vec<_> = owners
            .iter()
            .cloned()
            .map(|owner| {
                let shared = shared.clone();
                tokio::spawn(async move { shared.confirm(&owner, index, true).await })
            })
            .collect();

        let mut executed = 0;
        let mut already_executed = 0;
        for result in join_all(tasks).await {
            match result.unwrap() {
                Ok(outcome) if outcome.execution.is_executed() => executed += 1,
                Ok(_) => {}
                Err(MultisigError::AlreadyExecuted(_)) => already_executed += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(executed, 1);
        assert_eq!(already_executed, 3);

        let balance = shared
            .read(|engine| engine.executor().token_balance(&token, &recipient))
            .await
            .unwrap();
        assert_eq!(balance, 100);
        assert!(shared.transaction(index).await.unwrap().is_executed());
    }

    #[tokio::test]
    async fn test_reads_and_writes_through_handle() {
        let (shared, owners, token) = setup(3, 2);
        let index = shared
            .submit(&owners[1], vec![transfer(&token, &Address::random(), 1)], false)
            .await
            .unwrap()
            .index;

        shared.confirm(&owners[1], index, false).await.unwrap();
        assert!(shared.is_confirmed(index, &owners[1]).await.unwrap());
        assert_eq!(shared.revoke(&owners[1], index).await.unwrap(), 0);

        let result = shared.execute(&owners[1], index).await;
        assert!(matches!(
            result,
            Err(MultisigError::InsufficientConfirmations { .. })
        ));

        shared
            .write(|engine| {
                let wallet = engine.address().clone();
                engine.executor_mut().deposit(&wallet, 5);
            })
            .await;
        let native = shared
            .read(|engine| engine.executor().balance(engine.address()))
            .await;
        assert_eq!(native, 5);
        assert_eq!(shared.transaction_count().await, 1);
    }
}
