//! Atomic batch execution
//!
//! Runs an ordered list of calls sequentially inside one checkpoint of the
//! call environment. Either every call succeeds and the checkpoint is
//! committed, or the first failure rolls the whole batch back.

use crate::crypto::Address;
use crate::executor::call::{Call, CallError, CallExecutor, CallOutput};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default gas limit for a single call
pub const DEFAULT_GAS_LIMIT_PER_CALL: u64 = 100_000;

/// Default gas limit for a whole batch
pub const DEFAULT_BATCH_GAS_LIMIT: u64 = 30_000_000;

/// A batch failed; nothing it did is observable afterwards
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Call {call_index} failed: {source}")]
pub struct ExecutionError {
    /// Zero-based index of the first failing call
    pub call_index: usize,
    /// Why that call failed
    #[source]
    pub source: CallError,
}

/// Result of a committed batch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Per-call outputs, in call order
    pub outputs: Vec<CallOutput>,
    /// Total gas consumed by the batch
    pub gas_used: u64,
}

/// Executes batches of calls with a bounded gas budget
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchExecutor {
    gas_limit_per_call: u64,
    batch_gas_limit: u64,
}

impl BatchExecutor {
    pub fn new(gas_limit_per_call: u64, batch_gas_limit: u64) -> Self {
        Self {
            gas_limit_per_call,
            batch_gas_limit,
        }
    }

    pub fn gas_limit_per_call(&self) -> u64 {
        self.gas_limit_per_call
    }

    pub fn batch_gas_limit(&self) -> u64 {
        self.batch_gas_limit
    }

    /// Execute `calls` in order as `caller`
    ///
    /// Each call gets the smaller of the per-call limit and what is left of
    /// the batch budget. An executor reporting more gas than it was given is
    /// treated as out of gas.
    pub fn execute_batch<E: CallExecutor>(
        &self,
        env: &mut E,
        caller: &Address,
        calls: &[Call],
    ) -> Result<BatchReceipt, ExecutionError> {
        let checkpoint = env.checkpoint();
        let mut outputs = Vec::with_capacity(calls.len());
        let mut gas_used: u64 = 0;

        for (call_index, call) in calls.iter().enumerate() {
            let remaining = self.batch_gas_limit.saturating_sub(gas_used);
            let limit = self.gas_limit_per_call.min(remaining);

            let result = env.call(caller, call, limit).and_then(|output| {
                if output.gas_used > limit {
                    Err(CallError::OutOfGas {
                        used: output.gas_used,
                        limit,
                    })
                } else {
                    Ok(output)
                }
            });

            match result {
                Ok(output) => {
                    gas_used += output.gas_used;
                    outputs.push(output);
                }
                Err(source) => {
                    env.rollback(checkpoint);
                    log::warn!(
                        "Batch of {} calls rolled back at call {}: {}",
                        calls.len(),
                        call_index,
                        source
                    );
                    return Err(ExecutionError { call_index, source });
                }
            }
        }

        env.commit(checkpoint);
        log::debug!("Batch of {} calls committed, gas used {}", calls.len(), gas_used);

        Ok(BatchReceipt { outputs, gas_used })
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_LIMIT_PER_CALL, DEFAULT_BATCH_GAS_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records call targets; fails on targets named "fail"
    #[derive(Default)]
    struct RecordingEnv {
        applied: Vec<String>,
        gas_per_call: u64,
        commits: usize,
    }

    impl CallExecutor for RecordingEnv {
        type Checkpoint = usize;

        fn checkpoint(&mut self) -> usize {
            self.applied.len()
        }

        fn commit(&mut self, _checkpoint: usize) {
            self.commits += 1;
        }

        fn rollback(&mut self, checkpoint: usize) {
            self.applied.truncate(checkpoint);
        }

        fn call(
            &mut self,
            _caller: &Address,
            call: &Call,
            gas_limit: u64,
        ) -> Result<CallOutput, CallError> {
            if call.target.as_str() == "fail" {
                return Err(CallError::Reverted("boom".to_string()));
            }
            if self.gas_per_call > gas_limit {
                return Err(CallError::OutOfGas {
                    used: gas_limit,
                    limit: gas_limit,
                });
            }
            self.applied.push(call.target.to_string());
            Ok(CallOutput {
                return_data: vec![],
                gas_used: self.gas_per_call,
            })
        }
    }

    fn calls(targets: &[&str]) -> Vec<Call> {
        targets
            .iter()
            .map(|t| Call::value_transfer(Address::from(*t), 0))
            .collect()
    }

    #[test]
    fn test_batch_runs_in_order() {
        let mut env = RecordingEnv {
            gas_per_call: 10,
            ..Default::default()
        };
        let executor = BatchExecutor::default();

        let receipt = executor
            .execute_batch(&mut env, &Address::from("wallet"), &calls(&["a", "b", "c"]))
            .unwrap();

        assert_eq!(env.applied, vec!["a", "b", "c"]);
        assert_eq!(receipt.outputs.len(), 3);
        assert_eq!(receipt.gas_used, 30);
        assert_eq!(env.commits, 1);
    }

    #[test]
    fn test_failure_rolls_back_whole_batch() {
        let mut env = RecordingEnv::default();
        env.applied.push("earlier".to_string());
        let executor = BatchExecutor::default();

        let err = executor
            .execute_batch(&mut env, &Address::from("wallet"), &calls(&["a", "b", "fail", "d"]))
            .unwrap_err();

        assert_eq!(err.call_index, 2);
        assert!(matches!(err.source, CallError::Reverted(_)));
        assert_eq!(env.applied, vec!["earlier"]);
        assert_eq!(env.commits, 0);
    }

    #[test]
    fn test_batch_gas_budget_is_enforced() {
        let mut env = RecordingEnv {
            gas_per_call: 40,
            ..Default::default()
        };
        // Two calls fit, the third only gets 20 gas.
        let executor = BatchExecutor::new(50, 100);

        let err = executor
            .execute_batch(&mut env, &Address::from("wallet"), &calls(&["a", "b", "c"]))
            .unwrap_err();

        assert_eq!(err.call_index, 2);
        assert!(matches!(err.source, CallError::OutOfGas { limit: 20, .. }));
        assert!(env.applied.is_empty());
    }

    #[test]
    fn test_overreported_gas_is_out_of_gas() {
        let mut env = RecordingEnv {
            gas_per_call: 10,
            ..Default::default()
        };

        struct Liar<'a>(&'a mut RecordingEnv);
        impl CallExecutor for Liar<'_> {
            type Checkpoint = usize;
            fn checkpoint(&mut self) -> usize {
                self.0.checkpoint()
            }
            fn commit(&mut self, checkpoint: usize) {
                self.0.commit(checkpoint)
            }
            fn rollback(&mut self, checkpoint: usize) {
                self.0.rollback(checkpoint)
            }
            fn call(
                &mut self,
                caller: &Address,
                call: &Call,
                _gas_limit: u64,
            ) -> Result<CallOutput, CallError> {
                self.0.call(caller, call, u64::MAX).map(|mut out| {
                    out.gas_used = 1_000;
                    out
                })
            }
        }

        let executor = BatchExecutor::new(100, 1_000_000);
        let err = executor
            .execute_batch(&mut Liar(&mut env), &Address::from("wallet"), &calls(&["a"]))
            .unwrap_err();

        assert_eq!(
            err.source,
            CallError::OutOfGas {
                used: 1_000,
                limit: 100
            }
        );
        assert!(env.applied.is_empty());
    }
}
