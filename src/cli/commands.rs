//! CLI commands for the multisig wallet
//!
//! Implements the command handlers behind the `multisig` binary.

use crate::crypto::Address;
use crate::executor::{Call, DEFAULT_BATCH_GAS_LIMIT, DEFAULT_GAS_LIMIT_PER_CALL};
use crate::multisig::{
    AuthorizationEngine, EngineConfig, ExecutionStatus, MultisigError, OwnerRegistry,
};
use crate::token::{TokenCall, WorldState};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Decimals of the test token
pub const TOKEN_DECIMALS: u8 = 18;

/// Test token supply in whole tokens
pub const TOKEN_SUPPLY: u128 = 10_000_000;

/// Options for the batch transfer run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of owners (N)
    pub owners: usize,
    /// Confirmations required (M)
    pub threshold: usize,
    /// Number of transfer calls in the batch
    pub recipients: usize,
    /// Whole tokens sent to each recipient
    pub amount: u128,
    /// Transfers left unfunded, so the batch fails
    pub underfund: usize,
    /// Execute from the final confirmation instead of a separate call
    pub immediate: bool,
    pub gas_per_call: u64,
    pub batch_gas: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            owners: 3,
            threshold: 2,
            recipients: 200,
            amount: 10,
            underfund: 0,
            immediate: false,
            gas_per_call: DEFAULT_GAS_LIMIT_PER_CALL,
            batch_gas: DEFAULT_BATCH_GAS_LIMIT,
        }
    }
}

/// What a batch run ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub index: u64,
    pub executed: bool,
    /// True when the batch ran inside the final confirmation
    pub executed_on_confirm: bool,
    pub gas_used: Option<u64>,
    /// Zero-based index of the call that failed, if any
    pub failed_call: Option<usize>,
}

/// Format a base-unit amount with `decimals` places, e.g. "10.0"
pub fn format_units(amount: u128, decimals: u8) -> String {
    let unit = 10u128.pow(decimals as u32);
    let whole = amount / unit;
    let frac = amount % unit;
    if frac == 0 {
        return format!("{}.0", whole);
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

fn random_owners(count: usize) -> Vec<Address> {
    (0..count).map(|_| Address::random()).collect()
}

/// Create a wallet for freshly generated owners and print it
pub fn cmd_deploy(owners: usize, threshold: usize) -> CliResult<OwnerRegistry> {
    let registry = OwnerRegistry::new(random_owners(owners), threshold)?;

    println!("✅ Multisig wallet deployed!");
    println!("   📍 Address: {}", registry.wallet_address());
    println!("   🔐 Policy: {}", registry.description());
    println!("   👥 Owners:");
    for owner in registry.owners() {
        println!("   └─ {}", owner);
    }

    Ok(registry)
}

/// Submit, confirm, fund and execute one batch of token transfers
pub fn cmd_batch(options: &BatchOptions) -> CliResult<BatchReport> {
    let owners = random_owners(options.owners);
    let registry = OwnerRegistry::new(owners.clone(), options.threshold)?;
    let wallet = registry.wallet_address();
    let unit = 10u128.pow(TOKEN_DECIMALS as u32);

    // The first owner deploys the token and holds the supply.
    let deployer = owners.first().cloned().ok_or(MultisigError::NoOwners)?;
    let mut world = WorldState::new();
    let token = world.deploy_token(
        "TestToken",
        "TTK",
        TOKEN_DECIMALS,
        TOKEN_SUPPLY * unit,
        &deployer,
    )?;

    let config = EngineConfig {
        gas_limit_per_call: options.gas_per_call,
        batch_gas_limit: options.batch_gas,
        ..Default::default()
    };
    let mut engine = AuthorizationEngine::new(registry, world, config);

    println!("🔐 Wallet {} ({}-of-{})", wallet, options.threshold, options.owners);
    println!("🪙  Token TTK at {}", token);

    // Build the batch
    let users = random_owners(options.recipients);
    let per_user = options.amount * unit;
    let calls = users
        .iter()
        .map(|user| -> CliResult<Call> {
            let payload = TokenCall::Transfer {
                to: user.clone(),
                amount: per_user,
            }
            .encode()?;
            Ok(Call::new(token.clone(), 0, payload))
        })
        .collect::<CliResult<Vec<Call>>>()?;

    let submission = engine.submit(&deployer, calls, false)?;
    let index = submission.index;
    println!("\n📝 Submitted batch of {} transfers as tx {}", users.len(), index);

    // Immediate execution needs the funds in place before quorum is reached.
    let funded = per_user * options.recipients.saturating_sub(options.underfund) as u128;
    if options.immediate {
        fund_wallet(&mut engine, &token, &deployer, funded)?;
        print_balances(&engine, &token, &users, "before")?;
    }

    // Owners confirm until quorum, or until the batch has run
    let mut executed_on_confirm = false;
    let mut failed_call = None;
    for owner in &owners {
        let outcome = engine.confirm(owner, index, options.immediate)?;
        println!(
            "   ├─ {} confirmed ({} of {})",
            owner, outcome.confirmations, options.threshold
        );
        match &outcome.execution {
            ExecutionStatus::Executed(receipt) => {
                println!(
                    "   └─ ✅ Executed tx {} on confirmation ({} calls)",
                    index,
                    receipt.outputs.len()
                );
                executed_on_confirm = true;
                break;
            }
            ExecutionStatus::Failed(err) => {
                println!("   │  ⚠️  immediate execution failed: {}", err);
                failed_call = Some(err.call_index);
            }
            ExecutionStatus::NotAttempted => {}
        }
    }
    let confirmations = engine.confirmation_count(index)?;
    if confirmations < options.threshold {
        return Err(format!(
            "tx {} has {} of {} confirmations",
            index, confirmations, options.threshold
        )
        .into());
    }

    if !options.immediate {
        fund_wallet(&mut engine, &token, &deployer, funded)?;
        print_balances(&engine, &token, &users, "before")?;

        match engine.execute(&deployer, index) {
            Ok(receipt) => {
                println!("\n✅ Executed tx {} ({} calls)", index, receipt.outputs.len());
            }
            Err(MultisigError::Execution { source, .. }) => {
                println!("\n❌ Execution failed at call {}: {}", source.call_index, source.source);
                failed_call = Some(source.call_index);
            }
            Err(e) => return Err(e.into()),
        }
    }

    print_balances(&engine, &token, &users, "after")?;

    let tx = engine.transaction(index)?;
    if let Some(gas) = tx.gas_used {
        println!("\n⛽ Gas used: {}", gas);
    }

    Ok(BatchReport {
        index,
        executed: tx.is_executed(),
        executed_on_confirm,
        gas_used: tx.gas_used,
        failed_call,
    })
}

/// Move `amount` test tokens from the deployer to the wallet
fn fund_wallet(
    engine: &mut AuthorizationEngine<WorldState>,
    token: &Address,
    deployer: &Address,
    amount: u128,
) -> CliResult<()> {
    let wallet = engine.address().clone();
    if amount > 0 {
        engine
            .executor_mut()
            .token_transfer(token, deployer, &wallet, amount)?;
    }
    println!(
        "\n💰 Funded wallet with {} TTK",
        format_units(engine.executor().token_balance(token, &wallet)?, TOKEN_DECIMALS)
    );
    Ok(())
}

fn print_balances(
    engine: &AuthorizationEngine<WorldState>,
    token: &Address,
    users: &[Address],
    label: &str,
) -> CliResult<()> {
    println!("\n📋 Balances {}:", label);
    for user in users {
        let balance = engine.executor().token_balance(token, user)?;
        println!("   {} => {}", user, format_units(balance, TOKEN_DECIMALS));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(10_000_000_000_000_000_000, 18), "10.0");
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(1, 18), "0.000000000000000001");
        assert_eq!(format_units(0, 18), "0.0");
    }

    #[test]
    fn test_deploy_validates_policy() {
        let registry = cmd_deploy(3, 2).unwrap();
        assert_eq!(registry.description(), "2-of-3");
        assert!(cmd_deploy(2, 3).is_err());
    }

    #[test]
    fn test_batch_run_executes() {
        let options = BatchOptions {
            recipients: 5,
            ..Default::default()
        };

        let report = cmd_batch(&options).unwrap();
        assert!(report.executed);
        assert!(report.gas_used.is_some());
        assert_eq!(report.failed_call, None);
    }

    #[test]
    fn test_batch_run_underfunded_fails() {
        let options = BatchOptions {
            recipients: 5,
            underfund: 2,
            ..Default::default()
        };

        let report = cmd_batch(&options).unwrap();
        assert!(!report.executed);
        assert_eq!(report.failed_call, Some(3));
    }

    #[test]
    fn test_batch_run_unfunded_fails_at_first_call() {
        let options = BatchOptions {
            recipients: 3,
            underfund: 3,
            ..Default::default()
        };

        let report = cmd_batch(&options).unwrap();
        assert!(!report.executed);
        assert_eq!(report.failed_call, Some(0));
    }

    #[test]
    fn test_batch_run_immediate_executes_on_confirmation() {
        let options = BatchOptions {
            recipients: 3,
            immediate: true,
            ..Default::default()
        };

        let report = cmd_batch(&options).unwrap();
        assert!(report.executed);
        assert!(report.executed_on_confirm);
        assert_eq!(report.failed_call, None);
    }

    #[test]
    fn test_batch_run_immediate_underfunded() {
        let options = BatchOptions {
            recipients: 4,
            underfund: 1,
            immediate: true,
            ..Default::default()
        };

        let report = cmd_batch(&options).unwrap();
        assert!(!report.executed);
        assert!(!report.executed_on_confirm);
        assert_eq!(report.failed_call, Some(3));
    }

    #[test]
    fn test_deferred_run_does_not_execute_on_confirmation() {
        let options = BatchOptions {
            recipients: 2,
            ..Default::default()
        };

        let report = cmd_batch(&options).unwrap();
        assert!(report.executed);
        assert!(!report.executed_on_confirm);
    }
}
