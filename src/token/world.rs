//! In-process execution environment
//!
//! Holds native balances and deployed tokens, and performs outbound calls
//! against them with gas metering. Checkpoints are full state snapshots, so
//! a rollback restores every balance touched since the checkpoint.

use crate::crypto::{sha256, Address};
use crate::executor::{Call, CallError, CallExecutor, CallOutput};
use crate::token::token::{Token, TokenCall, TokenError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Intrinsic gas charged for every call
pub const CALL_BASE_GAS: u64 = 21_000;

/// Gas charged per byte of call data
pub const PAYLOAD_BYTE_GAS: u64 = 16;

/// Gas cost for a storage write
pub const STORAGE_WRITE_GAS: u64 = 5_000;

/// Gas cost for a storage read
pub const STORAGE_READ_GAS: u64 = 200;

/// Native balances plus deployed tokens
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorldState {
    /// Native balances by address
    balances: HashMap<Address, u128>,
    /// Deployed tokens by contract address
    tokens: HashMap<Address, Token>,
    /// Deployment counter for address generation
    nonce: u64,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a new token; all supply goes to `creator`
    pub fn deploy_token(
        &mut self,
        name: &str,
        symbol: &str,
        decimals: u8,
        total_supply: u128,
        creator: &Address,
    ) -> Result<Address, TokenError> {
        let address = self.generate_address(creator, symbol);
        self.nonce += 1;

        if self.tokens.contains_key(&address) {
            return Err(TokenError::TokenAlreadyExists(address));
        }

        let token = Token::new(
            address.clone(),
            name.to_string(),
            symbol.to_string(),
            decimals,
            total_supply,
            creator,
        )?;
        self.tokens.insert(address.clone(), token);

        log::info!("Token {} ({}) deployed at {}", name, symbol, address);
        Ok(address)
    }

    /// Generate contract address from creator, symbol and nonce
    fn generate_address(&self, creator: &Address, symbol: &str) -> Address {
        let input = format!("{}:{}:{}", creator, symbol, self.nonce);
        Address::from_seed(input.as_bytes())
    }

    pub fn token(&self, address: &Address) -> Option<&Token> {
        self.tokens.get(address)
    }

    /// Token balance of `holder`
    pub fn token_balance(&self, token: &Address, holder: &Address) -> Result<u128, TokenError> {
        self.tokens
            .get(token)
            .map(|t| t.balance_of(holder))
            .ok_or_else(|| TokenError::TokenNotFound(token.clone()))
    }

    /// Direct token transfer made outside any batch (e.g. funding a wallet)
    pub fn token_transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.tokens
            .get_mut(token)
            .ok_or_else(|| TokenError::TokenNotFound(token.clone()))?
            .transfer(from, to, amount)
    }

    /// Credit native value to an address
    ///
    /// Saturates at `u128::MAX`.
    pub fn deposit(&mut self, address: &Address, amount: u128) {
        let balance = self.balances.entry(address.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
        log::debug!("Deposit of {} to {}", amount, address);
    }

    /// Native balance of an address
    pub fn balance(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    fn move_value(&mut self, from: &Address, to: &Address, value: u128) {
        if value == 0 || from == to {
            return;
        }
        let from_balance = self.balances.entry(from.clone()).or_insert(0);
        *from_balance = from_balance.saturating_sub(value);
        let to_balance = self.balances.entry(to.clone()).or_insert(0);
        *to_balance = to_balance.saturating_add(value);
    }

    /// Fingerprint of the full state, used to compare snapshots in tests
    pub fn state_hash(&self) -> Vec<u8> {
        let mut balances: Vec<_> = self.balances.iter().collect();
        balances.sort();
        let mut data = format!("{:?}", balances);
        let mut tokens: Vec<_> = self.tokens.keys().collect();
        tokens.sort();
        for address in tokens {
            if let Some(token) = self.tokens.get(address) {
                data.push_str(&format!("{}:{:?}", address, token.holders()));
            }
        }
        sha256(data.as_bytes())
    }
}

impl CallExecutor for WorldState {
    type Checkpoint = WorldState;

    fn checkpoint(&mut self) -> WorldState {
        self.clone()
    }

    fn commit(&mut self, _checkpoint: WorldState) {}

    fn rollback(&mut self, checkpoint: WorldState) {
        *self = checkpoint;
    }

    fn call(
        &mut self,
        caller: &Address,
        call: &Call,
        gas_limit: u64,
    ) -> Result<CallOutput, CallError> {
        let intrinsic = CALL_BASE_GAS + call.payload.len() as u64 * PAYLOAD_BYTE_GAS;
        if intrinsic > gas_limit {
            return Err(CallError::OutOfGas {
                used: gas_limit,
                limit: gas_limit,
            });
        }

        let have = self.balance(caller);
        if have < call.value {
            return Err(CallError::InsufficientValue {
                have,
                need: call.value,
            });
        }

        if call.payload.is_empty() {
            self.move_value(caller, &call.target, call.value);
            return Ok(CallOutput {
                return_data: Vec::new(),
                gas_used: intrinsic,
            });
        }

        if !self.tokens.contains_key(&call.target) {
            return Err(CallError::NotAContract(call.target.clone()));
        }

        let token_call = TokenCall::decode(&call.payload)
            .map_err(|e| CallError::InvalidPayload(e.to_string()))?;

        let gas_used = intrinsic
            + STORAGE_READ_GAS
            + token_call.storage_writes() * STORAGE_WRITE_GAS;
        if gas_used > gas_limit {
            return Err(CallError::OutOfGas {
                used: gas_limit,
                limit: gas_limit,
            });
        }

        let return_data = match self.tokens.get_mut(&call.target) {
            Some(token) => token
                .apply(caller, &token_call)
                .map_err(|e| CallError::Reverted(e.to_string()))?,
            None => return Err(CallError::NotAContract(call.target.clone())),
        };
        self.move_value(caller, &call.target, call.value);

        Ok(CallOutput {
            return_data,
            gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (WorldState, Address, Address) {
        let mut world = WorldState::new();
        let creator = Address::from_seed(b"creator");
        let token = world
            .deploy_token("TestToken", "TTK", 18, 1_000_000, &creator)
            .unwrap();
        (world, creator, token)
    }

    fn transfer_call(token: &Address, to: &Address, amount: u128) -> Call {
        let payload = TokenCall::Transfer {
            to: to.clone(),
            amount,
        }
        .encode()
        .unwrap();
        Call::new(token.clone(), 0, payload)
    }

    #[test]
    fn test_deploy_addresses_are_unique() {
        let (mut world, creator, first) = setup();
        let second = world
            .deploy_token("TestToken", "TTK", 18, 1_000, &creator)
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(world.token_balance(&first, &creator).unwrap(), 1_000_000);
    }

    #[test]
    fn test_token_call_charges_gas() {
        let (mut world, creator, token) = setup();
        let recipient = Address::from_seed(b"recipient");
        let call = transfer_call(&token, &recipient, 500);

        let output = world.call(&creator, &call, 100_000).unwrap();

        let expected = CALL_BASE_GAS
            + call.payload.len() as u64 * PAYLOAD_BYTE_GAS
            + STORAGE_READ_GAS
            + 2 * STORAGE_WRITE_GAS;
        assert_eq!(output.gas_used, expected);
        assert_eq!(output.return_data, b"true".to_vec());
        assert_eq!(world.token_balance(&token, &recipient).unwrap(), 500);
    }

    #[test]
    fn test_out_of_gas() {
        let (mut world, creator, token) = setup();
        let call = transfer_call(&token, &Address::from_seed(b"r"), 1);

        let result = world.call(&creator, &call, CALL_BASE_GAS);
        assert!(matches!(result, Err(CallError::OutOfGas { .. })));
        assert_eq!(world.token_balance(&token, &creator).unwrap(), 1_000_000);
    }

    #[test]
    fn test_value_transfer() {
        let mut world = WorldState::new();
        let wallet = Address::from_seed(b"wallet");
        let bob = Address::from_seed(b"bob");
        world.deposit(&wallet, 100);

        world
            .call(&wallet, &Call::value_transfer(bob.clone(), 40), 50_000)
            .unwrap();
        assert_eq!(world.balance(&wallet), 60);
        assert_eq!(world.balance(&bob), 40);

        let result = world.call(&wallet, &Call::value_transfer(bob, 1_000), 50_000);
        assert!(matches!(
            result,
            Err(CallError::InsufficientValue { have: 60, need: 1_000 })
        ));
    }

    #[test]
    fn test_deposit_saturates() {
        let mut world = WorldState::new();
        let whale = Address::from_seed(b"whale");

        world.deposit(&whale, u128::MAX - 1);
        world.deposit(&whale, 10);
        assert_eq!(world.balance(&whale), u128::MAX);
    }

    #[test]
    fn test_zero_amount_token_call_succeeds() {
        let (mut world, _, token) = setup();
        let empty = Address::from_seed(b"empty-wallet");
        let call = transfer_call(&token, &Address::from_seed(b"r"), 0);

        let output = world.call(&empty, &call, 100_000).unwrap();
        assert_eq!(output.return_data, b"true".to_vec());
    }

    #[test]
    fn test_payload_to_non_contract() {
        let mut world = WorldState::new();
        let eoa = Address::from_seed(b"eoa");
        let call = Call::new(eoa.clone(), 0, b"{}".to_vec());

        let result = world.call(&Address::from_seed(b"me"), &call, 100_000);
        assert_eq!(result, Err(CallError::NotAContract(eoa)));
    }

    #[test]
    fn test_invalid_payload() {
        let (mut world, creator, token) = setup();
        let call = Call::new(token, 0, b"not json".to_vec());

        let result = world.call(&creator, &call, 100_000);
        assert!(matches!(result, Err(CallError::InvalidPayload(_))));
    }

    #[test]
    fn test_rollback_restores_state() {
        let (mut world, creator, token) = setup();
        let before = world.state_hash();

        let checkpoint = world.checkpoint();
        world
            .call(&creator, &transfer_call(&token, &Address::from_seed(b"r"), 10), 100_000)
            .unwrap();
        world.deposit(&creator, 5);
        world.rollback(checkpoint);

        assert_eq!(world.state_hash(), before);
        assert_eq!(world.token_balance(&token, &creator).unwrap(), 1_000_000);
        assert_eq!(world.balance(&creator), 0);
    }
}
