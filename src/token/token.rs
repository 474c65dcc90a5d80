//! ERC-20 style token implementation
//!
//! Provides a fungible token with the standard interface, plus the call
//! data format (`TokenCall`) used to invoke it through outbound calls.

use crate::crypto::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: u128, need: u128 },
    #[error("Token not found: {0}")]
    TokenNotFound(Address),
    #[error("Token already exists: {0}")]
    TokenAlreadyExists(Address),
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Invalid supply: must be greater than 0")]
    InvalidSupply,
    #[error("Call data encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Call data accepted by a token contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenCall {
    Transfer {
        to: Address,
        amount: u128,
    },
    Approve {
        spender: Address,
        amount: u128,
    },
    TransferFrom {
        from: Address,
        to: Address,
        amount: u128,
    },
    BalanceOf {
        holder: Address,
    },
}

impl TokenCall {
    /// Encode as call payload
    pub fn encode(&self) -> Result<Vec<u8>, TokenError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from call payload
    pub fn decode(payload: &[u8]) -> Result<Self, TokenError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Number of storage slots this call writes
    pub fn storage_writes(&self) -> u64 {
        match self {
            TokenCall::Transfer { .. } => 2,
            TokenCall::Approve { .. } => 1,
            TokenCall::TransferFrom { .. } => 3,
            TokenCall::BalanceOf { .. } => 0,
        }
    }
}

/// An ERC-20 style fungible token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Token contract address
    pub address: Address,
    /// Token name (e.g., "TestToken")
    pub name: String,
    /// Token symbol (e.g., "TTK")
    pub symbol: String,
    /// Decimal places (usually 18)
    pub decimals: u8,
    /// Total supply (fixed at creation)
    total_supply: u128,
    /// Balances: address -> amount
    balances: HashMap<Address, u128>,
    /// Allowances: owner -> (spender -> amount)
    allowances: HashMap<Address, HashMap<Address, u128>>,
}

impl Token {
    /// Create a new token with all supply allocated to creator
    pub fn new(
        address: Address,
        name: String,
        symbol: String,
        decimals: u8,
        total_supply: u128,
        creator: &Address,
    ) -> Result<Self, TokenError> {
        if name.is_empty() || name.len() > 50 {
            return Err(TokenError::InvalidName);
        }

        if symbol.is_empty() || symbol.len() > 10 {
            return Err(TokenError::InvalidSymbol);
        }

        if decimals > 18 {
            return Err(TokenError::InvalidDecimals);
        }

        if total_supply == 0 {
            return Err(TokenError::InvalidSupply);
        }

        let mut balances = HashMap::new();
        balances.insert(creator.clone(), total_supply);

        Ok(Self {
            address,
            name,
            symbol,
            decimals,
            total_supply,
            balances,
            allowances: HashMap::new(),
        })
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Get balance of an address
    pub fn balance_of(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Holders with a non-zero balance, ordered by address
    pub fn holders(&self) -> Vec<(&Address, &u128)> {
        let mut holders: Vec<_> = self.balances.iter().filter(|(_, &b)| b > 0).collect();
        holders.sort();
        holders
    }

    /// Get allowance for a spender
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Transfer tokens from one address to another
    ///
    /// Zero amounts and transfers to self succeed without moving anything,
    /// as ERC-20 allows.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        if amount == 0 || from == to {
            return Ok(());
        }

        *self.balances.entry(from.clone()).or_insert(0) -= amount;
        *self.balances.entry(to.clone()).or_insert(0) += amount;

        Ok(())
    }

    /// Approve a spender to transfer tokens on behalf of owner (0 revokes)
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    /// Transfer tokens on behalf of owner (requires prior approval)
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let current_allowance = self.allowance(from, spender);
        if current_allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                have: current_allowance,
                need: amount,
            });
        }

        self.transfer(from, to, amount)?;

        if let Some(allowance) = self
            .allowances
            .get_mut(from)
            .and_then(|spenders| spenders.get_mut(spender))
        {
            *allowance -= amount;
        }

        Ok(())
    }

    /// Dispatch a decoded call made by `caller`, returning encoded return data
    pub fn apply(&mut self, caller: &Address, call: &TokenCall) -> Result<Vec<u8>, TokenError> {
        let output = match call {
            TokenCall::Transfer { to, amount } => {
                self.transfer(caller, to, *amount)?;
                serde_json::to_vec(&true)?
            }
            TokenCall::Approve { spender, amount } => {
                self.approve(caller, spender, *amount);
                serde_json::to_vec(&true)?
            }
            TokenCall::TransferFrom { from, to, amount } => {
                self.transfer_from(caller, from, to, *amount)?;
                serde_json::to_vec(&true)?
            }
            TokenCall::BalanceOf { holder } => serde_json::to_vec(&self.balance_of(holder))?,
        };
        Ok(output)
    }
}
