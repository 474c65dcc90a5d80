//! ERC-20 style tokens and the in-process call environment
//!
//! Provides:
//! - Fungible tokens with balances, allowances, transfer and approve
//! - `TokenCall`, the call data format for invoking a token
//! - `WorldState`, a `CallExecutor` holding native balances and tokens
//!
//! # Example
//!
//! ```ignore
//! use multisig_wallet::token::{TokenCall, WorldState};
//!
//! let mut world = WorldState::new();
//! let token = world.deploy_token("TestToken", "TTK", 18, 10_000_000, &deployer)?;
//!
//! // Fund the wallet
//! world.token_transfer(&token, &deployer, &wallet, 1_000)?;
//!
//! // Call data for a transfer out of the wallet
//! let payload = TokenCall::Transfer { to: recipient, amount: 10 }.encode()?;
//! ```

pub mod token;
pub mod world;

pub use token::{Token, TokenCall, TokenError};
pub use world::{
    WorldState, CALL_BASE_GAS, PAYLOAD_BYTE_GAS, STORAGE_READ_GAS, STORAGE_WRITE_GAS,
};
