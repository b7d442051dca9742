//! Chain-agnostic building blocks for pricing and executing swaps against a constant-product
//! AMM: value models, the error taxonomy, collaborator traits, unit conversion and swap planning.

pub mod display;
pub mod errors;
pub mod models;
pub mod planner;
pub mod traits;
pub mod units;

pub use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
