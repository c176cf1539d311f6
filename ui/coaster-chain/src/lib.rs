//! Contract bindings, snapshot feeds and write actions for the RollerCoaster
//! dashboard.
//!
//! Everything in here is UI-agnostic: feeds push typed updates onto a
//! channel and the UI crate folds them into its reactive state.

pub mod abi;
pub mod actions;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod farm;
pub mod feed;
pub mod network;
pub mod pricing;
pub mod session;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{Chain, RpcChain};
pub use config::{Config, Environment};
pub use contracts::Contracts;
pub use error::{AmountError, ChainError, ConfigError};
pub use farm::Farm;
