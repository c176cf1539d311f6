use std::fmt;

use ethers::contract::AbiError;
use ethers::providers::ProviderError;
use ethers::types::{Address, H256};

// ---------------------------------------------------------------------------
// Configuration errors (fatal, raised at setup)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownEnvironment(String),
    MissingVariable(&'static str),
    InvalidAddress { key: &'static str, value: String },
    InvalidAbi { contract: &'static str, reason: String },
    MissingEvent { contract: &'static str, event: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEnvironment(env) => write!(f, "Unsupported environment '{env}'"),
            Self::MissingVariable(key) => write!(f, "Environment variable {key} is not defined"),
            Self::InvalidAddress { key, value } => {
                write!(f, "Environment variable {key} is not an address: '{value}'")
            }
            Self::InvalidAbi { contract, reason } => {
                write!(f, "Invalid {contract} ABI: {reason}")
            }
            Self::MissingEvent { contract, event } => {
                write!(f, "Invalid {contract} ABI. Event {event} was not found")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Provider / contract errors (transient, logged and dropped by feeds)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ChainError {
    NoAccount,
    Rpc(String),
    Abi(String),
    Decode(String),
    MissingPair(Address),
    Reverted(H256),
    Dropped(H256),
    Config(ConfigError),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAccount => write!(f, "No wallet account connected"),
            Self::Rpc(msg) => write!(f, "RPC error: {msg}"),
            Self::Abi(msg) => write!(f, "ABI error: {msg}"),
            Self::Decode(msg) => write!(f, "Decode error: {msg}"),
            Self::MissingPair(token) => write!(f, "No trading pair for token {token:?}"),
            Self::Reverted(hash) => write!(f, "Transaction {hash:?} reverted"),
            Self::Dropped(hash) => write!(f, "Transaction {hash:?} was dropped"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<ProviderError> for ChainError {
    fn from(err: ProviderError) -> Self {
        Self::Rpc(err.to_string())
    }
}

impl From<AbiError> for ChainError {
    fn from(err: AbiError) -> Self {
        Self::Abi(err.to_string())
    }
}

impl From<ethers::abi::Error> for ChainError {
    fn from(err: ethers::abi::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<ConfigError> for ChainError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

// ---------------------------------------------------------------------------
// Input validation errors (user facing)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    NotANumber,
    TooManyDecimals,
    TooLarge,
    NotPositive,
    ExceedsAvailable,
    NotEligible,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Please input an amount."),
            Self::NotANumber | Self::TooManyDecimals => write!(f, "Please input a valid number."),
            Self::TooLarge => write!(f, "Amount is too large."),
            Self::NotPositive => write!(f, "Amount must be greater than zero."),
            Self::ExceedsAvailable => write!(f, "Amount exceeds the available balance."),
            Self::NotEligible => write!(f, "You are not eligible to contribute right now."),
        }
    }
}

impl std::error::Error for AmountError {}
