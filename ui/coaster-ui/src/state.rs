//! Shared state for the dashboard UI.

use std::sync::Arc;

use coaster_chain::{Chain, ChainError, Config, ConfigError, Contracts, RpcChain};
use dioxus::prelude::*;
use tracing::warn;

/// Everything built once at startup, provided to every component.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub contracts: Arc<Contracts>,
    /// `None` when no wallet provider is configured or it could not be
    /// constructed.
    pub chain: Option<Arc<dyn Chain>>,
}

impl AppState {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::from_env()?;
        let contracts = Contracts::new(&config)?;
        let chain = match config.wallet_rpc_url.as_deref().map(RpcChain::new) {
            Some(Ok(chain)) => Some(Arc::new(chain) as Arc<dyn Chain>),
            Some(Err(err)) => {
                warn!("wallet provider disabled: {err}");
                None
            }
            None => None,
        };
        Ok(Self {
            config: Arc::new(config),
            contracts: Arc::new(contracts),
            chain,
        })
    }
}

/// A configuration problem discovered after startup (e.g. a contract
/// descriptor missing an event). Rendered as a full-page error.
#[derive(Clone, Copy)]
pub struct FatalError(pub Signal<Option<String>>);

/// Stringify an action failure for display.
pub fn describe(err: ChainError) -> String {
    match err {
        ChainError::NoAccount => "Connect your wallet first.".to_string(),
        ChainError::Reverted(_) => "The transaction was reverted.".to_string(),
        other => other.to_string(),
    }
}
