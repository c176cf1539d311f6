//! The wallet session: one writer (the watcher below), many readers.

use std::time::Duration;

use ethers::types::Address;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::chain::Chain;
use crate::config::Environment;
use crate::error::ChainError;
use crate::feed::Updates;
use crate::network;

pub const SESSION_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSession {
    pub is_loading: bool,
    pub provider_available: bool,
    pub network_supported: bool,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub environment: Environment,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Unavailable,
    Connected {
        chain_id: u64,
        account: Option<Address>,
    },
    AccountsChanged(Option<Address>),
    ChainChanged(u64),
}

impl WalletSession {
    pub fn new(environment: Environment) -> Self {
        Self {
            is_loading: true,
            provider_available: false,
            network_supported: false,
            account: None,
            chain_id: None,
            environment,
        }
    }

    /// Contract reads make sense only on a reachable, supported network.
    pub fn can_read(&self) -> bool {
        !self.is_loading && self.provider_available && self.network_supported
    }

    pub fn is_connected(&self) -> bool {
        self.can_read() && self.account.is_some()
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Unavailable => {
                *self = Self {
                    is_loading: false,
                    ..Self::new(self.environment)
                };
            }
            SessionEvent::Connected { chain_id, account } => {
                self.is_loading = false;
                self.provider_available = true;
                self.account = account;
                self.set_chain(chain_id);
            }
            SessionEvent::AccountsChanged(account) => self.account = account,
            SessionEvent::ChainChanged(chain_id) => self.set_chain(chain_id),
        }
    }

    fn set_chain(&mut self, chain_id: u64) {
        self.chain_id = Some(chain_id);
        self.network_supported = network::is_supported(chain_id, self.environment);
    }
}

/// Detect the provider, then watch it for account and chain changes until
/// cancelled. A notification on `wake` polls immediately instead of waiting
/// out the interval.
pub async fn run<C: Chain + ?Sized>(
    chain: Option<&C>,
    updates: &Updates<SessionEvent>,
    wake: &Notify,
) {
    let Some(chain) = chain else {
        info!("no wallet provider configured");
        updates.send(SessionEvent::Unavailable);
        return;
    };

    let (mut chain_id, accounts) = match tokio::try_join!(chain.chain_id(), chain.accounts()) {
        Ok(detected) => detected,
        Err(err) => {
            warn!("wallet provider unreachable: {err}");
            updates.send(SessionEvent::Unavailable);
            return;
        }
    };
    let mut account = accounts.first().copied();
    info!(chain_id, ?account, "wallet provider connected");
    if !updates.send(SessionEvent::Connected { chain_id, account }) {
        return;
    }

    let cancel = updates.cancel_token();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(SESSION_POLL_INTERVAL) => {}
            _ = wake.notified() => debug!("session poll requested"),
        }
        match chain.accounts().await {
            Ok(accounts) => {
                let current = accounts.first().copied();
                if current != account {
                    account = current;
                    info!(?account, "wallet account changed");
                    if !updates.send(SessionEvent::AccountsChanged(account)) {
                        return;
                    }
                }
            }
            Err(err) => debug!("account poll failed: {err}"),
        }
        match chain.chain_id().await {
            Ok(current) if current != chain_id => {
                chain_id = current;
                info!(chain_id, "wallet chain changed");
                if !updates.send(SessionEvent::ChainChanged(chain_id)) {
                    return;
                }
            }
            Ok(_) => {}
            Err(err) => debug!("chain id poll failed: {err}"),
        }
    }
}

/// Ask the wallet for account access, then wake the watcher so the granted
/// account reaches the session through it.
pub async fn connect<C: Chain + ?Sized>(
    chain: &C,
    wake: &Notify,
) -> Result<Option<Address>, ChainError> {
    let accounts = chain.request_accounts().await?;
    wake.notify_one();
    Ok(accounts.first().copied())
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::testing::{self, MockChain};

    #[test]
    fn test_apply_evaluates_network_policy() {
        let mut session = WalletSession::new(Environment::Production);
        assert!(!session.can_read());

        session.apply(SessionEvent::Connected {
            chain_id: 97,
            account: None,
        });
        assert!(!session.is_loading);
        assert!(session.provider_available);
        assert!(!session.network_supported);

        session.apply(SessionEvent::ChainChanged(56));
        assert!(session.can_read());
        assert!(!session.is_connected());

        session.apply(SessionEvent::AccountsChanged(Some(testing::account())));
        assert!(session.is_connected());
    }

    #[test]
    fn test_unavailable_settles() {
        let mut session = WalletSession::new(Environment::Staging);
        session.apply(SessionEvent::Unavailable);
        assert!(!session.is_loading);
        assert!(!session.provider_available);
        assert_eq!(session.environment, Environment::Staging);
    }

    #[tokio::test]
    async fn test_no_provider() {
        let (updates, mut rx) = Updates::channel(CancellationToken::new());
        run::<MockChain>(None, &updates, &Notify::new()).await;
        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::Unavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_reports_changes() {
        let chain = MockChain::new();
        let account = testing::account();
        chain.set_accounts(vec![account]);
        let cancel = CancellationToken::new();
        let (updates, mut rx) = Updates::channel(cancel.clone());

        let wake = Notify::new();
        let watcher = run(Some(&chain), &updates, &wake);
        let driver = async {
            assert_eq!(
                rx.recv().await,
                Some(SessionEvent::Connected {
                    chain_id: 97,
                    account: Some(account)
                })
            );
            chain.set_accounts(vec![]);
            assert_eq!(rx.recv().await, Some(SessionEvent::AccountsChanged(None)));
            chain.set_chain_id(56);
            assert_eq!(rx.recv().await, Some(SessionEvent::ChainChanged(56)));
            cancel.cancel();
        };
        tokio::join!(watcher, driver);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_reaches_session_through_watcher() {
        let chain = MockChain::new();
        let cancel = CancellationToken::new();
        let (updates, mut rx) = Updates::channel(cancel.clone());
        let wake = Notify::new();

        let watcher = run(Some(&chain), &updates, &wake);
        let driver = async {
            assert_eq!(
                rx.recv().await,
                Some(SessionEvent::Connected {
                    chain_id: 97,
                    account: None
                })
            );
            let started = Instant::now();
            assert_eq!(connect(&chain, &wake).await.unwrap(), Some(testing::account()));
            assert_eq!(
                rx.recv().await,
                Some(SessionEvent::AccountsChanged(Some(testing::account())))
            );
            assert!(started.elapsed() < SESSION_POLL_INTERVAL);
            cancel.cancel();
        };
        tokio::join!(watcher, driver);
    }
}
