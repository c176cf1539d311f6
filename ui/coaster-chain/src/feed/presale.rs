use ethers::types::{Address, U256};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use super::{EventData, Subscription, Subscriptions, Updates};
use crate::chain::Chain;
use crate::contracts::Contracts;
use crate::error::{ChainError, ConfigError};
use crate::session::WalletSession;

const DEFAULT_HARDCAP_ETHER: u64 = 600;
const DEFAULT_MAX_CONTRIBUTION_ETHER: u64 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresaleSnapshot {
    pub is_loading: bool,
    pub is_active: bool,
    pub was_ended: bool,
    pub allow_whitelist_only: bool,
    pub collected_amount: U256,
    pub hardcap_amount: U256,
    pub max_contribution: U256,
    pub account_contribution: U256,
    pub is_account_whitelisted: bool,
}

impl Default for PresaleSnapshot {
    fn default() -> Self {
        Self {
            is_loading: true,
            is_active: false,
            was_ended: false,
            allow_whitelist_only: true,
            collected_amount: U256::zero(),
            hardcap_amount: U256::from(DEFAULT_HARDCAP_ETHER) * U256::exp10(18),
            max_contribution: U256::from(DEFAULT_MAX_CONTRIBUTION_ETHER) * U256::exp10(18),
            account_contribution: U256::zero(),
            is_account_whitelisted: false,
        }
    }
}

impl PresaleSnapshot {
    pub fn collected_percent(&self) -> f64 {
        crate::units::ratio_percent(self.collected_amount, self.hardcap_amount)
    }

    /// Whether the session account may contribute right now.
    pub fn can_contribute(&self) -> bool {
        self.is_active && (self.is_account_whitelisted || !self.allow_whitelist_only)
    }

    pub fn remaining_contribution(&self) -> U256 {
        self.max_contribution.saturating_sub(self.account_contribution)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresaleUpdate {
    Loading,
    /// Nothing to read; keep whatever is there and stop loading.
    Settled,
    Loaded(PresaleSnapshot),
    ContributionAccepted {
        collected_amount: U256,
        account_contribution: Option<U256>,
    },
    Started,
    Ended,
    FcfsActivated,
}

impl PresaleSnapshot {
    pub fn apply(&mut self, update: PresaleUpdate) {
        match update {
            PresaleUpdate::Loading => self.is_loading = true,
            PresaleUpdate::Settled => self.is_loading = false,
            PresaleUpdate::Loaded(snapshot) => *self = snapshot,
            PresaleUpdate::ContributionAccepted {
                collected_amount,
                account_contribution,
            } => {
                self.collected_amount = collected_amount;
                if let Some(contribution) = account_contribution {
                    self.account_contribution = contribution;
                }
            }
            PresaleUpdate::Started => self.is_active = true,
            PresaleUpdate::Ended => {
                self.is_active = false;
                self.was_ended = true;
            }
            PresaleUpdate::FcfsActivated => self.allow_whitelist_only = false,
        }
    }
}

/// Build the update for a `ContributionAccepted` log as seen by `account`.
pub fn on_contribution_accepted(
    event: &EventData,
    account: Option<Address>,
) -> Result<PresaleUpdate, ChainError> {
    let contributor = event.address("_contributor")?;
    let account_contribution = match account {
        Some(account) if account == contributor => Some(event.uint("_totalContribution")?),
        _ => None,
    };
    Ok(PresaleUpdate::ContributionAccepted {
        collected_amount: event.uint("_contributions")?,
        account_contribution,
    })
}

pub async fn load<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    account: Option<Address>,
) -> Result<PresaleSnapshot, ChainError> {
    let presale = contracts.presale();
    let is_active: bool = presale.read(chain, "isPresaleActive", ()).await?;
    let was_ended: bool = presale.read(chain, "wasPresaleEnded", ()).await?;
    let fcfs: bool = presale.read(chain, "isFcfsActive", ()).await?;
    let hardcap_amount: U256 = presale.read(chain, "hardcapAmount", ()).await?;
    let collected_amount: U256 = presale.read(chain, "collectedAmount", ()).await?;
    let max_contribution: U256 = match presale.read(chain, "maxContributionAmount", ()).await {
        Ok(max) => max,
        Err(err) => {
            debug!("maxContributionAmount unavailable, using default: {err}");
            PresaleSnapshot::default().max_contribution
        }
    };
    let (account_contribution, is_account_whitelisted) = match account {
        Some(account) => (
            presale.read(chain, "contribution", account).await?,
            presale.read(chain, "isWhitelisted", account).await?,
        ),
        None => (U256::zero(), false),
    };
    Ok(PresaleSnapshot {
        is_loading: false,
        is_active,
        was_ended,
        allow_whitelist_only: !fcfs,
        collected_amount,
        hardcap_amount,
        max_contribution,
        account_contribution,
        is_account_whitelisted,
    })
}

/// Drive the presale snapshot for `session` until cancelled. A notification
/// on `refresh` re-reads the whole snapshot.
pub async fn run<C: Chain + ?Sized>(
    chain: Option<&C>,
    contracts: &Contracts,
    session: &WalletSession,
    updates: &Updates<PresaleUpdate>,
    refresh: &Notify,
) -> Result<(), ConfigError> {
    if session.is_loading {
        return Ok(());
    }
    let chain = match chain {
        Some(chain) if session.can_read() => chain,
        _ => {
            updates.send(PresaleUpdate::Settled);
            return Ok(());
        }
    };

    let presale = contracts.presale();
    let mut subscriptions = Subscriptions::new(vec![
        Subscription::open(&presale, "ContributionAccepted")?,
        Subscription::open(&presale, "PresaleStarted")?,
        Subscription::open(&presale, "PresaleEnded")?,
        Subscription::open(&presale, "FcfsActivated")?,
    ]);
    subscriptions.anchor(chain).await;

    updates.send(PresaleUpdate::Loading);
    match load(chain, contracts, session.account).await {
        Ok(snapshot) => {
            info!(active = snapshot.is_active, ended = snapshot.was_ended, "presale loaded");
            updates.send(PresaleUpdate::Loaded(snapshot));
        }
        Err(err) => {
            warn!("presale read failed: {err}");
            updates.send(PresaleUpdate::Settled);
        }
    }

    let cancel = updates.cancel_token();
    loop {
        let batch = tokio::select! {
            batch = subscriptions.next_batch(chain, cancel) => match batch {
                Some(batch) => batch,
                None => return Ok(()),
            },
            _ = refresh.notified() => {
                match load(chain, contracts, session.account).await {
                    Ok(snapshot) => {
                        debug!(collected = %snapshot.collected_amount, "presale refreshed");
                        if !updates.send(PresaleUpdate::Loaded(snapshot)) {
                            return Ok(());
                        }
                    }
                    Err(err) => warn!("presale refresh failed: {err}"),
                }
                continue;
            }
        };
        for (name, event) in batch {
            let update = match name {
                "ContributionAccepted" => match on_contribution_accepted(&event, session.account) {
                    Ok(update) => update,
                    Err(err) => {
                        warn!("dropping ContributionAccepted: {err}");
                        continue;
                    }
                },
                "PresaleStarted" => PresaleUpdate::Started,
                "PresaleEnded" => PresaleUpdate::Ended,
                "FcfsActivated" => PresaleUpdate::FcfsActivated,
                _ => continue,
            };
            if !updates.send(update) {
                return Ok(());
            }
        }
    }
}
