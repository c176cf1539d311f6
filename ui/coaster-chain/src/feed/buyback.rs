use ethers::types::{Address, U256};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use super::{EventData, Subscription, Subscriptions, Updates};
use crate::chain::Chain;
use crate::contracts::Contracts;
use crate::error::{ChainError, ConfigError};
use crate::session::WalletSession;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuybackSnapshot {
    pub is_loading: bool,
    pub is_initialized: bool,
    /// Unix seconds.
    pub next_buyback_timestamp: u64,
    pub total_amount: U256,
    pub single_amount: U256,
    pub already_bought_back: U256,
    pub min_tokens_for_call: U256,
    pub caller_token_balance: U256,
}

impl Default for BuybackSnapshot {
    fn default() -> Self {
        Self {
            is_loading: true,
            is_initialized: false,
            next_buyback_timestamp: 0,
            total_amount: U256::zero(),
            single_amount: U256::zero(),
            already_bought_back: U256::zero(),
            min_tokens_for_call: U256::zero(),
            caller_token_balance: U256::zero(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuybackUpdate {
    Loading,
    Settled,
    Loaded(BuybackSnapshot),
    Executed {
        bought_back: U256,
        next_buyback_timestamp: u64,
    },
}

impl BuybackSnapshot {
    pub fn apply(&mut self, update: BuybackUpdate) {
        match update {
            BuybackUpdate::Loading => self.is_loading = true,
            BuybackUpdate::Settled => self.is_loading = false,
            BuybackUpdate::Loaded(snapshot) => *self = snapshot,
            BuybackUpdate::Executed {
                bought_back,
                next_buyback_timestamp,
            } => {
                self.already_bought_back = self.already_bought_back.saturating_add(bought_back);
                self.next_buyback_timestamp = next_buyback_timestamp;
            }
        }
    }

    pub fn seconds_until_next(&self, now: u64) -> u64 {
        self.next_buyback_timestamp.saturating_sub(now)
    }

    pub fn bought_back_percent(&self) -> f64 {
        crate::units::ratio_percent(self.already_bought_back, self.total_amount)
    }

    /// The trigger is open to anyone holding enough tokens once the
    /// countdown has run out.
    pub fn can_trigger(&self, has_account: bool, now: u64) -> bool {
        has_account
            && !self.is_loading
            && self.is_initialized
            && self.seconds_until_next(now) == 0
            && self.caller_token_balance >= self.min_tokens_for_call
    }
}

/// Merge a `SingleBuybackExecuted` log. The next timestamp is not in the
/// payload, so it is read fresh.
pub async fn on_buyback_executed<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    event: &EventData,
) -> Result<BuybackUpdate, ChainError> {
    let reward = event.uint("_senderRewardAmount")?;
    let amount = event.uint("_buybackAmount")?;
    let next: U256 = contracts.buyback().read(chain, "nextBuyback", ()).await?;
    Ok(BuybackUpdate::Executed {
        bought_back: reward.saturating_add(amount),
        next_buyback_timestamp: next.low_u64(),
    })
}

pub async fn load<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    account: Option<Address>,
) -> Result<BuybackSnapshot, ChainError> {
    let buyback = contracts.buyback();
    let total_amount: U256 = buyback.read(chain, "totalAmount", ()).await?;
    let single_amount: U256 = buyback.read(chain, "singleAmount", ()).await?;
    let already_bought_back: U256 = buyback.read(chain, "boughtBackAmount", ()).await?;
    let is_initialized: bool = contracts.presale().read(chain, "wasPresaleEnded", ()).await?;
    let next: U256 = buyback.read(chain, "nextBuyback", ()).await?;
    let min_tokens_for_call: U256 = buyback.read(chain, "minTokensForBuybackCall", ()).await?;
    let caller_token_balance = match account {
        Some(account) => contracts.token().read(chain, "balanceOf", account).await?,
        None => U256::zero(),
    };
    Ok(BuybackSnapshot {
        is_loading: false,
        is_initialized,
        next_buyback_timestamp: next.low_u64(),
        total_amount,
        single_amount,
        already_bought_back,
        min_tokens_for_call,
        caller_token_balance,
    })
}

/// Drive the buyback snapshot until cancelled, re-reading it whenever
/// `refresh` is notified.
pub async fn run<C: Chain + ?Sized>(
    chain: Option<&C>,
    contracts: &Contracts,
    session: &WalletSession,
    updates: &Updates<BuybackUpdate>,
    refresh: &Notify,
) -> Result<(), ConfigError> {
    if session.is_loading {
        return Ok(());
    }
    let chain = match chain {
        Some(chain) if session.can_read() => chain,
        _ => {
            updates.send(BuybackUpdate::Settled);
            return Ok(());
        }
    };

    let buyback = contracts.buyback();
    let mut subscriptions =
        Subscriptions::new(vec![Subscription::open(&buyback, "SingleBuybackExecuted")?]);
    subscriptions.anchor(chain).await;

    updates.send(BuybackUpdate::Loading);
    match load(chain, contracts, session.account).await {
        Ok(snapshot) => {
            info!(next = snapshot.next_buyback_timestamp, "buyback loaded");
            updates.send(BuybackUpdate::Loaded(snapshot));
        }
        Err(err) => {
            warn!("buyback read failed: {err}");
            updates.send(BuybackUpdate::Settled);
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
                        debug!(next = snapshot.next_buyback_timestamp, "buyback refreshed");
                        if !updates.send(BuybackUpdate::Loaded(snapshot)) {
                            return Ok(());
                        }
                    }
                    Err(err) => warn!("buyback refresh failed: {err}"),
                }
                continue;
            }
        };
        for (_, event) in batch {
            match on_buyback_executed(chain, contracts, &event).await {
                Ok(update) => {
                    if !updates.send(update) {
                        return Ok(());
                    }
                }
                Err(err) => warn!("dropping SingleBuybackExecuted: {err}"),
            }
        }
    }
}
