//! Pool statistics plus the session account's position in the selected farm.

use ethers::types::{Address, U256};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use super::{Updates, HARVESTABLE_REFRESH_INTERVAL};
use crate::chain::Chain;
use crate::contracts::{ContractHandle, Contracts};
use crate::error::{ChainError, ConfigError};
use crate::farm::Farm;
use crate::pricing;
use crate::session::WalletSession;
use crate::units::ratio_percent;

pub const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionBalances {
    pub has_approved: bool,
    pub staked_amount: U256,
    pub total_staked: U256,
    pub available_to_stake: U256,
    pub harvestable: U256,
    pub claimable: U256,
    pub total_harvested: U256,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserPosition {
    pub is_loading: bool,
    pub balances: PositionBalances,
    pub apy_percent: f64,
    pub is_apy_loading: bool,
}

impl Default for UserPosition {
    fn default() -> Self {
        Self {
            is_loading: true,
            balances: PositionBalances::default(),
            apy_percent: 0.0,
            is_apy_loading: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pool {
    pub farm_address: Address,
    pub farm_token_address: Address,
    pub has_farming_started: bool,
    pub total_reward_supply: U256,
    pub daily_reward: U256,
    /// Unix seconds; zero when farming has not started.
    pub next_halving_timestamp: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FarmSnapshot {
    pub is_loading: bool,
    pub farm: Farm,
    pub pool: Option<Pool>,
    pub position: UserPosition,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FarmUpdate {
    Loading,
    Settled,
    PoolLoaded(Pool),
    PositionLoading,
    PositionLoaded(PositionBalances),
    Harvestable(U256),
    ApyLoading,
    Apy(f64),
}

impl FarmSnapshot {
    pub fn new(farm: Farm) -> Self {
        Self {
            is_loading: true,
            farm,
            pool: None,
            position: UserPosition::default(),
        }
    }

    pub fn apply(&mut self, update: FarmUpdate) {
        match update {
            FarmUpdate::Loading => self.is_loading = true,
            FarmUpdate::Settled => {
                self.is_loading = false;
                self.position.is_loading = false;
                self.position.is_apy_loading = false;
            }
            FarmUpdate::PoolLoaded(pool) => {
                self.is_loading = false;
                self.pool = Some(pool);
            }
            FarmUpdate::PositionLoading => self.position.is_loading = true,
            FarmUpdate::PositionLoaded(balances) => {
                self.position.is_loading = false;
                self.position.balances = balances;
            }
            FarmUpdate::Harvestable(amount) => self.position.balances.harvestable = amount,
            FarmUpdate::ApyLoading => self.position.is_apy_loading = true,
            FarmUpdate::Apy(apy) => {
                self.position.is_apy_loading = false;
                self.position.apy_percent = apy;
            }
        }
    }

    pub fn has_farming_started(&self) -> bool {
        self.pool.as_ref().map_or(false, |p| p.has_farming_started)
    }

    /// Share of the pool held by the account, in percent.
    pub fn stake_percent(&self) -> f64 {
        let balances = &self.position.balances;
        ratio_percent(balances.staked_amount, balances.total_staked)
    }

    /// The account's slice of the daily reward, at whole-percent
    /// granularity.
    pub fn account_daily_reward(&self) -> U256 {
        let daily = self.pool.as_ref().map_or(U256::zero(), |p| p.daily_reward);
        let percent = self.stake_percent().floor().max(0.0) as u64;
        daily.saturating_mul(U256::from(percent)) / U256::from(100u64)
    }
}

/// Reward per day for an interval of `interval_seconds`, counting whole days
/// and never fewer than one.
pub fn daily_reward(interval_reward: U256, interval_seconds: U256) -> U256 {
    let days = interval_seconds / U256::from(SECONDS_PER_DAY);
    let days = if days.is_zero() { U256::one() } else { days };
    interval_reward / days
}

pub async fn load_pool<C: Chain + ?Sized>(
    chain: &C,
    farm: ContractHandle<'_>,
) -> Result<Pool, ChainError> {
    let farm_token_address: Address = farm.read(chain, "farmTokenAddress", ()).await?;
    let has_farming_started: bool = farm.read(chain, "farmingActive", ()).await?;
    let mut pool = Pool {
        farm_address: farm.address,
        farm_token_address,
        has_farming_started,
        ..Pool::default()
    };
    if !has_farming_started {
        return Ok(pool);
    }
    pool.total_reward_supply = farm.read(chain, "totalRewardSupply", ()).await?;
    let interval_reward: U256 = farm.read(chain, "intervalReward", ()).await?;
    let interval_length: U256 = farm.read(chain, "rewardIntervalLength", ()).await?;
    pool.daily_reward = daily_reward(interval_reward, interval_length);
    let next: U256 = farm.read(chain, "nextIntervalTimestamp", ()).await?;
    pool.next_halving_timestamp = next.low_u64();
    Ok(pool)
}

pub async fn load_position<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    pool: &Pool,
    account: Option<Address>,
) -> Result<PositionBalances, ChainError> {
    let farm = contracts.farm_at(pool.farm_address);
    let token = contracts.erc20(pool.farm_token_address);
    let total_staked: U256 = farm.read(chain, "totalStaked", ()).await?;
    let Some(account) = account else {
        return Ok(PositionBalances {
            total_staked,
            ..PositionBalances::default()
        });
    };
    let allowance: U256 = token
        .read(chain, "allowance", (account, pool.farm_address))
        .await?;
    Ok(PositionBalances {
        has_approved: !allowance.is_zero(),
        available_to_stake: token.read(chain, "balanceOf", account).await?,
        staked_amount: farm.read(chain, "singleStaked", account).await?,
        total_staked,
        harvestable: farm.read(chain, "harvestable", account).await?,
        claimable: farm.read(chain, "claimable", account).await?,
        total_harvested: farm.read(chain, "harvested", account).await?,
    })
}

async fn refresh_position<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    farm: Farm,
    pool: &Pool,
    account: Option<Address>,
    updates: &Updates<FarmUpdate>,
) -> bool {
    let balances = match load_position(chain, contracts, pool, account).await {
        Ok(balances) => balances,
        Err(err) => {
            warn!(%farm, "position read failed: {err}");
            return !updates.is_cancelled();
        }
    };
    let total_staked = balances.total_staked;
    if !updates.send(FarmUpdate::PositionLoaded(balances)) || !updates.send(FarmUpdate::ApyLoading)
    {
        return false;
    }
    let apy = pricing::farm_apy(
        chain,
        contracts,
        farm,
        pool.farm_token_address,
        pool.daily_reward,
        total_staked,
    )
    .await;
    debug!(%farm, apy, "apy computed");
    updates.send(FarmUpdate::Apy(apy))
}

/// Drive `farm` for `session` until cancelled. Every notification on
/// `refresh` reloads the position; the harvestable reward is re-read on a
/// timer.
pub async fn run<C: Chain + ?Sized>(
    chain: Option<&C>,
    contracts: &Contracts,
    farm: Farm,
    session: &WalletSession,
    updates: &Updates<FarmUpdate>,
    refresh: &Notify,
) -> Result<(), ConfigError> {
    if session.is_loading {
        return Ok(());
    }
    let chain = match chain {
        Some(chain) if session.can_read() => chain,
        _ => {
            updates.send(FarmUpdate::Settled);
            return Ok(());
        }
    };
    let handle = contracts.farm(farm)?;

    updates.send(FarmUpdate::Loading);
    let pool = match load_pool(chain, handle).await {
        Ok(pool) => pool,
        Err(err) => {
            warn!(%farm, "pool read failed: {err}");
            updates.send(FarmUpdate::Settled);
            return Ok(());
        }
    };
    info!(%farm, started = pool.has_farming_started, "farm loaded");
    let started = pool.has_farming_started;
    if !updates.send(FarmUpdate::PoolLoaded(pool.clone())) {
        return Ok(());
    }
    if !started {
        updates.send(FarmUpdate::Settled);
        return Ok(());
    }

    let account = session.account;
    updates.send(FarmUpdate::PositionLoading);
    if !refresh_position(chain, contracts, farm, &pool, account, updates).await {
        return Ok(());
    }

    let cancel = updates.cancel_token();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = refresh.notified() => {
                if !refresh_position(chain, contracts, farm, &pool, account, updates).await {
                    return Ok(());
                }
            }
            _ = tokio::time::sleep(HARVESTABLE_REFRESH_INTERVAL), if account.is_some() => {
                let Some(account) = account else { continue };
                match handle.read::<_, _, U256>(chain, "harvestable", account).await {
                    Ok(amount) => {
                        if !updates.send(FarmUpdate::Harvestable(amount)) {
                            return Ok(());
                        }
                    }
                    Err(err) => warn!(%farm, "harvestable refresh failed: {err}"),
                }
            }
        }
    }
}
