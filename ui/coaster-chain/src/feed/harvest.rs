//! Harvest history: the account's harvest chunks, rebuilt from
//! `HarvestCreated` logs, and per-chunk claim details from `RewardClaimed`.

use ethers::types::{Address, U256};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{info, warn};

use super::{address_topic, replay, uint_topic, EventData, Updates};
use crate::chain::{Chain, LogQuery};
use crate::contracts::{ContractHandle, Contracts};
use crate::error::{ChainError, ConfigError};
use crate::farm::Farm;
use crate::session::WalletSession;

pub const HARVEST_STEP_PERCENT: u32 = 10;
pub const HARVEST_INTERVAL_SECONDS: u64 = 86_400;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestChunk {
    pub timestamp: u64,
    pub amount: U256,
    pub claimed_amount: U256,
    pub is_claimed_amount_loading: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestHistory {
    pub is_loading: bool,
    pub is_data_valid: bool,
    pub is_account_connected: bool,
    pub has_farming_started: bool,
    pub harvest_step_percent: u32,
    pub harvest_interval: u64,
    pub chunks: Vec<HarvestChunk>,
}

impl Default for HarvestHistory {
    fn default() -> Self {
        Self {
            is_loading: true,
            is_data_valid: true,
            is_account_connected: false,
            has_farming_started: false,
            harvest_step_percent: 0,
            harvest_interval: 0,
            chunks: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HarvestUpdate {
    Loading { is_account_connected: bool },
    /// No provider or unsupported network.
    Invalid,
    Failed,
    Loaded {
        has_farming_started: bool,
        chunks: Vec<HarvestChunk>,
    },
    ChunkClaimed { index: usize, claimed_amount: U256 },
}

impl HarvestHistory {
    pub fn apply(&mut self, update: HarvestUpdate) {
        match update {
            HarvestUpdate::Loading {
                is_account_connected,
            } => {
                self.is_loading = true;
                self.is_data_valid = true;
                self.is_account_connected = is_account_connected;
            }
            HarvestUpdate::Invalid => {
                self.is_loading = false;
                self.is_data_valid = false;
            }
            HarvestUpdate::Failed => self.is_loading = false,
            HarvestUpdate::Loaded {
                has_farming_started,
                chunks,
            } => {
                self.is_loading = false;
                self.has_farming_started = has_farming_started;
                self.harvest_step_percent = HARVEST_STEP_PERCENT;
                self.harvest_interval = HARVEST_INTERVAL_SECONDS;
                self.chunks = chunks;
            }
            HarvestUpdate::ChunkClaimed {
                index,
                claimed_amount,
            } => {
                if let Some(chunk) = self.chunks.get_mut(index) {
                    chunk.claimed_amount = claimed_amount;
                    chunk.is_claimed_amount_loading = false;
                }
            }
        }
    }
}

fn chunk_from(event: &EventData) -> Result<HarvestChunk, ChainError> {
    Ok(HarvestChunk {
        timestamp: event.uint("_timestamp")?.low_u64(),
        amount: event.uint("_amount")?,
        claimed_amount: U256::zero(),
        is_claimed_amount_loading: true,
    })
}

/// Every chunk `staker` ever harvested, in emission order.
pub async fn load_chunks<C: Chain + ?Sized>(
    chain: &C,
    farm: ContractHandle<'_>,
    staker: Address,
) -> Result<Vec<HarvestChunk>, ChainError> {
    let event = farm.event("HarvestCreated")?;
    let query = LogQuery::new(farm.address, event.signature()).topic1(address_topic(staker));
    replay(chain, event, query)
        .await?
        .iter()
        .map(chunk_from)
        .collect()
}

/// Claimed part of chunk `index`. The view returns
/// `(timestamp, claimed, total)`.
pub async fn load_claimed<C: Chain + ?Sized>(
    chain: &C,
    farm: ContractHandle<'_>,
    staker: Address,
    index: usize,
) -> Result<U256, ChainError> {
    let (_, claimed, _): (U256, U256, U256) = farm
        .read(chain, "harvestChunk", (staker, U256::from(index)))
        .await?;
    Ok(claimed)
}

pub async fn run<C: Chain + ?Sized>(
    chain: Option<&C>,
    contracts: &Contracts,
    farm: Farm,
    session: &WalletSession,
    updates: &Updates<HarvestUpdate>,
) -> Result<(), ConfigError> {
    if session.is_loading {
        return Ok(());
    }
    let chain = match chain {
        Some(chain) if session.can_read() => chain,
        _ => {
            updates.send(HarvestUpdate::Invalid);
            return Ok(());
        }
    };
    let handle = contracts.farm(farm)?;
    handle.event("HarvestCreated")?;

    let account = session.account;
    updates.send(HarvestUpdate::Loading {
        is_account_connected: account.is_some(),
    });

    let loaded = async {
        let has_farming_started: bool = handle.read(chain, "farmingActive", ()).await?;
        let chunks = match account {
            Some(account) => load_chunks(chain, handle, account).await?,
            None => Vec::new(),
        };
        Ok::<_, ChainError>((has_farming_started, chunks))
    };
    let (has_farming_started, chunks) = match loaded.await {
        Ok(loaded) => loaded,
        Err(err) => {
            warn!(%farm, "harvest history read failed: {err}");
            updates.send(HarvestUpdate::Failed);
            return Ok(());
        }
    };
    info!(%farm, chunks = chunks.len(), "harvest history loaded");
    let count = chunks.len();
    if !updates.send(HarvestUpdate::Loaded {
        has_farming_started,
        chunks,
    }) {
        return Ok(());
    }

    let Some(account) = account else {
        return Ok(());
    };
    let mut pending: FuturesUnordered<_> = (0..count)
        .map(|index| async move { (index, load_claimed(chain, handle, account, index).await) })
        .collect();
    let cancel = updates.cancel_token();
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            next = pending.next() => next,
        };
        let Some((index, result)) = next else {
            return Ok(());
        };
        match result {
            Ok(claimed_amount) => {
                if !updates.send(HarvestUpdate::ChunkClaimed {
                    index,
                    claimed_amount,
                }) {
                    return Ok(());
                }
            }
            Err(err) => warn!(%farm, index, "chunk claimed amount read failed: {err}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestClaim {
    pub chunk_index: usize,
    pub timestamp: u64,
    pub amount: U256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HarvestChunkClaims {
    pub chunk_index: Option<usize>,
    pub is_loading: bool,
    pub claims: Vec<HarvestClaim>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimsUpdate {
    Loading(usize),
    Loaded(Vec<HarvestClaim>),
    Failed,
}

impl HarvestChunkClaims {
    pub fn apply(&mut self, update: ClaimsUpdate) {
        match update {
            ClaimsUpdate::Loading(index) => {
                self.chunk_index = Some(index);
                self.is_loading = true;
            }
            ClaimsUpdate::Loaded(claims) => {
                self.is_loading = false;
                self.claims = claims;
            }
            ClaimsUpdate::Failed => self.is_loading = false,
        }
    }
}

/// Every `RewardClaimed` for `staker` against chunk `index`.
pub async fn load_claims<C: Chain + ?Sized>(
    chain: &C,
    farm: ContractHandle<'_>,
    staker: Address,
    index: usize,
) -> Result<Vec<HarvestClaim>, ChainError> {
    let event = farm.event("RewardClaimed")?;
    let query = LogQuery::new(farm.address, event.signature())
        .topic1(address_topic(staker))
        .topic2(uint_topic(U256::from(index)));
    replay(chain, event, query)
        .await?
        .iter()
        .map(|claim| {
            Ok(HarvestClaim {
                chunk_index: claim.uint("_harvestId")?.low_u64() as usize,
                timestamp: claim.uint("_timestamp")?.low_u64(),
                amount: claim.uint("_amount")?,
            })
        })
        .collect()
}

/// Load claim details for one chunk. Returns whether the claims arrived, so
/// the caller can fire its completion callback.
pub async fn request_claims<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    farm: Farm,
    staker: Address,
    index: usize,
    updates: &Updates<ClaimsUpdate>,
) -> Result<bool, ConfigError> {
    let handle = contracts.farm(farm)?;
    if !updates.send(ClaimsUpdate::Loading(index)) {
        return Ok(false);
    }
    match load_claims(chain, handle, staker, index).await {
        Ok(claims) => Ok(updates.send(ClaimsUpdate::Loaded(claims))),
        Err(err) => {
            warn!(%farm, index, "claim details read failed: {err}");
            updates.send(ClaimsUpdate::Failed);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use ethers::abi::Token;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::config::Environment;
    use crate::session::SessionEvent;
    use crate::testing::{self, ether, MockChain};

    fn harvest_created(
        chain: &MockChain,
        farm: ContractHandle<'_>,
        staker: Address,
        id: u64,
        amount: U256,
        block: u64,
    ) {
        chain.push_log(
            farm,
            "HarvestCreated",
            vec![Token::Address(staker)],
            vec![
                Token::Uint(U256::from(id)),
                Token::Uint(U256::from(1_600_000_000 + block)),
                Token::Uint(amount),
            ],
            block,
        );
    }

    #[tokio::test]
    async fn test_chunks_follow_block_order() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let farm = contracts.farm(Farm::Roll).unwrap();
        let account = testing::account();
        harvest_created(&chain, farm, account, 2, ether(3), 15);
        harvest_created(&chain, farm, account, 0, ether(1), 10);
        harvest_created(&chain, farm, Address::repeat_byte(0x01), 0, ether(9), 11);
        harvest_created(&chain, farm, account, 1, ether(2), 12);

        let chunks = load_chunks(&chain, farm, account).await.unwrap();
        let amounts: Vec<_> = chunks.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![ether(1), ether(2), ether(3)]);
        assert_eq!(chunks[0].timestamp, 1_600_000_010);
        assert!(chunks.iter().all(|c| c.is_claimed_amount_loading));
    }

    #[tokio::test]
    async fn test_run_patches_claimed_amounts() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let farm = contracts.farm(Farm::Roll).unwrap();
        let account = testing::account();
        harvest_created(&chain, farm, account, 0, ether(10), 10);
        harvest_created(&chain, farm, account, 1, ether(20), 12);
        chain.respond_value(farm, "farmingActive", (), true);
        for (index, claimed) in [(0u64, ether(4)), (1, ether(0))] {
            chain.respond(
                farm,
                "harvestChunk",
                (account, U256::from(index)),
                vec![
                    Token::Uint(U256::from(1_600_000_000u64)),
                    Token::Uint(claimed),
                    Token::Uint(ether(10)),
                ],
            );
        }

        let mut session = WalletSession::new(Environment::Development);
        session.apply(SessionEvent::Connected {
            chain_id: 97,
            account: Some(account),
        });
        let (updates, mut rx) = Updates::channel(CancellationToken::new());
        run(Some(&chain), &contracts, Farm::Roll, &session, &updates)
            .await
            .unwrap();

        let mut history = HarvestHistory::default();
        while let Ok(update) = rx.try_recv() {
            history.apply(update);
        }
        assert!(!history.is_loading);
        assert!(history.is_account_connected);
        assert!(history.has_farming_started);
        assert_eq!(history.harvest_step_percent, 10);
        assert_eq!(history.chunks.len(), 2);
        assert_eq!(history.chunks[0].claimed_amount, ether(4));
        assert!(history
            .chunks
            .iter()
            .all(|c| !c.is_claimed_amount_loading));
    }

    #[test]
    fn test_stale_chunk_patch_is_ignored() {
        let mut history = HarvestHistory::default();
        history.apply(HarvestUpdate::Loaded {
            has_farming_started: true,
            chunks: vec![],
        });
        history.apply(HarvestUpdate::ChunkClaimed {
            index: 3,
            claimed_amount: ether(1),
        });
        assert!(history.chunks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_feed_sends_nothing_more() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let farm = contracts.farm(Farm::Roll).unwrap();
        chain.respond_value(farm, "farmingActive", (), true);
        let cancel = CancellationToken::new();
        let (updates, mut rx) = Updates::channel(cancel.clone());
        cancel.cancel();

        let mut session = WalletSession::new(Environment::Development);
        session.apply(SessionEvent::Connected {
            chain_id: 97,
            account: None,
        });
        run(Some(&chain), &contracts, Farm::Roll, &session, &updates)
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_provider_marks_data_invalid() {
        let contracts = testing::contracts();
        let mut session = WalletSession::new(Environment::Development);
        session.apply(SessionEvent::Unavailable);
        let (updates, mut rx) = Updates::channel(CancellationToken::new());

        run::<MockChain>(None, &contracts, Farm::Roll, &session, &updates)
            .await
            .unwrap();

        let mut history = HarvestHistory::default();
        history.apply(rx.try_recv().unwrap());
        assert!(!history.is_loading);
        assert!(!history.is_data_valid);
    }

    #[tokio::test]
    async fn test_claims_filtered_by_chunk() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let farm = contracts.farm(Farm::RollBnb).unwrap();
        let account = testing::account();
        for (id, amount, block) in [(0u64, 1u64, 20u64), (1, 2, 21), (0, 3, 22)] {
            chain.push_log(
                farm,
                "RewardClaimed",
                vec![Token::Address(account), Token::Uint(U256::from(id))],
                vec![Token::Uint(U256::from(1_600_000_000u64)), Token::Uint(ether(amount))],
                block,
            );
        }

        let (updates, mut rx) = Updates::channel(CancellationToken::new());
        let loaded = request_claims(&chain, &contracts, Farm::RollBnb, account, 0, &updates)
            .await
            .unwrap();
        assert!(loaded);

        let mut claims = HarvestChunkClaims::default();
        while let Ok(update) = rx.try_recv() {
            claims.apply(update);
        }
        assert_eq!(claims.chunk_index, Some(0));
        assert!(!claims.is_loading);
        let amounts: Vec<_> = claims.claims.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![ether(1), ether(3)]);
        assert!(claims.claims.iter().all(|c| c.chunk_index == 0));
    }
}
