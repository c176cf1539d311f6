//! Snapshot feeds.
//!
//! A feed does one initial batch of reads, then watches contract logs and
//! timers. It never touches UI state directly: every change is sent as a
//! typed update through [`Updates`], and the owner folds updates into its
//! snapshot with that snapshot's `apply`. Cancelling the token stops the
//! feed and suppresses anything still in flight.

use std::time::Duration;

use ethers::abi::{Event, LogParam, RawLog, Token};
use ethers::types::{Address, Log, H256, U256};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::chain::{Chain, LogQuery};
use crate::contracts::ContractHandle;
use crate::error::{ChainError, ConfigError};

pub mod buyback;
pub mod farm;
pub mod harvest;
pub mod presale;
pub mod treasury;

pub const LOG_POLL_INTERVAL: Duration = Duration::from_secs(4);
pub const HARVESTABLE_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Sending half of a feed: an unbounded channel guarded by a cancellation
/// token.
pub struct Updates<U> {
    tx: mpsc::UnboundedSender<U>,
    cancel: CancellationToken,
}

impl<U> Clone for Updates<U> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<U> Updates<U> {
    pub fn channel(cancel: CancellationToken) -> (Self, mpsc::UnboundedReceiver<U>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, cancel }, rx)
    }

    /// Returns `false` once the feed has been torn down.
    pub fn send(&self, update: U) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(update).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Sleep for `period` unless cancelled first. `false` means stop.
pub async fn tick(cancel: &CancellationToken, period: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(period) => true,
    }
}

/// A decoded log with its position in the chain.
#[derive(Clone, Debug)]
pub struct EventData {
    pub block: u64,
    pub log_index: u64,
    params: Vec<LogParam>,
}

impl EventData {
    pub fn decode(event: &Event, log: &Log) -> Result<Self, ChainError> {
        let parsed = event.parse_log(RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        })?;
        Ok(Self {
            block: log.block_number.map_or(0, |b| b.as_u64()),
            log_index: log.log_index.map_or(0, |i| i.as_u64()),
            params: parsed.params,
        })
    }

    fn param(&self, name: &str) -> Result<&Token, ChainError> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
            .ok_or_else(|| ChainError::Decode(format!("event has no field {name}")))
    }

    pub fn uint(&self, name: &str) -> Result<U256, ChainError> {
        self.param(name)?
            .clone()
            .into_uint()
            .ok_or_else(|| ChainError::Decode(format!("field {name} is not a uint")))
    }

    pub fn address(&self, name: &str) -> Result<Address, ChainError> {
        self.param(name)?
            .clone()
            .into_address()
            .ok_or_else(|| ChainError::Decode(format!("field {name} is not an address")))
    }
}

/// Left-pad an address into an indexed-topic value.
pub fn address_topic(address: Address) -> H256 {
    H256::from(address)
}

pub fn uint_topic(value: U256) -> H256 {
    let mut topic = [0u8; 32];
    value.to_big_endian(&mut topic);
    H256::from(topic)
}

/// Fetch every matching log from block 0 to latest, in emission order.
pub async fn replay<C: Chain + ?Sized>(
    chain: &C,
    event: &Event,
    query: LogQuery,
) -> Result<Vec<EventData>, ChainError> {
    let logs = chain.logs(&query.blocks(0, None)).await?;
    let mut events = decode_logs(event, &logs);
    events.sort_by_key(|e| (e.block, e.log_index));
    Ok(events)
}

/// Decode what can be decoded. A log that does not match its descriptor is
/// logged and skipped so it cannot hold back the ones after it.
fn decode_logs(event: &Event, logs: &[Log]) -> Vec<EventData> {
    logs.iter()
        .filter_map(|log| match EventData::decode(event, log) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!(
                    event = %event.name,
                    block = ?log.block_number,
                    "skipping undecodable log: {err}"
                );
                None
            }
        })
        .collect()
}

/// Polls one event type on one contract, remembering the next unseen block.
pub struct Subscription<'a> {
    name: &'static str,
    event: &'a Event,
    query: LogQuery,
    next_block: Option<u64>,
}

impl<'a> Subscription<'a> {
    /// Fails when the contract's descriptor does not declare `name`.
    pub fn open(contract: &ContractHandle<'a>, name: &'static str) -> Result<Self, ConfigError> {
        let event = contract.event(name)?;
        Ok(Self {
            name,
            event,
            query: LogQuery::new(contract.address, event.signature()),
            next_block: None,
        })
    }

    pub fn topic1(mut self, topic: H256) -> Self {
        self.query = self.query.topic1(topic);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Events in `(next_block, latest]`. The first poll only records where
    /// to start.
    pub async fn poll<C: Chain + ?Sized>(
        &mut self,
        chain: &C,
        latest: u64,
    ) -> Result<Vec<EventData>, ChainError> {
        let from = match self.next_block {
            None => {
                self.next_block = Some(latest + 1);
                return Ok(Vec::new());
            }
            Some(from) if from > latest => return Ok(Vec::new()),
            Some(from) => from,
        };
        let query = self.query.clone().blocks(from, Some(latest));
        let logs = chain.logs(&query).await?;
        self.next_block = Some(latest + 1);
        Ok(decode_logs(self.event, &logs))
    }
}

/// All subscriptions of one feed, polled together.
pub struct Subscriptions<'a> {
    subscriptions: Vec<Subscription<'a>>,
}

impl<'a> Subscriptions<'a> {
    pub fn new(subscriptions: Vec<Subscription<'a>>) -> Self {
        Self { subscriptions }
    }

    /// Start watching from the current head. Call before the initial reads
    /// so nothing emitted during them is lost.
    pub async fn anchor<C: Chain + ?Sized>(&mut self, chain: &C) {
        match chain.block_number().await {
            Ok(latest) => {
                for subscription in &mut self.subscriptions {
                    subscription.next_block = Some(latest + 1);
                }
            }
            Err(err) => warn!("could not anchor log subscriptions: {err}"),
        }
    }

    /// Wait for the next non-empty batch of events, ordered by block and log
    /// index. `None` once cancelled.
    pub async fn next_batch<C: Chain + ?Sized>(
        &mut self,
        chain: &C,
        cancel: &CancellationToken,
    ) -> Option<Vec<(&'static str, EventData)>> {
        loop {
            if !tick(cancel, LOG_POLL_INTERVAL).await {
                return None;
            }
            let latest = match chain.block_number().await {
                Ok(latest) => latest,
                Err(err) => {
                    warn!("block number poll failed: {err}");
                    continue;
                }
            };
            let mut batch = Vec::new();
            for subscription in &mut self.subscriptions {
                match subscription.poll(chain, latest).await {
                    Ok(events) => batch.extend(events.into_iter().map(|e| (subscription.name, e))),
                    Err(err) => warn!(event = subscription.name, "log poll failed: {err}"),
                }
            }
            if cancel.is_cancelled() {
                return None;
            }
            if !batch.is_empty() {
                batch.sort_by_key(|(_, e)| (e.block, e.log_index));
                return Some(batch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, MockChain};

    #[test]
    fn test_updates_stop_after_cancel() {
        let cancel = CancellationToken::new();
        let (updates, mut rx) = Updates::channel(cancel.clone());
        assert!(updates.send(1));
        cancel.cancel();
        assert!(!updates.send(2));
        assert_eq!(rx.try_recv().ok(), Some(1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_event_is_fatal() {
        let contracts = testing::contracts();
        assert!(matches!(
            Subscription::open(&contracts.presale(), "Bogus"),
            Err(ConfigError::MissingEvent { event: "Bogus", .. })
        ));
    }

    #[tokio::test]
    async fn test_subscription_sees_only_new_blocks() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let presale = contracts.presale();
        chain.push_log(presale, "PresaleStarted", vec![], vec![], 5);

        let mut sub = Subscription::open(&presale, "PresaleStarted").unwrap();
        assert!(sub.poll(&chain, 5).await.unwrap().is_empty());

        chain.push_log(presale, "PresaleStarted", vec![], vec![], 7);
        let events = sub.poll(&chain, 7).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].block, 7);
        assert!(sub.poll(&chain, 7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_log_does_not_stall_subscription() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let buyback = contracts.buyback();
        let mut sub = Subscription::open(&buyback, "SingleBuybackExecuted").unwrap();
        chain.set_block_number(5);
        assert!(sub.poll(&chain, 5).await.unwrap().is_empty());

        // no data for the three non-indexed fields
        chain.push_log(buyback, "SingleBuybackExecuted", vec![], vec![], 6);
        chain.push_log(
            buyback,
            "SingleBuybackExecuted",
            vec![],
            vec![
                Token::Address(testing::account()),
                Token::Uint(U256::from(1u64)),
                Token::Uint(U256::from(2u64)),
            ],
            7,
        );
        let events = sub.poll(&chain, 7).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].block, 7);
        assert_eq!(events[0].uint("_buybackAmount").unwrap(), U256::from(2u64));

        chain.set_block_number(9);
        assert!(sub.poll(&chain, 9).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replay_skips_undecodable_logs() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let buyback = contracts.buyback();
        chain.push_log(buyback, "SingleBuybackExecuted", vec![], vec![], 3);
        chain.push_log(
            buyback,
            "SingleBuybackExecuted",
            vec![],
            vec![
                Token::Address(testing::account()),
                Token::Uint(U256::one()),
                Token::Uint(U256::one()),
            ],
            4,
        );
        let event = buyback.event("SingleBuybackExecuted").unwrap();
        let query = LogQuery::new(buyback.address, event.signature());
        let events = replay(&chain, event, query).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].block, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_batch_returns_none_when_cancelled() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let presale = contracts.presale();
        let mut subs = Subscriptions::new(vec![Subscription::open(&presale, "PresaleEnded").unwrap()]);
        subs.anchor(&chain).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(subs.next_batch(&chain, &cancel).await.is_none());
    }

    #[test]
    fn test_uint_topic() {
        let topic = uint_topic(U256::from(3u64));
        assert_eq!(topic.as_bytes()[31], 3);
        assert!(topic.as_bytes()[..31].iter().all(|b| *b == 0));
    }
}
