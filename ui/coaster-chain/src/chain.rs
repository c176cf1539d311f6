//! The wallet provider boundary.
//!
//! Everything the dashboard needs from the provider goes through [`Chain`]:
//! the ethers-backed [`RpcChain`] talks to a real wallet endpoint, tests use
//! an in-memory mock.

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, BlockNumber, Bytes, Filter, Log, TransactionReceipt, TransactionRequest,
    ValueOrArray, H256,
};
use tracing::{debug, info};

use crate::error::ChainError;

/// A log query: one contract, up to three topics, an inclusive block range.
/// `to_block == None` means "latest".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub topics: [Option<H256>; 3],
    pub from_block: u64,
    pub to_block: Option<u64>,
}

impl LogQuery {
    pub fn new(address: Address, signature: H256) -> Self {
        Self {
            address,
            topics: [Some(signature), None, None],
            from_block: 0,
            to_block: None,
        }
    }

    pub fn topic1(mut self, topic: H256) -> Self {
        self.topics[1] = Some(topic);
        self
    }

    pub fn topic2(mut self, topic: H256) -> Self {
        self.topics[2] = Some(topic);
        self
    }

    pub fn blocks(mut self, from: u64, to: Option<u64>) -> Self {
        self.from_block = from;
        self.to_block = to;
        self
    }
}

#[async_trait]
pub trait Chain: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Accounts the wallet already exposes to us (`eth_accounts`).
    async fn accounts(&self) -> Result<Vec<Address>, ChainError>;

    /// Ask the wallet for account access (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<Address>, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Read-only contract call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, ChainError>;

    /// Submit a transaction for the wallet to sign and wait for inclusion.
    async fn send_transaction(&self, tx: TransactionRequest)
        -> Result<TransactionReceipt, ChainError>;
}

/// [`Chain`] over a wallet JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct RpcChain {
    provider: Provider<Http>,
}

impl RpcChain {
    pub fn new(url: &str) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| ChainError::Rpc(format!("invalid provider url '{url}': {e}")))?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl Chain for RpcChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_chainid().await?.as_u64())
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self
            .provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await?)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_block_number().await?.as_u64())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        Ok(self.provider.call(&tx, None).await?)
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, ChainError> {
        let to_block = query
            .to_block
            .map(BlockNumber::from)
            .unwrap_or(BlockNumber::Latest);
        let mut filter = Filter::new()
            .address(query.address)
            .from_block(query.from_block)
            .to_block(to_block);
        if let Some(topic) = query.topics[0] {
            filter = filter.topic0(ValueOrArray::Value(Some(topic)));
        }
        if let Some(topic) = query.topics[1] {
            filter = filter.topic1(ValueOrArray::Value(Some(topic)));
        }
        if let Some(topic) = query.topics[2] {
            filter = filter.topic2(ValueOrArray::Value(Some(topic)));
        }
        let logs = self.provider.get_logs(&filter).await?;
        debug!(address = ?query.address, count = logs.len(), "fetched logs");
        Ok(logs)
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ChainError> {
        let pending = self.provider.send_transaction(tx, None).await?;
        let hash = *pending;
        info!(tx = ?hash, "transaction submitted");
        pending.await?.ok_or(ChainError::Dropped(hash))
    }
}
