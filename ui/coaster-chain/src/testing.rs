//! In-memory [`Chain`] used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::abi::{self, Token, Tokenizable, Tokenize};
use ethers::types::{
    Address, Bytes, Log, TransactionReceipt, TransactionRequest, H256, U256, U64,
};

use crate::chain::{Chain, LogQuery};
use crate::config::Config;
use crate::contracts::{ContractHandle, Contracts};
use crate::error::ChainError;

pub(crate) fn account() -> Address {
    Address::repeat_byte(0xaa)
}

pub(crate) fn config() -> Config {
    let vars: HashMap<&str, String> = [
        ("RC_ENVIRONMENT", "development".to_string()),
        ("RC_PRESALE_CONTRACT_ADDRESS", format!("0x{}", "11".repeat(20))),
        ("RC_TOKEN_CONTRACT_ADDRESS", format!("0x{}", "22".repeat(20))),
        ("RC_BUYBACK_CONTRACT_ADDRESS", format!("0x{}", "33".repeat(20))),
        ("RC_TREASURY_CONTRACT_ADDRESS", format!("0x{}", "44".repeat(20))),
        ("RC_ROLL_FARM_CONTRACT_ADDRESS", format!("0x{}", "55".repeat(20))),
        ("RC_ROLL_BNB_FARM_CONTRACT_ADDRESS", format!("0x{}", "66".repeat(20))),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub(crate) fn contracts() -> Contracts {
    Contracts::new(&config()).unwrap()
}

pub(crate) fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

#[derive(Default)]
struct State {
    responses: HashMap<(Address, Vec<u8>), Vec<u8>>,
    logs: Vec<Log>,
    fail_calls: bool,
    calls: usize,
    sent: Vec<TransactionRequest>,
    receipt_status: u64,
    accounts: Vec<Address>,
    chain_id: u64,
    block_number: u64,
}

pub(crate) struct MockChain {
    state: Mutex<State>,
}

impl MockChain {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                receipt_status: 1,
                chain_id: 97,
                ..State::default()
            }),
        }
    }

    /// Script the outputs of `function(args)` on `handle`.
    pub(crate) fn respond<T: Tokenize>(
        &self,
        handle: ContractHandle<'_>,
        function: &str,
        args: T,
        outputs: Vec<Token>,
    ) {
        let data = handle.calldata(function, args).unwrap();
        self.state
            .lock()
            .unwrap()
            .responses
            .insert((handle.address, data.to_vec()), abi::encode(&outputs));
    }

    pub(crate) fn respond_value<T: Tokenize, V: Tokenizable>(
        &self,
        handle: ContractHandle<'_>,
        function: &str,
        args: T,
        value: V,
    ) {
        self.respond(handle, function, args, vec![value.into_token()]);
    }

    /// Append an emitted event. Indexed values become topics in order.
    pub(crate) fn push_log(
        &self,
        handle: ContractHandle<'_>,
        event: &'static str,
        indexed: Vec<Token>,
        data: Vec<Token>,
        block: u64,
    ) {
        let event = handle.event(event).unwrap();
        let mut topics = vec![event.signature()];
        topics.extend(
            indexed
                .into_iter()
                .map(|token| H256::from_slice(&abi::encode(&[token]))),
        );
        let mut state = self.state.lock().unwrap();
        let log_index = state.logs.len() as u64;
        state.logs.push(Log {
            address: handle.address,
            topics,
            data: Bytes::from(abi::encode(&data)),
            block_number: Some(U64::from(block)),
            log_index: Some(U256::from(log_index)),
            ..Log::default()
        });
        state.block_number = state.block_number.max(block);
    }

    pub(crate) fn fail_calls(&self) {
        self.state.lock().unwrap().fail_calls = true;
    }

    pub(crate) fn revert_transactions(&self) {
        self.state.lock().unwrap().receipt_status = 0;
    }

    pub(crate) fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub(crate) fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
    }

    pub(crate) fn set_block_number(&self, block: u64) {
        self.state.lock().unwrap().block_number = block;
    }

    pub(crate) fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub(crate) fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl Chain for MockChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ChainError> {
        let mut state = self.state.lock().unwrap();
        if state.accounts.is_empty() {
            state.accounts.push(account());
        }
        Ok(state.accounts.clone())
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.state.lock().unwrap().block_number)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_calls {
            return Err(ChainError::Rpc("connection refused".to_string()));
        }
        state
            .responses
            .get(&(to, data.to_vec()))
            .cloned()
            .map(Bytes::from)
            .ok_or_else(|| ChainError::Rpc(format!("execution reverted: {to:?} {data}")))
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, ChainError> {
        let state = self.state.lock().unwrap();
        let to_block = query.to_block.unwrap_or(state.block_number);
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address == query.address)
            .filter(|log| {
                let block = log.block_number.map_or(0, |b| b.as_u64());
                block >= query.from_block && block <= to_block
            })
            .filter(|log| {
                query.topics.iter().enumerate().all(|(i, topic)| match topic {
                    Some(topic) => log.topics.get(i) == Some(topic),
                    None => true,
                })
            })
            .cloned()
            .collect())
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(tx);
        Ok(TransactionReceipt {
            status: Some(U64::from(state.receipt_status)),
            transaction_hash: H256::repeat_byte(state.sent.len() as u8),
            ..TransactionReceipt::default()
        })
    }
}
