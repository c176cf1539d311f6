//! Typed handles pairing a configured address with its interface descriptor.

use ethers::abi::{Detokenize, Event, Tokenize};
use ethers::contract::BaseContract;
use ethers::types::{Address, Bytes, TransactionRequest};
use tracing::debug;

use crate::abi::{self, Abi};
use crate::chain::Chain;
use crate::config::{Config, ContractAddresses};
use crate::error::{ChainError, ConfigError};
use crate::farm::Farm;

#[derive(Clone, Debug)]
pub struct Contracts {
    abi: Abi,
    addresses: ContractAddresses,
}

impl Contracts {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            abi: Abi::new()?,
            addresses: config.addresses.clone(),
        })
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    pub fn presale(&self) -> ContractHandle<'_> {
        ContractHandle::new("presale", self.addresses.presale, &self.abi.presale)
    }

    pub fn buyback(&self) -> ContractHandle<'_> {
        ContractHandle::new("buyback", self.addresses.buyback, &self.abi.buyback)
    }

    /// The ROLL token.
    pub fn token(&self) -> ContractHandle<'_> {
        self.erc20(self.addresses.token)
    }

    pub fn erc20(&self, address: Address) -> ContractHandle<'_> {
        ContractHandle::new("ERC-20", address, &self.abi.erc20)
    }

    pub fn farm(&self, farm: Farm) -> Result<ContractHandle<'_>, ConfigError> {
        Ok(self.farm_at(self.addresses.farm(farm)?))
    }

    pub fn farm_at(&self, address: Address) -> ContractHandle<'_> {
        ContractHandle::new("farm", address, &self.abi.farm)
    }

    pub fn factory(&self) -> ContractHandle<'_> {
        ContractHandle::new(
            "PancakeSwap factory",
            self.addresses.pancake_factory,
            &self.abi.factory,
        )
    }

    pub fn pair(&self, address: Address) -> ContractHandle<'_> {
        ContractHandle::new("PancakeSwap pair", address, &self.abi.pair)
    }
}

/// One deployed contract: where it lives and how to talk to it.
#[derive(Clone, Copy, Debug)]
pub struct ContractHandle<'a> {
    pub name: &'static str,
    pub address: Address,
    abi: &'a BaseContract,
}

impl<'a> ContractHandle<'a> {
    fn new(name: &'static str, address: Address, abi: &'a BaseContract) -> Self {
        Self { name, address, abi }
    }

    pub fn abi(&self) -> &'a BaseContract {
        self.abi
    }

    pub fn calldata<T: Tokenize>(&self, function: &str, args: T) -> Result<Bytes, ChainError> {
        Ok(self.abi.encode(function, args)?)
    }

    /// `eth_call` a view function and decode its outputs.
    pub async fn read<C, T, D>(&self, chain: &C, function: &str, args: T) -> Result<D, ChainError>
    where
        C: Chain + ?Sized,
        T: Tokenize,
        D: Detokenize,
    {
        let data = self.calldata(function, args)?;
        debug!(contract = self.name, address = ?self.address, function, "read");
        let output = chain.call(self.address, data).await?;
        Ok(self.abi.decode_output(function, output)?)
    }

    pub fn event(&self, name: &'static str) -> Result<&'a Event, ConfigError> {
        abi::event(self.abi, self.name, name)
    }

    /// An unsigned call to `function`, sent from `from`.
    pub fn transaction<T: Tokenize>(
        &self,
        from: Address,
        function: &str,
        args: T,
    ) -> Result<TransactionRequest, ChainError> {
        Ok(TransactionRequest::new()
            .from(from)
            .to(self.address)
            .data(self.calldata(function, args)?))
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::{NameOrAddress, U256};

    use super::*;
    use crate::testing::{self, MockChain};

    #[tokio::test]
    async fn test_read_decodes_outputs() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let account = testing::account();
        chain.respond_value(contracts.token(), "balanceOf", account, U256::from(42u64));

        let balance: U256 = contracts
            .token()
            .read(&chain, "balanceOf", account)
            .await
            .unwrap();
        assert_eq!(balance, U256::from(42u64));
        assert_eq!(chain.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_function_is_an_abi_error() {
        let contracts = testing::contracts();
        let chain = MockChain::new();
        let result: Result<U256, _> = contracts.presale().read(&chain, "noSuchThing", ()).await;
        assert!(matches!(result, Err(ChainError::Abi(_))));
        assert_eq!(chain.call_count(), 0);
    }

    #[test]
    fn test_farm_handles_follow_config() {
        let contracts = testing::contracts();
        for farm in Farm::ALL {
            let handle = contracts.farm(farm).unwrap();
            assert_eq!(handle.address, contracts.addresses().farm(farm).unwrap());
        }
    }

    #[test]
    fn test_transaction_targets_contract() {
        let contracts = testing::contracts();
        let account = testing::account();
        let tx = contracts.buyback().transaction(account, "buyback", ()).unwrap();
        assert_eq!(tx.from, Some(account));
        assert_eq!(
            tx.to,
            Some(NameOrAddress::Address(contracts.addresses().buyback))
        );
        assert_eq!(
            tx.data.unwrap(),
            contracts.buyback().calldata("buyback", ()).unwrap()
        );
    }
}
