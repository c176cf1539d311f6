use ethers::types::{Address, U256};
use tracing::{info, warn};

use super::Updates;
use crate::chain::Chain;
use crate::contracts::Contracts;
use crate::session::WalletSession;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreasuryState {
    pub is_loading: bool,
    pub balance: U256,
    pub contract_address: Address,
}

impl TreasuryState {
    pub fn new(contract_address: Address) -> Self {
        Self {
            is_loading: true,
            balance: U256::zero(),
            contract_address,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreasuryUpdate {
    Settled,
    Balance(U256),
}

impl TreasuryState {
    pub fn apply(&mut self, update: TreasuryUpdate) {
        match update {
            TreasuryUpdate::Settled => self.is_loading = false,
            TreasuryUpdate::Balance(balance) => {
                self.is_loading = false;
                self.balance = balance;
            }
        }
    }
}

/// One read of the treasury's token balance.
pub async fn run<C: Chain + ?Sized>(
    chain: Option<&C>,
    contracts: &Contracts,
    session: &WalletSession,
    updates: &Updates<TreasuryUpdate>,
) {
    if session.is_loading {
        return;
    }
    let chain = match chain {
        Some(chain) if session.can_read() => chain,
        _ => {
            updates.send(TreasuryUpdate::Settled);
            return;
        }
    };
    let treasury = contracts.addresses().treasury;
    match contracts
        .token()
        .read::<_, _, U256>(chain, "balanceOf", treasury)
        .await
    {
        Ok(balance) => {
            info!(%balance, "treasury balance loaded");
            updates.send(TreasuryUpdate::Balance(balance));
        }
        Err(err) => {
            warn!("treasury read failed: {err}");
            updates.send(TreasuryUpdate::Settled);
        }
    }
}
