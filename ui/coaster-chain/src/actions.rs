//! Contract writes behind the dashboard's action buttons.

use ethers::types::{Address, TransactionReceipt, TransactionRequest, U256, U64};
use tracing::{info, warn};

use crate::chain::Chain;
use crate::contracts::Contracts;
use crate::error::{AmountError, ChainError};
use crate::feed::presale::PresaleSnapshot;
use crate::units::to_base_units;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FarmAction {
    Approve,
    Stake(U256),
    StakeAll,
    Withdraw(U256),
    WithdrawAll,
    Harvest,
    Claim,
}

/// Which farm to write to, and its staking token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FarmTarget {
    pub farm: Address,
    pub farm_token: Address,
}

/// Parse `input` as a positive amount no larger than `available`.
pub fn validate_amount(input: &str, available: U256) -> Result<U256, AmountError> {
    let amount = to_base_units(input)?;
    if amount.is_zero() {
        return Err(AmountError::NotPositive);
    }
    if amount > available {
        return Err(AmountError::ExceedsAvailable);
    }
    Ok(amount)
}

/// Contribution amount for the current presale state.
pub fn validate_contribution(input: &str, presale: &PresaleSnapshot) -> Result<U256, AmountError> {
    if !presale.can_contribute() {
        return Err(AmountError::NotEligible);
    }
    validate_amount(input, presale.remaining_contribution())
}

/// Send `tx` and treat anything but a successful receipt as a failure.
pub async fn submit<C: Chain + ?Sized>(
    chain: &C,
    tx: TransactionRequest,
) -> Result<TransactionReceipt, ChainError> {
    let receipt = chain.send_transaction(tx).await?;
    if receipt.status != Some(U64::one()) {
        warn!(tx = ?receipt.transaction_hash, "transaction reverted");
        return Err(ChainError::Reverted(receipt.transaction_hash));
    }
    info!(tx = ?receipt.transaction_hash, block = ?receipt.block_number, "transaction confirmed");
    Ok(receipt)
}

pub async fn execute_farm<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    target: FarmTarget,
    account: Option<Address>,
    action: FarmAction,
) -> Result<TransactionReceipt, ChainError> {
    let account = account.ok_or(ChainError::NoAccount)?;
    let farm = contracts.farm_at(target.farm);
    let token = contracts.erc20(target.farm_token);
    let tx = match action {
        FarmAction::Approve => token.transaction(account, "approve", (target.farm, U256::MAX))?,
        FarmAction::Stake(amount) => farm.transaction(account, "stake", amount)?,
        FarmAction::StakeAll => {
            let balance: U256 = token.read(chain, "balanceOf", account).await?;
            farm.transaction(account, "stake", balance)?
        }
        FarmAction::Withdraw(amount) => farm.transaction(account, "withdraw", amount)?,
        FarmAction::WithdrawAll => {
            let staked: U256 = farm.read(chain, "singleStaked", account).await?;
            farm.transaction(account, "withdraw", staked)?
        }
        FarmAction::Harvest => farm.transaction(account, "harvest", ())?,
        FarmAction::Claim => farm.transaction(account, "claim", ())?,
    };
    info!(?action, farm = ?target.farm, "submitting farm action");
    submit(chain, tx).await
}

pub async fn trigger_buyback<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    account: Option<Address>,
) -> Result<TransactionReceipt, ChainError> {
    let account = account.ok_or(ChainError::NoAccount)?;
    let tx = contracts.buyback().transaction(account, "buyback", ())?;
    info!("submitting buyback");
    submit(chain, tx).await
}

/// Send `amount` of native currency to the presale contract.
pub async fn contribute<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    account: Option<Address>,
    amount: U256,
) -> Result<TransactionReceipt, ChainError> {
    let account = account.ok_or(ChainError::NoAccount)?;
    let tx = TransactionRequest::new()
        .from(account)
        .to(contracts.addresses().presale)
        .value(amount);
    info!(%amount, "submitting presale contribution");
    submit(chain, tx).await
}
