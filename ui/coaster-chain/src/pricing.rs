//! PancakeSwap price lookups and the APY estimate built on them.

use ethers::types::{Address, U256};
use tracing::warn;

use crate::chain::Chain;
use crate::contracts::Contracts;
use crate::error::ChainError;
use crate::farm::{Farm, PriceStrategy};
use crate::units::to_f64;

pub const DAYS_PER_YEAR: f64 = 365.0;

/// Mid price of one `token` in the wrapped native currency.
pub async fn token_price_in_native<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    token: Address,
) -> Result<f64, ChainError> {
    let wrapped = contracts.addresses().wrapped_native;
    let pair: Address = contracts
        .factory()
        .read(chain, "getPair", (token, wrapped))
        .await?;
    if pair.is_zero() {
        return Err(ChainError::MissingPair(token));
    }
    let pair = contracts.pair(pair);
    let token0: Address = pair.read(chain, "token0", ()).await?;
    let (reserve0, reserve1, _): (U256, U256, U256) = pair.read(chain, "getReserves", ()).await?;
    let (token_reserve, native_reserve) = if token0 == token {
        (reserve0, reserve1)
    } else {
        (reserve1, reserve0)
    };
    mid_price(token_reserve, native_reserve).ok_or(ChainError::MissingPair(token))
}

/// Native received per token at the current reserves, ignoring fees.
pub fn mid_price(token_reserve: U256, native_reserve: U256) -> Option<f64> {
    let token_reserve = to_f64(token_reserve);
    if token_reserve > 0.0 {
        Some(to_f64(native_reserve) / token_reserve)
    } else {
        None
    }
}

/// Value of one LP token in native currency.
pub async fn lp_token_price_in_native<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    lp_token: Address,
) -> Result<f64, ChainError> {
    let wrapped = contracts.erc20(contracts.addresses().wrapped_native);
    let native_reserve: U256 = wrapped.read(chain, "balanceOf", lp_token).await?;
    let supply: U256 = contracts.erc20(lp_token).read(chain, "totalSupply", ()).await?;
    Ok(lp_value(native_reserve, supply))
}

/// `2 * native_reserve / supply`, with an empty supply counted as one token.
pub fn lp_value(native_reserve: U256, supply: U256) -> f64 {
    let supply = match to_f64(supply) {
        s if s > 0.0 => s,
        _ => 1.0,
    };
    2.0 * to_f64(native_reserve) / supply
}

pub fn apy_percent(daily_reward: f64, total_staked: f64, multiplier: f64, ceiling: f64) -> f64 {
    if total_staked <= 0.0 {
        return ceiling;
    }
    let apy = daily_reward * DAYS_PER_YEAR * 100.0 * multiplier / total_staked;
    if apy.is_finite() {
        apy.min(ceiling)
    } else {
        ceiling
    }
}

/// How many farm tokens one reward token is worth.
async fn unit_multiplier<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    farm: Farm,
    farm_token: Address,
) -> Result<f64, ChainError> {
    match farm.spec().price_strategy {
        PriceStrategy::SameToken => Ok(1.0),
        PriceStrategy::LpAgainstNative => {
            let reward = token_price_in_native(chain, contracts, contracts.addresses().token).await?;
            let lp = lp_token_price_in_native(chain, contracts, farm_token).await?;
            if lp > 0.0 {
                Ok(reward / lp)
            } else {
                Err(ChainError::MissingPair(farm_token))
            }
        }
    }
}

/// APY for a farm, falling back to its ceiling on an empty pool or any
/// failed lookup.
pub async fn farm_apy<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    farm: Farm,
    farm_token: Address,
    daily_reward: U256,
    total_staked: U256,
) -> f64 {
    let ceiling = farm.spec().apy_ceiling;
    if total_staked.is_zero() {
        return ceiling;
    }
    match unit_multiplier(chain, contracts, farm, farm_token).await {
        Ok(multiplier) => apy_percent(
            to_f64(daily_reward),
            to_f64(total_staked),
            multiplier,
            ceiling,
        ),
        Err(err) => {
            warn!(%farm, "APY lookup failed, using ceiling: {err}");
            ceiling
        }
    }
}
