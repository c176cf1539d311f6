//! Which chains each deployment environment accepts, plus the per-network
//! constants (explorer, PancakeSwap) that go with them.

use ethers::types::Address;

use crate::config::Environment;
use crate::error::ConfigError;
use crate::farm::{Farm, PriceStrategy};

pub const BSC_MAINNET: u64 = 56;
pub const BSC_TESTNET: u64 = 97;
pub const LOCAL_DEV_CHAIN: u64 = 1337;

const DEX_APP_URL: &str = "https://pancakeswap.finance";

const SUPPORTED_CHAINS: [(Environment, &[u64]); 3] = [
    (Environment::Development, &[BSC_TESTNET, LOCAL_DEV_CHAIN]),
    (Environment::Staging, &[BSC_MAINNET]),
    (Environment::Production, &[BSC_MAINNET]),
];

/// PancakeSwap constants for the network an environment targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DexDefaults {
    pub wrapped_native: &'static str,
    pub factory: &'static str,
}

const BSC_MAINNET_DEX: DexDefaults = DexDefaults {
    wrapped_native: "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c",
    factory: "0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73",
};

const BSC_TESTNET_DEX: DexDefaults = DexDefaults {
    wrapped_native: "0xae13d989daC2f0dEbFf460aC112a837C89BAa7cd",
    factory: "0x6725F303b657a9451d8BA641348b6761A6CC7a17",
};

pub fn is_supported(chain_id: u64, environment: Environment) -> bool {
    SUPPORTED_CHAINS
        .iter()
        .find(|(env, _)| *env == environment)
        .map_or(false, |(_, chains)| chains.contains(&chain_id))
}

/// Same as [`is_supported`] for a raw environment name. Unknown names are a
/// configuration error.
pub fn is_supported_in(chain_id: u64, environment: &str) -> Result<bool, ConfigError> {
    Ok(is_supported(chain_id, environment.parse()?))
}

pub fn explorer_url(environment: Environment, suffix: Option<&str>) -> String {
    let base = match environment {
        Environment::Development => "https://testnet.bscscan.com",
        Environment::Staging | Environment::Production => "https://bscscan.com",
    };
    match suffix.filter(|s| !s.is_empty()) {
        Some(suffix) => format!("{base}/{suffix}"),
        None => base.to_string(),
    }
}

pub fn dex_defaults(environment: Environment) -> DexDefaults {
    match environment {
        Environment::Development => BSC_TESTNET_DEX,
        Environment::Staging | Environment::Production => BSC_MAINNET_DEX,
    }
}

/// Where to get the token staked in `farm`: a swap into `token` for the
/// single-token farm, adding `token`/BNB liquidity for the LP farm.
pub fn buy_url(farm: Farm, token: Address) -> String {
    match farm.spec().price_strategy {
        PriceStrategy::SameToken => format!("{DEX_APP_URL}/swap?outputCurrency={token:?}"),
        PriceStrategy::LpAgainstNative => format!("{DEX_APP_URL}/add/BNB/{token:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_pairs() {
        assert!(is_supported(97, Environment::Development));
        assert!(is_supported(1337, Environment::Development));
        assert!(is_supported(56, Environment::Staging));
        assert!(is_supported(56, Environment::Production));
    }

    #[test]
    fn test_everything_else_is_unsupported() {
        let all_pairs: [(Environment, &[u64]); 3] = [
            (Environment::Development, &[97, 1337]),
            (Environment::Staging, &[56]),
            (Environment::Production, &[56]),
        ];
        for (env, allowed) in all_pairs {
            for chain_id in [1, 4, 56, 97, 1337, 80001] {
                assert_eq!(is_supported(chain_id, env), allowed.contains(&chain_id));
            }
        }
    }

    #[test]
    fn test_unknown_environment_is_an_error() {
        assert_eq!(is_supported_in(56, "production"), Ok(true));
        assert_eq!(
            is_supported_in(56, "qa"),
            Err(ConfigError::UnknownEnvironment("qa".into()))
        );
    }

    #[test]
    fn test_explorer_url() {
        assert_eq!(
            explorer_url(Environment::Development, Some("address/0xabc")),
            "https://testnet.bscscan.com/address/0xabc"
        );
        assert_eq!(explorer_url(Environment::Production, None), "https://bscscan.com");
        assert_eq!(explorer_url(Environment::Staging, Some("")), "https://bscscan.com");
    }

    #[test]
    fn test_buy_url_per_farm() {
        let token = Address::repeat_byte(0x22);
        let hex = "0x2222222222222222222222222222222222222222";
        assert_eq!(
            buy_url(Farm::Roll, token),
            format!("https://pancakeswap.finance/swap?outputCurrency={hex}")
        );
        assert_eq!(
            buy_url(Farm::RollBnb, token),
            format!("https://pancakeswap.finance/add/BNB/{hex}")
        );
    }
}
