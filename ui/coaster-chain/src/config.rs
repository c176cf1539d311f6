//! Deployment configuration, read once at startup from the process
//! environment. Anything missing here is fatal.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ethers::types::Address;

use crate::error::ConfigError;
use crate::farm::Farm;
use crate::network;

pub const ENVIRONMENT_KEY: &str = "RC_ENVIRONMENT";
pub const WALLET_RPC_URL_KEY: &str = "RC_WALLET_RPC_URL";
pub const PRESALE_KEY: &str = "RC_PRESALE_CONTRACT_ADDRESS";
pub const TOKEN_KEY: &str = "RC_TOKEN_CONTRACT_ADDRESS";
pub const BUYBACK_KEY: &str = "RC_BUYBACK_CONTRACT_ADDRESS";
pub const TREASURY_KEY: &str = "RC_TREASURY_CONTRACT_ADDRESS";
pub const LIQUIDITY_LOCK_KEY: &str = "RC_LIQUIDITY_LOCK_CONTRACT_ADDRESS";
pub const WRAPPED_NATIVE_KEY: &str = "RC_WRAPPED_NATIVE_ADDRESS";
pub const PANCAKE_FACTORY_KEY: &str = "RC_PANCAKE_FACTORY_ADDRESS";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One address per contract role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    pub presale: Address,
    pub token: Address,
    pub buyback: Address,
    pub treasury: Address,
    pub liquidity_lock: Option<Address>,
    pub wrapped_native: Address,
    pub pancake_factory: Address,
    farms: BTreeMap<Farm, Address>,
}

impl ContractAddresses {
    pub fn farm(&self, farm: Farm) -> Result<Address, ConfigError> {
        self.farms
            .get(&farm)
            .copied()
            .ok_or(ConfigError::MissingVariable(farm.spec().address_key))
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    /// Wallet provider endpoint. `None` means no provider is installed.
    pub wallet_rpc_url: Option<String>,
    pub addresses: ContractAddresses,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let environment: Environment = get(ENVIRONMENT_KEY)
            .ok_or(ConfigError::MissingVariable(ENVIRONMENT_KEY))?
            .trim()
            .parse()?;

        let required = |key: &'static str| -> Result<Address, ConfigError> {
            let value = get(key).ok_or(ConfigError::MissingVariable(key))?;
            parse_address(key, &value)
        };
        let optional = |key: &'static str| -> Result<Option<Address>, ConfigError> {
            get(key).map(|value| parse_address(key, &value)).transpose()
        };

        let dex = network::dex_defaults(environment);
        let wrapped_native = match optional(WRAPPED_NATIVE_KEY)? {
            Some(address) => address,
            None => parse_address(WRAPPED_NATIVE_KEY, dex.wrapped_native)?,
        };
        let pancake_factory = match optional(PANCAKE_FACTORY_KEY)? {
            Some(address) => address,
            None => parse_address(PANCAKE_FACTORY_KEY, dex.factory)?,
        };

        let mut farms = BTreeMap::new();
        for farm in Farm::ALL {
            farms.insert(farm, required(farm.spec().address_key)?);
        }

        Ok(Self {
            environment,
            wallet_rpc_url: get(WALLET_RPC_URL_KEY),
            addresses: ContractAddresses {
                presale: required(PRESALE_KEY)?,
                token: required(TOKEN_KEY)?,
                buyback: required(BUYBACK_KEY)?,
                treasury: required(TREASURY_KEY)?,
                liquidity_lock: optional(LIQUIDITY_LOCK_KEY)?,
                wrapped_native,
                pancake_factory,
                farms,
            },
        })
    }
}

fn parse_address(key: &'static str, value: &str) -> Result<Address, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidAddress {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars() -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert(ENVIRONMENT_KEY, "development".to_string());
        vars.insert(PRESALE_KEY, format!("0x{}", "11".repeat(20)));
        vars.insert(TOKEN_KEY, format!("0x{}", "22".repeat(20)));
        vars.insert(BUYBACK_KEY, format!("0x{}", "33".repeat(20)));
        vars.insert(TREASURY_KEY, format!("0x{}", "44".repeat(20)));
        vars.insert("RC_ROLL_FARM_CONTRACT_ADDRESS", format!("0x{}", "55".repeat(20)));
        vars.insert("RC_ROLL_BNB_FARM_CONTRACT_ADDRESS", format!("0x{}", "66".repeat(20)));
        vars
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_complete_config() {
        let config = load(&vars()).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.wallet_rpc_url, None);
        assert_eq!(config.addresses.liquidity_lock, None);
        assert_eq!(
            config.addresses.farm(Farm::RollBnb).unwrap(),
            format!("0x{}", "66".repeat(20)).parse::<Address>().unwrap()
        );
        assert_eq!(
            config.addresses.wrapped_native,
            network::dex_defaults(Environment::Development)
                .wrapped_native
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_missing_farm_address_is_fatal() {
        let mut vars = vars();
        vars.remove("RC_ROLL_FARM_CONTRACT_ADDRESS");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::MissingVariable("RC_ROLL_FARM_CONTRACT_ADDRESS")
        );
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = vars();
        vars.insert(TREASURY_KEY, "  ".to_string());
        assert_eq!(load(&vars).unwrap_err(), ConfigError::MissingVariable(TREASURY_KEY));
    }

    #[test]
    fn test_bad_address() {
        let mut vars = vars();
        vars.insert(TOKEN_KEY, "not-an-address".to_string());
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidAddress { key: TOKEN_KEY, .. }
        ));
    }

    #[test]
    fn test_unknown_environment() {
        let mut vars = vars();
        vars.insert(ENVIRONMENT_KEY, "qa".to_string());
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::UnknownEnvironment("qa".to_string())
        );
    }

    #[test]
    fn test_overrides() {
        let mut vars = vars();
        vars.insert(WALLET_RPC_URL_KEY, "http://127.0.0.1:1248".to_string());
        vars.insert(WRAPPED_NATIVE_KEY, format!("0x{}", "77".repeat(20)));
        let config = load(&vars).unwrap();
        assert_eq!(config.wallet_rpc_url.as_deref(), Some("http://127.0.0.1:1248"));
        assert_eq!(
            config.addresses.wrapped_native,
            format!("0x{}", "77".repeat(20)).parse::<Address>().unwrap()
        );
    }
}
