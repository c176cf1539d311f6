//! Interface descriptors for every contract the dashboard talks to.
//!
//! These are compile-time constants; a mismatch with the deployed contract is
//! an integration error, so parsing failures and missing events surface as
//! [`ConfigError`]s instead of runtime conditions.

use ethers::abi::{parse_abi, Event};
use ethers::contract::BaseContract;

use crate::error::ConfigError;

pub const PRESALE: &[&str] = &[
    "function isPresaleActive() external view returns (bool)",
    "function wasPresaleEnded() external view returns (bool)",
    "function isFcfsActive() external view returns (bool)",
    "function hardcapAmount() external view returns (uint256)",
    "function collectedAmount() external view returns (uint256)",
    "function maxContributionAmount() external view returns (uint256)",
    "function contribution(address) external view returns (uint256)",
    "function isWhitelisted(address) external view returns (bool)",
    "event ContributionAccepted(address indexed _contributor, uint256 _partialContribution, uint256 _totalContribution, uint256 _receivedTokens, uint256 _contributions)",
    "event ContributionRefunded(address indexed _contributor, uint256 _contribution)",
    "event PresaleStarted()",
    "event PresaleEnded()",
    "event FcfsActivated()",
];

pub const FARM: &[&str] = &[
    "function farmingActive() external view returns (bool)",
    "function totalRewardSupply() external view returns (uint256)",
    "function intervalReward() external view returns (uint256)",
    "function rewardIntervalLength() external view returns (uint256)",
    "function harvestIntervalLength() external view returns (uint256)",
    "function nextIntervalTimestamp() external view returns (uint256)",
    "function farmTokenAddress() external view returns (address)",
    "function rewardTokenAddress() external view returns (address)",
    "function singleStaked(address) external view returns (uint256)",
    "function totalStaked() external view returns (uint256)",
    "function harvestable(address) external view returns (uint256)",
    "function claimable(address) external view returns (uint256)",
    "function harvested(address) external view returns (uint256)",
    "function harvestChunk(address,uint56) external view returns (uint256,uint256,uint256)",
    "function stake(uint256) external",
    "function withdraw(uint256) external",
    "function harvest() external",
    "function claim() external",
    "event HarvestCreated(address indexed _staker, uint256 _id, uint256 _timestamp, uint256 _amount)",
    "event RewardClaimed(address indexed _staker, uint256 indexed _harvestId, uint256 _timestamp, uint256 _amount)",
    "event Stake(address indexed _staker, uint256 _timestamp, uint256 _amount)",
    "event Withdraw(address indexed _staker, uint256 _timestamp, uint256 _amount)",
];

pub const BUYBACK: &[&str] = &[
    "function totalAmount() external view returns (uint256)",
    "function singleAmount() external view returns (uint256)",
    "function boughtBackAmount() external view returns (uint256)",
    "function lastBuyback() external view returns (uint256)",
    "function nextBuyback() external view returns (uint256)",
    "function minTokensForBuybackCall() external view returns (uint256)",
    "function buyback() external",
    "event BuybackInitialized(uint256 _totalAmount, uint256 _singleAmount, uint256 _minTokensToHold)",
    "event SingleBuybackExecuted(address _sender, uint256 _senderRewardAmount, uint256 _buybackAmount)",
];

pub const ERC20: &[&str] = &[
    "function totalSupply() external view returns (uint256)",
    "function balanceOf(address) external view returns (uint256)",
    "function allowance(address,address) external view returns (uint256)",
    "function approve(address,uint256) external returns (bool)",
];

pub const PANCAKE_FACTORY: &[&str] =
    &["function getPair(address,address) external view returns (address)"];

pub const PANCAKE_PAIR: &[&str] = &[
    "function token0() external view returns (address)",
    "function token1() external view returns (address)",
    "function getReserves() external view returns (uint112,uint112,uint32)",
];

/// Parsed interface descriptors, built once and shared by every contract
/// handle.
#[derive(Clone, Debug)]
pub struct Abi {
    pub presale: BaseContract,
    pub farm: BaseContract,
    pub buyback: BaseContract,
    pub erc20: BaseContract,
    pub factory: BaseContract,
    pub pair: BaseContract,
}

impl Abi {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            presale: parse("presale", PRESALE)?,
            farm: parse("farm", FARM)?,
            buyback: parse("buyback", BUYBACK)?,
            erc20: parse("ERC-20", ERC20)?,
            factory: parse("PancakeSwap factory", PANCAKE_FACTORY)?,
            pair: parse("PancakeSwap pair", PANCAKE_PAIR)?,
        })
    }
}

fn parse(contract: &'static str, signatures: &[&str]) -> Result<BaseContract, ConfigError> {
    parse_abi(signatures)
        .map(BaseContract::from)
        .map_err(|err| ConfigError::InvalidAbi {
            contract,
            reason: err.to_string(),
        })
}

/// Look up an event descriptor, failing loudly when it is not declared.
pub fn event<'a>(
    abi: &'a BaseContract,
    contract: &'static str,
    name: &'static str,
) -> Result<&'a Event, ConfigError> {
    abi.abi()
        .event(name)
        .map_err(|_| ConfigError::MissingEvent { contract, event: name })
}
