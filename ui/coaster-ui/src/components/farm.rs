use coaster_chain::actions::{validate_amount, FarmAction};
use coaster_chain::feed::farm::FarmSnapshot;
use coaster_chain::network;
use coaster_chain::session::WalletSession;
use coaster_chain::Farm;
use dioxus::prelude::*;

use super::common::{format_date, token_amount, Card, ExplorerLink, Loader, SessionBanner, Stat};
use crate::hooks::{use_action, use_farm, Action, FarmHandle};
use crate::state::AppState;
use crate::Route;

#[component]
pub fn FarmPage() -> Element {
    let mut selected = use_signal(Farm::default);
    let handle = use_farm(selected);
    let session = use_context::<Signal<WalletSession>>();

    let snapshot = handle.snapshot.read().clone();
    let connected = session.read().is_connected();
    let current = *selected.read();

    rsx! {
        div { class: "page",
            h1 { "Farms" }
            p { class: "subtitle", "Stake to earn ROLL. Rewards unlock gradually after each harvest." }

            div { class: "tabs",
                for farm in Farm::ALL {
                    button {
                        class: if farm == current { "tab tab-active" } else { "tab" },
                        onclick: move |_| selected.set(farm),
                        "{farm}"
                    }
                }
            }

            SessionBanner { needs_account: false }

            if snapshot.is_loading {
                Loader {}
            } else {
                PoolCard { snapshot: snapshot.clone() }
                if !snapshot.has_farming_started() {
                    div { class: "alert alert-info", "Farming has not started yet." }
                } else if connected {
                    BuyCard { farm: current }
                    PositionCard { handle: handle.clone() }
                } else {
                    BuyCard { farm: current }
                    SessionBanner { needs_account: true }
                }
            }
        }
    }
}

#[component]
fn PoolCard(snapshot: FarmSnapshot) -> Element {
    let reward_token = Farm::Roll.spec().display_token;
    let pool = snapshot.pool.clone().unwrap_or_default();
    let apy = if snapshot.position.is_apy_loading {
        "...".to_string()
    } else {
        format!("{:.2}%", snapshot.position.apy_percent)
    };

    rsx! {
        Card { title: "Pool",
            div { class: "stat-grid",
                Stat { label: "Total rewards", value: token_amount(pool.total_reward_supply, reward_token) }
                Stat { label: "Daily rewards", value: token_amount(pool.daily_reward, reward_token) }
                if pool.has_farming_started {
                    Stat { label: "Next halving", value: format_date(pool.next_halving_timestamp) }
                    Stat { label: "APY", value: apy }
                }
            }
            if snapshot.pool.is_some() {
                div { class: "stat",
                    span { class: "stat-label", "Farm contract" }
                    ExplorerLink { address: pool.farm_address }
                }
            }
        }
    }
}

#[component]
fn BuyCard(farm: Farm) -> Element {
    let state = use_context::<AppState>();
    let href = network::buy_url(farm, state.config.addresses.token);
    let staked_token = farm.spec().display_token;

    rsx! {
        Card { title: "Buy",
            p { class: "hint", "Get {staked_token} on PancakeSwap to stake it here." }
            a { class: "btn", href: "{href}", target: "_blank", "Buy {staked_token}" }
        }
    }
}

#[component]
fn PositionCard(handle: FarmHandle) -> Element {
    let snapshot = handle.snapshot.read().clone();
    let farm = snapshot.farm;
    let staked_token = farm.spec().display_token;
    let reward_token = Farm::Roll.spec().display_token;
    let balances = snapshot.position.balances.clone();
    let available = balances.available_to_stake;
    let staked = balances.staked_amount;

    let approve = use_action();
    let stake = use_action();
    let withdraw = use_action();
    let harvest = use_action();
    let claim = use_action();
    let mut stake_str = use_signal(String::new);
    let mut withdraw_str = use_signal(String::new);

    let on_approve = {
        let handle = handle.clone();
        move |_| handle.submit(approve, FarmAction::Approve)
    };
    let on_stake = {
        let handle = handle.clone();
        move |_| match validate_amount(&stake_str.read(), available) {
            Ok(amount) => handle.submit(stake, FarmAction::Stake(amount)),
            Err(err) => stake.fail(err.to_string()),
        }
    };
    let on_stake_all = {
        let handle = handle.clone();
        move |_| handle.submit(stake, FarmAction::StakeAll)
    };
    let on_withdraw = {
        let handle = handle.clone();
        move |_| match validate_amount(&withdraw_str.read(), staked) {
            Ok(amount) => handle.submit(withdraw, FarmAction::Withdraw(amount)),
            Err(err) => withdraw.fail(err.to_string()),
        }
    };
    let on_withdraw_all = {
        let handle = handle.clone();
        move |_| handle.submit(withdraw, FarmAction::WithdrawAll)
    };
    let on_harvest = {
        let handle = handle.clone();
        move |_| handle.submit(harvest, FarmAction::Harvest)
    };
    let on_claim = move |_| handle.submit(claim, FarmAction::Claim);

    rsx! {
        Card { title: "Your position",
            if snapshot.position.is_loading {
                Loader {}
            }
            div { class: "stat-grid",
                Stat { label: "Staked", value: token_amount(balances.staked_amount, staked_token) }
                Stat { label: "Total staked", value: token_amount(balances.total_staked, staked_token) }
                Stat { label: "Pool share", value: format!("{:.2}%", snapshot.stake_percent()) }
                Stat { label: "Your daily rewards", value: token_amount(snapshot.account_daily_reward(), reward_token) }
                Stat { label: "Wallet balance", value: token_amount(balances.available_to_stake, staked_token) }
                Stat { label: "Harvestable", value: token_amount(balances.harvestable, reward_token) }
                Stat { label: "Claimable", value: token_amount(balances.claimable, reward_token) }
                Stat { label: "Harvested", value: token_amount(balances.total_harvested, reward_token) }
            }

            if !balances.has_approved {
                p { class: "hint", "Approve the farm to spend your {staked_token} before staking." }
                button {
                    class: "btn btn-primary",
                    disabled: approve.is_busy(),
                    onclick: on_approve,
                    if approve.is_busy() { "Approving..." } else { "Approve" }
                }
                ActionError { action: approve }
            } else {
                div { class: "form-group",
                    label { "Stake ({staked_token})" }
                    input {
                        class: "input",
                        r#type: "text",
                        placeholder: "0.0",
                        value: "{stake_str}",
                        oninput: move |e| stake_str.set(e.value()),
                    }
                    div { class: "btn-row",
                        button {
                            class: "btn btn-primary",
                            disabled: stake.is_busy(),
                            onclick: on_stake,
                            if stake.is_busy() { "Staking..." } else { "Stake" }
                        }
                        button {
                            class: "btn",
                            disabled: stake.is_busy(),
                            onclick: on_stake_all,
                            "Stake all"
                        }
                    }
                    ActionError { action: stake }
                }

                div { class: "form-group",
                    label { "Withdraw ({staked_token})" }
                    input {
                        class: "input",
                        r#type: "text",
                        placeholder: "0.0",
                        value: "{withdraw_str}",
                        oninput: move |e| withdraw_str.set(e.value()),
                    }
                    div { class: "btn-row",
                        button {
                            class: "btn btn-primary",
                            disabled: withdraw.is_busy(),
                            onclick: on_withdraw,
                            if withdraw.is_busy() { "Withdrawing..." } else { "Withdraw" }
                        }
                        button {
                            class: "btn",
                            disabled: withdraw.is_busy(),
                            onclick: on_withdraw_all,
                            "Withdraw all"
                        }
                    }
                    ActionError { action: withdraw }
                }
            }

            div { class: "btn-row",
                button {
                    class: "btn btn-primary",
                    disabled: harvest.is_busy() || balances.harvestable.is_zero(),
                    onclick: on_harvest,
                    if harvest.is_busy() { "Harvesting..." } else { "Harvest" }
                }
                button {
                    class: "btn btn-primary",
                    disabled: claim.is_busy() || balances.claimable.is_zero(),
                    onclick: on_claim,
                    if claim.is_busy() { "Claiming..." } else { "Claim" }
                }
                Link {
                    class: "btn btn-link",
                    to: Route::HarvestHistory { slug: farm.spec().slug.to_string() },
                    "Harvest history"
                }
            }
            ActionError { action: harvest }
            ActionError { action: claim }
        }
    }
}

#[component]
fn ActionError(action: Action) -> Element {
    rsx! {
        if let Some(msg) = action.error.read().as_ref() {
            p { class: "error-text", "{msg}" }
        }
    }
}
