use dioxus::prelude::*;

use super::common::{token_amount, Card, ExplorerLink, Loader, SessionBanner};
use crate::hooks::use_treasury;
use crate::state::AppState;

#[component]
pub fn GovernancePage() -> Element {
    let state = use_context::<AppState>();
    let treasury_signal = use_treasury();
    let treasury = treasury_signal.read().clone();
    let liquidity_lock = state.config.addresses.liquidity_lock;
    let balance = token_amount(treasury.balance, "ROLL");

    rsx! {
        div { class: "page",
            h1 { "Governance" }
            p { class: "subtitle", "Protocol funds held by the treasury contract." }
            SessionBanner { needs_account: false }

            Card { title: "Treasury",
                if treasury.is_loading {
                    Loader {}
                } else {
                    div { class: "stat",
                        span { class: "stat-label", "Balance" }
                        span { class: "stat-value", "{balance}" }
                    }
                }
                div { class: "stat",
                    span { class: "stat-label", "Contract" }
                    ExplorerLink { address: treasury.contract_address }
                }
            }

            if let Some(address) = liquidity_lock {
                Card { title: "Liquidity lock",
                    div { class: "stat",
                        span { class: "stat-label", "Contract" }
                        ExplorerLink { address }
                    }
                }
            }
        }
    }
}
