use chrono::{DateTime, Local};
use coaster_chain::network;
use coaster_chain::session::WalletSession;
use coaster_chain::units::display_amount;
use dioxus::prelude::*;
use ethers::types::{Address, U256};

use crate::state::AppState;

#[component]
pub fn Card(#[props(into)] title: String, children: Element) -> Element {
    rsx! {
        section { class: "card",
            h2 { class: "card-title", "{title}" }
            {children}
        }
    }
}

#[component]
pub fn Stat(#[props(into)] label: String, #[props(into)] value: String) -> Element {
    rsx! {
        div { class: "stat",
            span { class: "stat-label", "{label}" }
            span { class: "stat-value", "{value}" }
        }
    }
}

#[component]
pub fn Loader() -> Element {
    rsx! {
        div { class: "loader",
            span { class: "spinner" }
            span { "Loading..." }
        }
    }
}

#[component]
pub fn ProgressBar(percent: f64) -> Element {
    let width = percent.clamp(0.0, 100.0);
    rsx! {
        div { class: "progress",
            div { class: "progress-fill", style: "width: {width:.2}%" }
        }
        span { class: "progress-label", "{width:.2}%" }
    }
}

/// Explains why nothing can be read: no provider, wrong network, or (with
/// `needs_account`) no connected account.
#[component]
pub fn SessionBanner(needs_account: bool) -> Element {
    let session = use_context::<Signal<WalletSession>>().read().clone();

    if session.is_loading {
        return rsx! {};
    }
    let message = if !session.provider_available {
        Some("No wallet provider detected. Set RC_WALLET_RPC_URL to a wallet endpoint to use the dashboard.")
    } else if !session.network_supported {
        Some("Your wallet is connected to an unsupported network. Switch to Binance Smart Chain.")
    } else if needs_account && session.account.is_none() {
        Some("Connect your wallet to see your position.")
    } else {
        None
    };

    rsx! {
        if let Some(message) = message {
            div { class: "alert alert-warning", "{message}" }
        }
    }
}

#[component]
pub fn ExplorerLink(address: Address) -> Element {
    let state = use_context::<AppState>();
    let href = network::explorer_url(
        state.config.environment,
        Some(&format!("address/{address:?}")),
    );
    rsx! {
        a { class: "mono", href: "{href}", target: "_blank", "{truncate_address(address)}" }
    }
}

pub fn truncate_address(address: Address) -> String {
    let full = format!("{address:?}");
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

pub fn token_amount(amount: U256, symbol: &str) -> String {
    format!("{} {symbol}", display_amount(amount))
}

fn local_time(timestamp: u64) -> Option<DateTime<Local>> {
    let timestamp = i64::try_from(timestamp).ok()?;
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&Local))
}

pub fn format_date(timestamp: u64) -> String {
    local_time(timestamp).map_or_else(|| "-".to_string(), |t| t.format("%m/%d/%Y").to_string())
}

pub fn format_time(timestamp: u64) -> String {
    local_time(timestamp).map_or_else(|| "-".to_string(), |t| t.format("%H:%M:%S").to_string())
}

/// `1d 02:03:04`, or `02:03:04` under a day.
pub fn format_countdown(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let seconds = seconds % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

pub fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
