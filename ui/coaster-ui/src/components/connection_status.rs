use coaster_chain::session::WalletSession;
use dioxus::prelude::*;

use super::common::truncate_address;
use crate::hooks::{connect_wallet, SessionWake};
use crate::state::AppState;

#[component]
pub fn ConnectionStatusIndicator() -> Element {
    let state = use_context::<AppState>();
    let session_signal = use_context::<Signal<WalletSession>>();
    let wake = use_context::<SessionWake>();
    let error_msg = use_signal(|| None::<String>);

    let session = session_signal.read().clone();
    let (dot_class, label) = if session.is_loading {
        ("dot connecting", "Detecting wallet".to_string())
    } else if !session.provider_available {
        ("dot disconnected", "No wallet".to_string())
    } else if !session.network_supported {
        ("dot error", "Unsupported network".to_string())
    } else if let Some(account) = session.account {
        ("dot connected", truncate_address(account))
    } else {
        ("dot disconnected", "Not connected".to_string())
    };
    let can_connect = session.provider_available && session.account.is_none();

    let connect = move |_| connect_wallet(&state, &wake, error_msg);

    rsx! {
        div { class: "conn-indicator",
            span { class: dot_class }
            span { class: "conn-label", "{label}" }
            if let Some(chain_id) = session.chain_id {
                span { class: "conn-chain", "chain {chain_id}" }
            }
            if can_connect {
                button { class: "conn-btn conn-btn-connect", onclick: connect, "Connect" }
            }
            if let Some(msg) = error_msg.read().as_ref() {
                span { class: "conn-error", "{msg}" }
            }
        }
    }
}
