use coaster_chain::actions::{self, validate_contribution};
use coaster_chain::session::WalletSession;
use dioxus::prelude::*;

use super::common::{token_amount, Card, Loader, ProgressBar, SessionBanner, Stat};
use crate::hooks::{use_action, use_presale};
use crate::state::{describe, AppState};

#[component]
pub fn PresalePage() -> Element {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>();
    let presale_feed = use_presale();
    let presale_signal = presale_feed.snapshot;
    let contribute = use_action();
    let mut amount_str = use_signal(String::new);
    let mut status_msg = use_signal(|| None::<String>);

    let presale = presale_signal.read().clone();
    let connected = session.read().is_connected();

    let status = if presale.is_active {
        "Active"
    } else if presale.was_ended {
        "Ended"
    } else {
        "Not started"
    };
    let whitelisted = if presale.is_account_whitelisted { "Yes" } else { "No" };
    let access = if presale.allow_whitelist_only {
        "Whitelist only"
    } else {
        "First come, first served"
    };

    let on_contribute = move |_| {
        let Some(chain) = state.chain.clone() else {
            return;
        };
        status_msg.set(None);
        let amount = match validate_contribution(&amount_str.read(), &presale_signal.read()) {
            Ok(amount) => amount,
            Err(err) => {
                contribute.fail(err.to_string());
                return;
            }
        };
        let account = session.peek().account;
        let contracts = state.contracts.clone();
        let refresh = presale_feed.refresher();
        contribute.run(async move {
            actions::contribute(chain.as_ref(), &contracts, account, amount)
                .await
                .map_err(describe)?;
            refresh.notify_one();
            amount_str.set(String::new());
            status_msg.set(Some("Contribution accepted.".to_string()));
            Ok(())
        });
    };

    rsx! {
        div { class: "page",
            h1 { "Presale" }
            p { class: "subtitle", "Contribute BNB to the ROLL presale." }
            SessionBanner { needs_account: false }

            if presale.is_loading {
                Loader {}
            } else {
                Card { title: "Progress",
                    ProgressBar { percent: presale.collected_percent() }
                    div { class: "stat-grid",
                        Stat { label: "Collected", value: token_amount(presale.collected_amount, "BNB") }
                        Stat { label: "Hardcap", value: token_amount(presale.hardcap_amount, "BNB") }
                        Stat { label: "Status", value: status }
                        Stat { label: "Access", value: access }
                    }
                }

                if connected {
                    Card { title: "Your contribution",
                        div { class: "stat-grid",
                            Stat { label: "Contributed", value: token_amount(presale.account_contribution, "BNB") }
                            Stat { label: "Maximum", value: token_amount(presale.max_contribution, "BNB") }
                            Stat { label: "Whitelisted", value: whitelisted }
                        }

                        if presale.can_contribute() {
                            div { class: "form-group",
                                label { "Amount (BNB)" }
                                input {
                                    class: "input",
                                    r#type: "text",
                                    placeholder: "0.5",
                                    value: "{amount_str}",
                                    oninput: move |e| amount_str.set(e.value()),
                                }
                            }
                            button {
                                class: "btn btn-primary",
                                disabled: contribute.is_busy(),
                                onclick: on_contribute,
                                if contribute.is_busy() { "Contributing..." } else { "Contribute" }
                            }
                        } else if presale.is_active {
                            p { class: "hint", "Your account is not on the whitelist yet." }
                        }

                        if let Some(msg) = contribute.error.read().as_ref() {
                            p { class: "error-text", "{msg}" }
                        }
                        if let Some(msg) = status_msg.read().as_ref() {
                            p { class: "success-text", "{msg}" }
                        }
                    }
                } else {
                    SessionBanner { needs_account: true }
                }
            }
        }
    }
}
