use std::time::Duration;

use coaster_chain::actions;
use coaster_chain::session::WalletSession;
use dioxus::prelude::*;

use super::common::{format_countdown, token_amount, unix_now, Card, Loader, ProgressBar, SessionBanner, Stat};
use crate::hooks::{use_action, use_buyback};
use crate::state::{describe, AppState};

#[component]
pub fn BuybackPage() -> Element {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>();
    let buyback_feed = use_buyback();
    let buyback_signal = buyback_feed.snapshot;
    let trigger = use_action();
    let mut status_msg = use_signal(|| None::<String>);
    let mut now = use_signal(unix_now);

    // Countdown tick; dropped with the page.
    use_future(move || async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            now.set(unix_now());
        }
    });

    let buyback = buyback_signal.read().clone();
    let has_account = session.read().account.is_some();
    let now_secs = *now.read();
    let remaining = buyback.seconds_until_next(now_secs);
    let can_trigger = buyback.can_trigger(has_account, now_secs);

    let on_trigger = move |_| {
        let Some(chain) = state.chain.clone() else {
            return;
        };
        status_msg.set(None);
        let account = session.peek().account;
        let contracts = state.contracts.clone();
        let refresh = buyback_feed.refresher();
        trigger.run(async move {
            actions::trigger_buyback(chain.as_ref(), &contracts, account)
                .await
                .map_err(describe)?;
            refresh.notify_one();
            status_msg.set(Some("Buyback executed.".to_string()));
            Ok(())
        });
    };

    rsx! {
        div { class: "page",
            h1 { "Buyback" }
            p { class: "subtitle",
                "Anyone holding enough ROLL can trigger the next buyback and earns a reward for it."
            }
            SessionBanner { needs_account: false }

            if buyback.is_loading {
                Loader {}
            } else if !buyback.is_initialized {
                div { class: "alert alert-info", "Buybacks start once the presale has ended." }
            } else {
                Card { title: "Progress",
                    ProgressBar { percent: buyback.bought_back_percent() }
                    div { class: "stat-grid",
                        Stat { label: "Bought back", value: token_amount(buyback.already_bought_back, "BNB") }
                        Stat { label: "Total", value: token_amount(buyback.total_amount, "BNB") }
                        Stat { label: "Per buyback", value: token_amount(buyback.single_amount, "BNB") }
                    }
                }

                Card { title: "Next buyback",
                    div { class: "countdown",
                        if remaining == 0 { "Ready" } else { "{format_countdown(remaining)}" }
                    }
                    div { class: "stat-grid",
                        Stat { label: "Required balance", value: token_amount(buyback.min_tokens_for_call, "ROLL") }
                        Stat { label: "Your balance", value: token_amount(buyback.caller_token_balance, "ROLL") }
                    }
                    button {
                        class: "btn btn-primary",
                        disabled: !can_trigger || trigger.is_busy(),
                        onclick: on_trigger,
                        if trigger.is_busy() { "Triggering..." } else { "Trigger buyback" }
                    }
                    if let Some(msg) = trigger.error.read().as_ref() {
                        p { class: "error-text", "{msg}" }
                    }
                    if let Some(msg) = status_msg.read().as_ref() {
                        p { class: "success-text", "{msg}" }
                    }
                }
            }
        }
    }
}
