use coaster_chain::session::WalletSession;
use dioxus::prelude::*;

use super::common::{ExplorerLink, SessionBanner};
use crate::state::AppState;
use crate::Route;

#[component]
pub fn HomePage() -> Element {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>().read().clone();
    let token = state.config.addresses.token;

    rsx! {
        div { class: "page",
            h1 { "RollerCoaster" }
            p { class: "subtitle", "Presale, farms and buybacks for the ROLL token." }
            SessionBanner { needs_account: false }

            div { class: "tile-grid",
                Tile { to: Route::Presale {}, title: "Presale", body: "Contribute BNB before launch." }
                Tile { to: Route::Farms {}, title: "Farms", body: "Stake ROLL or ROLL-BNB LP to earn ROLL." }
                Tile { to: Route::Buyback {}, title: "Buyback", body: "Trigger scheduled buybacks and earn a reward." }
                Tile { to: Route::Governance {}, title: "Governance", body: "Follow the treasury." }
            }

            div { class: "stat",
                span { class: "stat-label", "ROLL token" }
                ExplorerLink { address: token }
            }
            if let Some(account) = session.account {
                div { class: "stat",
                    span { class: "stat-label", "Your account" }
                    ExplorerLink { address: account }
                }
            }
        }
    }
}

#[component]
fn Tile(to: Route, title: &'static str, body: &'static str) -> Element {
    rsx! {
        Link { class: "tile", to: to,
            h3 { "{title}" }
            p { "{body}" }
        }
    }
}
