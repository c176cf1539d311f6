#![allow(non_snake_case)]

mod components;
mod hooks;
mod state;

use coaster_chain::Farm;
use dioxus::prelude::*;
use tracing::{error, info, Level};

use hooks::use_wallet_session_provider;
use state::{AppState, FatalError};

const STYLE: &str = include_str!("../assets/style.css");
const LOG_LEVEL_KEY: &str = "RC_LOG";

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[layout(Layout)]
    #[route("/")]
    Home {},
    #[route("/presale")]
    Presale {},
    #[route("/farm")]
    Farms {},
    #[route("/farm/:slug/history")]
    HarvestHistory { slug: String },
    #[route("/buyback")]
    Buyback {},
    #[route("/governance")]
    Governance {},
}

fn main() {
    let level = std::env::var(LOG_LEVEL_KEY)
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    if let Err(err) = dioxus::logger::init(level) {
        eprintln!("logger init failed: {err}");
    }

    let state = match AppState::from_env() {
        Ok(state) => state,
        Err(err) => {
            error!("configuration error: {err}");
            std::process::exit(1);
        }
    };
    info!(
        environment = %state.config.environment,
        provider = state.chain.is_some(),
        "starting dashboard"
    );

    dioxus::LaunchBuilder::new().with_context(state).launch(App);
}

#[component]
fn App() -> Element {
    let fatal = use_context_provider(|| FatalError(Signal::new(None)));
    use_wallet_session_provider();

    if let Some(msg) = fatal.0.read().as_ref() {
        return rsx! {
            document::Style { {STYLE} }
            div { class: "fatal",
                h1 { "Configuration error" }
                p { class: "error-text", "{msg}" }
            }
        };
    }

    rsx! {
        document::Style { {STYLE} }
        Router::<Route> {}
    }
}

// ---------------------------------------------------------------------------
// Layout: sidebar + content
// ---------------------------------------------------------------------------

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app-container",
            components::layout::Sidebar {}
            div { class: "main-panel",
                components::layout::TopBar {}
                div { class: "main-content",
                    Outlet::<Route> {}
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Route components, thin wrappers around the real components
// ---------------------------------------------------------------------------

#[component]
fn Home() -> Element {
    rsx! { components::home::HomePage {} }
}

#[component]
fn Presale() -> Element {
    rsx! { components::presale::PresalePage {} }
}

#[component]
fn Farms() -> Element {
    rsx! { components::farm::FarmPage {} }
}

#[component]
fn HarvestHistory(slug: String) -> Element {
    match Farm::from_slug(&slug) {
        Some(farm) => rsx! { components::harvest_history::HarvestHistoryPage { farm } },
        None => rsx! {
            div { class: "page",
                h1 { "Harvest history" }
                p { class: "error-text", "Unknown farm '{slug}'." }
            }
        },
    }
}

#[component]
fn Buyback() -> Element {
    rsx! { components::buyback::BuybackPage {} }
}

#[component]
fn Governance() -> Element {
    rsx! { components::governance::GovernancePage {} }
}
