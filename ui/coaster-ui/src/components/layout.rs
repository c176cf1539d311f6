use coaster_chain::Farm;
use dioxus::prelude::*;

use super::connection_status::ConnectionStatusIndicator;
use crate::state::AppState;
use crate::Route;

#[component]
pub fn Sidebar() -> Element {
    let state = use_context::<AppState>();
    let environment = state.config.environment;

    rsx! {
        nav { class: "sidebar",
            div { class: "sidebar-brand",
                span { class: "brand-icon", "◈" }
                span { class: "brand-text", "RollerCoaster" }
            }
            div { class: "sidebar-nav",
                NavSection { label: "Overview" }
                NavLink { to: Route::Home {}, label: "Home", icon: "⌂" }
                NavLink { to: Route::Presale {}, label: "Presale", icon: "✦" }
                NavSection { label: "Earn" }
                NavLink { to: Route::Farms {}, label: "Farms", icon: "❀" }
                for farm in Farm::ALL {
                    NavLink {
                        to: Route::HarvestHistory { slug: farm.spec().slug.to_string() },
                        label: farm.spec().display_token,
                        icon: "↳",
                    }
                }
                NavSection { label: "Protocol" }
                NavLink { to: Route::Buyback {}, label: "Buyback", icon: "↺" }
                NavLink { to: Route::Governance {}, label: "Governance", icon: "⚖" }
            }
            div { class: "sidebar-footer",
                span { class: "sidebar-footer-text", "{environment}" }
            }
        }
    }
}

#[component]
pub fn TopBar() -> Element {
    rsx! {
        header { class: "topbar",
            div { class: "topbar-left",
                span { class: "topbar-label", "Binance Smart Chain" }
            }
            div { class: "topbar-right",
                ConnectionStatusIndicator {}
            }
        }
    }
}

#[component]
fn NavSection(label: &'static str) -> Element {
    rsx! {
        div { class: "nav-section-label", "{label}" }
    }
}

#[component]
fn NavLink(to: Route, label: &'static str, icon: &'static str) -> Element {
    rsx! {
        Link { class: "nav-link", to: to,
            span { class: "nav-icon", "{icon}" }
            span { "{label}" }
        }
    }
}
