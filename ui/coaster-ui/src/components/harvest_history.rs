use coaster_chain::feed::harvest::HarvestChunkClaims;
use coaster_chain::Farm;
use dioxus::prelude::*;

use super::common::{format_date, format_time, token_amount, Card, Loader, SessionBanner};
use crate::hooks::{use_harvest_claims, use_harvest_history};

#[component]
pub fn HarvestHistoryPage(farm: Farm) -> Element {
    let history_signal = use_harvest_history(farm);
    let mut show_claims = use_signal(|| false);
    let claims = use_harvest_claims(farm, EventHandler::new(move |_| show_claims.set(true)));

    let history = history_signal.read().clone();
    let reward_token = Farm::Roll.spec().display_token;
    let interval_hours = history.harvest_interval / 3_600;

    rsx! {
        div { class: "page",
            h1 { "Harvest history" }
            p { class: "subtitle", "{farm}" }
            SessionBanner { needs_account: true }

            if history.is_loading {
                Loader {}
            } else if !history.is_data_valid || !history.is_account_connected {
                p { class: "hint", "Nothing to show yet." }
            } else if !history.has_farming_started {
                div { class: "alert alert-info", "Farming has not started yet." }
            } else {
                p { class: "hint",
                    "Each harvest unlocks {history.harvest_step_percent}% every {interval_hours} hours."
                }
                if history.chunks.is_empty() {
                    p { class: "empty-desc", "You have not harvested from this farm yet." }
                } else {
                    table { class: "table",
                        thead {
                            tr {
                                th { "#" }
                                th { "Date" }
                                th { "Time" }
                                th { "Harvested" }
                                th { "Claimed" }
                                th {}
                            }
                        }
                        tbody {
                            for (index, chunk) in history.chunks.iter().enumerate() {
                                {
                                    let claims = claims.clone();
                                    rsx! {
                                        tr { key: "{index}",
                                            td { "{index + 1}" }
                                            td { "{format_date(chunk.timestamp)}" }
                                            td { "{format_time(chunk.timestamp)}" }
                                            td { "{token_amount(chunk.amount, reward_token)}" }
                                            td {
                                                if chunk.is_claimed_amount_loading {
                                                    span { class: "spinner" }
                                                } else {
                                                    "{token_amount(chunk.claimed_amount, reward_token)}"
                                                }
                                            }
                                            td {
                                                button {
                                                    class: "btn btn-small",
                                                    onclick: move |_| {
                                                        show_claims.set(false);
                                                        claims.request(index);
                                                    },
                                                    "Claims"
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                ClaimsPanel { claims: claims.claims.read().clone(), open: *show_claims.read() }
            }
        }
    }
}

#[component]
fn ClaimsPanel(claims: HarvestChunkClaims, open: bool) -> Element {
    let Some(index) = claims.chunk_index else {
        return rsx! {};
    };
    let reward_token = Farm::Roll.spec().display_token;
    let title = format!("Claims for harvest #{}", index + 1);

    rsx! {
        Card { title,
            if claims.is_loading {
                Loader {}
            } else if !open {
                p { class: "hint", "Claim details could not be loaded." }
            } else if claims.claims.is_empty() {
                p { class: "empty-desc", "Nothing claimed from this harvest yet." }
            } else {
                table { class: "table",
                    thead {
                        tr {
                            th { "Date" }
                            th { "Time" }
                            th { "Amount" }
                        }
                    }
                    tbody {
                        for claim in claims.claims.iter() {
                            tr {
                                td { "{format_date(claim.timestamp)}" }
                                td { "{format_time(claim.timestamp)}" }
                                td { "{token_amount(claim.amount, reward_token)}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
