use maud::{html, Markup};

use crate::templates::base;

/// Dashboard page: a self-refreshing flight-category table
pub fn dashboard_page(remote_url: &str) -> Markup {
    base(
        "avwx monitor",
        remote_url,
        html! {
            div class="box" {
                div class="is-flex is-justify-content-space-between is-align-items-center mb-4" {
                    h2 class="title is-5 mb-0" { "Flight categories" }
                    p class="has-text-grey is-size-7" { "refreshes every minute" }
                }

                div id="category-table-container"
                    hx-get="/fragments/flight-categories"
                    hx-trigger="load, every 60s"
                    hx-swap="innerHTML" {
                    progress class="progress is-small is-primary" max="100" {}
                }
            }
        },
    )
}
