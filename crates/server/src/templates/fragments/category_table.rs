use maud::{html, Markup};

/// Flight-category data for one station row
pub struct CategoryDisplay {
    pub station_id: String,
    pub observed_category: Option<String>,
    pub ceiling_ft: Option<i64>,
    pub visibility: Option<String>,
    pub wind: Option<String>,
    pub taf_now: Option<String>,
    pub taf_2h: Option<String>,
    pub taf_4h: Option<String>,
    pub taf_8h: Option<String>,
    pub taf_24h: Option<String>,
}

/// Just the table body - used for HTMX partial updates
pub fn category_table_body(rows: &[CategoryDisplay]) -> Markup {
    html! {
        @if rows.is_empty() {
            p class="has-text-grey" { "No data" }
        } @else {
            table class="table is-fullwidth is-striped is-narrow" {
                thead {
                    tr {
                        th { "Station" }
                        th { "Observed" }
                        th { "Ceiling" }
                        th { "Visibility" }
                        th { "Wind" }
                        th { "Now" }
                        th { "+2h" }
                        th { "+4h" }
                        th { "+8h" }
                        th { "+24h" }
                    }
                }
                tbody {
                    @for row in rows {
                        tr {
                            td { strong { (row.station_id) } }
                            td { (category_tag(row.observed_category.as_deref())) }
                            td {
                                @if let Some(ft) = row.ceiling_ft {
                                    (format!("{} ft", ft))
                                } @else {
                                    span class="has-text-grey" { "none" }
                                }
                            }
                            td {
                                @if let Some(vis) = &row.visibility {
                                    (format!("{} SM", vis))
                                } @else {
                                    span class="has-text-grey" { "n/a" }
                                }
                            }
                            td {
                                @if let Some(wind) = &row.wind {
                                    (wind)
                                } @else {
                                    span class="has-text-grey" { "calm" }
                                }
                            }
                            td { (category_tag(row.taf_now.as_deref())) }
                            td { (category_tag(row.taf_2h.as_deref())) }
                            td { (category_tag(row.taf_4h.as_deref())) }
                            td { (category_tag(row.taf_8h.as_deref())) }
                            td { (category_tag(row.taf_24h.as_deref())) }
                        }
                    }
                }
            }
        }
    }
}

/// Severity-colored bulma tag; missing data renders as a quiet placeholder
fn category_tag(category: Option<&str>) -> Markup {
    let (class, label) = match category {
        Some("VFR") => ("tag is-success", "VFR"),
        Some("MVFR") => ("tag is-info", "MVFR"),
        Some("IFR") => ("tag is-warning", "IFR"),
        Some("LIFR") => ("tag is-danger", "LIFR"),
        _ => ("tag is-light", "n/a"),
    };
    html! {
        span class=(class) { (label) }
    }
}
