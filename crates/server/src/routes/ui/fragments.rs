use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
};

use crate::{
    parse_station_filter,
    templates::{category_table_body, CategoryDisplay},
    AppState, StationsQuery,
};

/// Handler for the flight-category table fragment
/// (GET /fragments/flight-categories)
pub async fn flight_categories_fragment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StationsQuery>,
) -> Html<String> {
    let filter = parse_station_filter(&query.stations);

    let metars = state
        .store
        .latest_metars(&filter)
        .await
        .unwrap_or_default();
    let tafs = state.store.latest_tafs(&filter).await.unwrap_or_default();

    let mut rows: Vec<CategoryDisplay> = Vec::new();
    let mut station_ids: Vec<String> = metars
        .iter()
        .map(|m| m.station_id.clone())
        .chain(tafs.iter().map(|t| t.station_id.clone()))
        .collect();
    station_ids.sort();
    station_ids.dedup();

    for station_id in station_ids {
        let metar = metars.iter().find(|m| m.station_id == station_id);
        let taf = tafs.iter().find(|t| t.station_id == station_id);

        let wind = metar.and_then(|m| {
            let speed = m.wind_speed?;
            let direction = m
                .wind_direction
                .map(|d| format!("{:03}", d))
                .unwrap_or_else(|| "VRB".to_string());
            match m.wind_gust {
                Some(gust) => Some(format!("{} {}G{} kt", direction, speed, gust)),
                None => Some(format!("{} {} kt", direction, speed)),
            }
        });

        rows.push(CategoryDisplay {
            station_id,
            observed_category: metar.and_then(|m| m.flight_category.clone()),
            ceiling_ft: metar.and_then(|m| m.ceiling_ft),
            visibility: metar.and_then(|m| m.visibility.clone()),
            wind,
            taf_now: taf.and_then(|t| t.category_now.clone()),
            taf_2h: taf.and_then(|t| t.category_2h.clone()),
            taf_4h: taf.and_then(|t| t.category_4h.clone()),
            taf_8h: taf.and_then(|t| t.category_8h.clone()),
            taf_24h: taf.and_then(|t| t.category_24h.clone()),
        });
    }

    Html(category_table_body(&rows).into_string())
}
