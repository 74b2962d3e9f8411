use avwx_core::{
    ClassificationScheme, CloudCover, CloudLayer, ForecastPeriod, TafDocument, Visibility,
};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::{Method, StatusCode};
use serde_json::{from_slice, Value};
use server::{MetarSnapshot, SnapshotStore, TafSnapshot};
use tower::ServiceExt;

use crate::helpers::spawn_app;

const HOUR: i64 = 3600;
// An arbitrary whole UTC hour well in the past
const BASE: i64 = 1_699_999_200;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    from_slice(&bytes).unwrap()
}

fn document(valid_from: i64, valid_to: i64, ceiling_ft: i64) -> TafDocument {
    TafDocument {
        icao_id: "KHIS".to_string(),
        valid_time_from: valid_from,
        valid_time_to: valid_to,
        raw_taf: None,
        fcsts: vec![ForecastPeriod {
            time_from: valid_from,
            time_to: valid_to,
            fcst_change: None,
            time_bec: None,
            probability: None,
            wdir: Some(270),
            wspd: Some(8),
            wgst: None,
            visib: Some(Visibility::Text("6+".to_string())),
            wx_string: None,
            clouds: vec![CloudLayer {
                cover: CloudCover::Ovc,
                base: Some(ceiling_ft),
            }],
        }],
    }
}

fn metar_row(observed_at: i64, category: &str) -> MetarSnapshot {
    MetarSnapshot {
        station_id: "KHIS".to_string(),
        observed_at,
        fetched_at: observed_at + 300,
        flight_category: Some(category.to_string()),
        ceiling_ft: Some(2500),
        lowest_cloud_ft: Some(2500),
        visibility: Some("7".to_string()),
        wind_direction: Some(270),
        wind_speed: Some(8),
        wind_gust: None,
        temperature: Some(19.0),
        dewpoint: Some(11.0),
        altimeter: Some(1014.0),
        wx_string: None,
        raw_ob: None,
    }
}

#[tokio::test]
async fn history_reconstructs_series_with_authority_cutover() {
    let test_app = spawn_app().await;
    let scheme = ClassificationScheme::FourTier;

    // First document (VFR ceiling) fetched at BASE; a later amendment
    // (LIFR ceiling) fetched three hours in takes authority from there
    let first = document(BASE, BASE + 24 * HOUR, 5000);
    let second = document(BASE + 2 * HOUR, BASE + 26 * HOUR, 300);
    test_app
        .store
        .store_taf(TafSnapshot::from_document(&first, BASE, scheme).unwrap())
        .await
        .unwrap();
    test_app
        .store
        .store_taf(TafSnapshot::from_document(&second, BASE + 3 * HOUR, scheme).unwrap())
        .await
        .unwrap();

    // Two stored observations inside the range, one outside it
    for (offset, category) in [(0, "VFR"), (2 * HOUR, "MVFR"), (10 * HOUR, "IFR")] {
        test_app
            .store
            .store_metar(metar_row(BASE + offset, category))
            .await
            .unwrap();
    }

    let uri = format!(
        "/stations/khis/history?start={}&end={}",
        BASE,
        BASE + 6 * HOUR
    );
    let response = test_app.app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;

    assert_eq!(history["station_id"], "KHIS");

    let observed = history["observed"].as_array().unwrap();
    assert_eq!(observed.len(), 2);
    assert_eq!(observed[0]["category"], "VFR");
    assert_eq!(observed[1]["category"], "MVFR");

    let forecast = history["forecast"].as_array().unwrap();
    assert_eq!(forecast.len(), 6);
    let categories: Vec<&str> = forecast
        .iter()
        .map(|p| p["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["VFR", "VFR", "VFR", "LIFR", "LIFR", "LIFR"]);

    // Ticks land on the hourly grid with no duplicates at the cutover
    let ticks: Vec<i64> = forecast
        .iter()
        .map(|p| p["at"].as_i64().unwrap())
        .collect();
    assert_eq!(
        ticks,
        (0..6).map(|h| BASE + h * HOUR).collect::<Vec<i64>>()
    );
}

#[tokio::test]
async fn history_with_no_snapshots_is_empty_not_an_error() {
    let test_app = spawn_app().await;

    let uri = format!(
        "/stations/khis/history?start={}&end={}",
        BASE,
        BASE + 2 * HOUR
    );
    let response = test_app.app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let history = body_json(response).await;
    assert_eq!(history["observed"].as_array().unwrap().len(), 0);
    assert_eq!(history["forecast"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn history_rejects_an_inverted_range() {
    let test_app = spawn_app().await;

    let uri = format!(
        "/stations/khis/history?start={}&end={}",
        BASE + 2 * HOUR,
        BASE
    );
    let response = test_app.app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
