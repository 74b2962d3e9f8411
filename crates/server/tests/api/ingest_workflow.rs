use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::{header, Method, StatusCode};
use serde_json::{from_slice, json, Value};
use tower::ServiceExt;

use crate::helpers::{spawn_app, spawn_app_with_store, unix_now, MockStore};

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

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

#[tokio::test]
async fn can_ingest_metars_idempotently() {
    let test_app = spawn_app().await;

    let batch = json!([
        {
            "icaoId": "KBOS",
            "reportTime": "2024-08-12 15:54:00",
            "temp": 24.4,
            "dewp": 14.4,
            "wdir": 290,
            "wspd": 12,
            "wgst": 19,
            "visib": "10+",
            "altim": 1015.2,
            "clouds": [{"cover": "SCT", "base": 4500}],
            "fltCat": "VFR",
            "rawOb": "KBOS 121554Z 29012G19KT 10SM SCT045 24/14 A2998"
        },
        {
            // No reportTime: no idempotence key, dropped
            "icaoId": "KUNK",
            "wspd": 5
        }
    ]);

    let response = test_app
        .app
        .clone()
        .oneshot(post_json("/ingest/metars", &batch))
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::OK);

    let summary = body_json(response).await;
    assert_eq!(summary["received"], 2);
    assert_eq!(summary["stored"], 1);
    assert_eq!(summary["skipped"], 1);

    // The same batch again stores nothing new
    let response = test_app
        .app
        .clone()
        .oneshot(post_json("/ingest/metars", &batch))
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["stored"], 0);
    assert_eq!(summary["skipped"], 2);

    let response = test_app.app.clone().oneshot(get("/stations")).await.unwrap();
    let stations = body_json(response).await;
    assert_eq!(stations, json!(["KBOS"]));

    let response = test_app
        .app
        .clone()
        .oneshot(get("/stations/flight-categories?stations=kbos"))
        .await
        .unwrap();
    let categories = body_json(response).await;
    assert_eq!(categories[0]["station_id"], "KBOS");
    assert_eq!(categories[0]["metar"]["flight_category"], "VFR");
    assert_eq!(categories[0]["metar"]["wind_gust"], 19);
    assert_eq!(categories[0]["taf"], Value::Null);
}

#[tokio::test]
async fn ingest_freezes_the_outlook_and_live_view_agrees() {
    let test_app = spawn_app().await;
    let now = unix_now();

    // One base period, OVC 800 for the whole validity window: IFR at
    // every horizon the window still covers
    let batch = json!([
        {
            "icaoId": "KTST",
            "validTimeFrom": now - 3600,
            "validTimeTo": now + 30 * 3600,
            "rawTAF": "TAF KTST ...",
            "fcsts": [
                {
                    "timeFrom": now - 3600,
                    "timeTo": now + 30 * 3600,
                    "wdir": 180,
                    "wspd": 10,
                    "visib": "6+",
                    "clouds": [{"cover": "OVC", "base": 800}]
                }
            ]
        }
    ]);

    let response = test_app
        .app
        .clone()
        .oneshot(post_json("/ingest/tafs", &batch))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["stored"], 1);

    // Re-fetch of the unchanged document is a no-op
    let response = test_app
        .app
        .clone()
        .oneshot(post_json("/ingest/tafs", &batch))
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["stored"], 0);
    assert_eq!(summary["skipped"], 1);

    let response = test_app
        .app
        .clone()
        .oneshot(get("/stations/flight-categories?stations=KTST"))
        .await
        .unwrap();
    let categories = body_json(response).await;
    let taf = &categories[0]["taf"];
    assert_eq!(taf["category_now"], "IFR");
    assert_eq!(taf["category_2h"], "IFR");
    assert_eq!(taf["category_24h"], "IFR");

    // The live adapter evaluates the same document with the same engine
    let response = test_app
        .app
        .clone()
        .oneshot(get("/stations/KTST/taf/now"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let live = body_json(response).await;
    assert_eq!(live["category"], "IFR");
    assert_eq!(live["ceiling_ft"], 800);
    assert_eq!(live["wind_speed"], 10);
    assert_eq!(live["wind_direction"], 180);
}

#[tokio::test]
async fn taf_now_for_an_unknown_station_is_not_found() {
    let test_app = spawn_app().await;

    let response = test_app
        .app
        .clone()
        .oneshot(get("/stations/KZZZ/taf/now"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_ok_on_a_fresh_store() {
    let test_app = spawn_app().await;

    let response = test_app.app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn store_failure_surfaces_as_internal_error() {
    let mut store = MockStore::new();
    store
        .expect_stations()
        .times(1)
        .returning(|| Err(server::db::Error::WriterClosed));

    let app = spawn_app_with_store(Arc::new(store));

    let response = app.oneshot(get("/stations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
