use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::{Method, StatusCode};
use tower::ServiceExt;

use crate::helpers::spawn_app;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn dashboard_page_renders() {
    let test_app = spawn_app().await;

    let response = test_app.app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Flight categories"));
    assert!(body.contains("hx-get=\"/fragments/flight-categories\""));
}

#[tokio::test]
async fn fragment_with_an_empty_store_shows_no_data() {
    let test_app = spawn_app().await;

    let response = test_app
        .app
        .clone()
        .oneshot(get("/fragments/flight-categories"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("No data"));
}

#[tokio::test]
async fn fragment_renders_category_tags_for_ingested_data() {
    let test_app = spawn_app().await;

    let batch = serde_json::json!([
        {
            "icaoId": "KSEA",
            "reportTime": "2024-08-12 15:53:00",
            "wdir": 250,
            "wspd": 7,
            "visib": "2",
            "clouds": [{"cover": "BKN", "base": 700}]
        }
    ]);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/ingest/metars")
        .header(hyper::header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&batch).unwrap()))
        .unwrap();
    let response = test_app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_app
        .app
        .clone()
        .oneshot(get("/fragments/flight-categories"))
        .await
        .unwrap();
    let body = body_text(response).await;

    assert!(body.contains("KSEA"));
    // Ceiling 700 and visibility 2 both classify IFR
    assert!(body.contains("tag is-warning"));
    assert!(body.contains("700 ft"));
    assert!(body.contains("250 7 kt"));
}
