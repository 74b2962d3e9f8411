use std::sync::Arc;

use anyhow::anyhow;
use avwx_core::ClassificationScheme;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use hyper::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use log::{error, info};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dashboard_handler, db,
    db::{Database, SnapshotStore},
    flight_categories, flight_categories_fragment, get_stations, ingest_metars, ingest_tafs,
    routes, station_history, taf_now,
};

#[derive(Clone)]
pub struct AppState {
    pub remote_url: String,
    pub scheme: ClassificationScheme,
    pub store: Arc<dyn SnapshotStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::stations::category_routes::get_stations,
        routes::stations::category_routes::flight_categories,
        routes::stations::category_routes::taf_now,
        routes::stations::category_routes::station_history,
        routes::ingest::upload_routes::ingest_metars,
        routes::ingest::upload_routes::ingest_tafs,
    ),
    components(
        schemas(
                db::MetarSnapshot,
                db::TafSnapshot,
                routes::stations::category_routes::StationCategories,
                routes::stations::category_routes::LiveTaf,
                routes::ingest::upload_routes::IngestSummary,
                crate::history::StationHistory,
                crate::history::CategoryPoint,
            )
    ),
    tags(
        (name = "avwx monitor api", description = "a RESTful api serving flight-category snapshots derived from METAR observations and TAF forecasts")
    )
)]
struct ApiDoc;

pub async fn build_app_state(
    remote_url: String,
    scheme: ClassificationScheme,
    snapshot_dir: String,
) -> Result<AppState, anyhow::Error> {
    let store = Arc::new(
        Database::new(&snapshot_dir)
            .await
            .map_err(|e| anyhow!("error setting up snapshot store: {}", e))?,
    );

    Ok(AppState {
        remote_url,
        scheme,
        store,
    })
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        // UI routes
        .route("/", get(dashboard_handler))
        // HTMX fragment routes
        .route(
            "/fragments/flight-categories",
            get(flight_categories_fragment),
        )
        // API routes
        .route("/health", get(health))
        .route("/stations", get(get_stations))
        .route("/stations/flight-categories", get(flight_categories))
        .route("/stations/{station}/taf/now", get(taf_now))
        .route("/stations/{station}/history", get(station_history))
        .route("/ingest/metars", post(ingest_metars))
        .route("/ingest/tafs", post(ingest_tafs))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, String)> {
    state.store.health_check().await.map_err(|e| {
        error!("health check failed: {}", e);
        (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {}", e))
    })?;
    Ok("ok")
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}
