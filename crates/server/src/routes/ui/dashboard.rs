use std::sync::Arc;

use axum::{extract::State, response::Html};

use crate::{templates::dashboard_page, AppState};

/// Handler for the dashboard page (GET /)
pub async fn dashboard_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(dashboard_page(&state.remote_url).into_string())
}
