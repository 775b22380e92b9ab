use axum::{extract::State, response::Response};

use super::PageContext;
use crate::presentation::middleware::AppError;
use crate::presentation::state::AppState;
use crate::presentation::templates::TemplateData;

/// Home page listing the latest snippets
pub async fn home(State(state): State<AppState>, page: PageContext) -> Result<Response, AppError> {
    let snippets = state.snippets.latest().await?;
    page.render(&state, "home.page", TemplateData { snippets, ..TemplateData::default() })
}

pub async fn about(State(state): State<AppState>, page: PageContext) -> Result<Response, AppError> {
    page.render(&state, "about.page", TemplateData::default())
}

/// Liveness probe
pub async fn ping() -> &'static str {
    "OK"
}

/// Fallback for unmatched paths
pub async fn not_found() -> AppError {
    AppError::not_found()
}
