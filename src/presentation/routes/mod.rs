use axum::{
    Router,
    routing::{get, post},
};
use std::path::Path;
use std::time::Duration;
use tower_http::{services::ServeDir, timeout::TimeoutLayer};

use crate::presentation::handlers::{pages, snippets, users};
use crate::presentation::middleware::Chains;
use crate::presentation::state::AppState;

/// Create all application routes with application state.
///
/// The request timeout runs inside the standard chain, so timed-out requests
/// carry the security headers too.
pub fn create_routes(
    state: AppState,
    chains: &Chains,
    static_dir: &Path,
    request_timeout: Duration,
) -> Router {
    let router = Router::new()
        .merge(chains.dynamic.then(page_routes()))
        .merge(chains.protected.then(protected_routes()))
        .route("/ping", get(pages::ping))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(pages::not_found)
        .layer(TimeoutLayer::new(request_timeout));

    chains.standard.wrap(router).with_state(state)
}

/// Pages open to anonymous visitors
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/snippet/{id}", get(snippets::show_snippet))
        .route("/user/signup", get(users::signup_form).post(users::signup))
        .route("/user/login", get(users::login_form).post(users::login))
}

/// Pages that require a logged-in user
fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/snippet/create", get(snippets::create_snippet_form).post(snippets::create_snippet))
        .route("/user/logout", post(users::logout))
        .route("/user/password", get(users::change_password_form).post(users::change_password))
}
