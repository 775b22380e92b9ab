//! Middleware modules for HTTP request processing
//!
//! Every request passes the standard chain:
//! - panic recovery
//! - request logging
//! - security headers
//!
//! Page routes additionally pass the dynamic chain (session, CSRF guard,
//! authentication), and protected pages end with the authentication guard.

pub mod auth;
pub mod chain;
pub mod csrf;
pub mod error;
pub mod logging;
pub mod recover;
pub mod security;
pub mod session;

use axum::middleware::{from_fn, from_fn_with_state};

pub use auth::{AuthenticatedUser, CurrentUser};
pub use chain::{Chain, Interceptor};
pub use csrf::CsrfToken;
pub use error::AppError;
pub use logging::RequestLogConfig;

use crate::presentation::state::AppState;

/// Chains shared by the route table, built once at startup
#[derive(Debug, Clone)]
pub struct Chains {
    /// `[recover_panic, log_request, secure_headers]`, around everything
    pub standard: Chain<AppState>,
    /// `[session_enable, csrf_guard, authenticate]`, around page routes
    pub dynamic: Chain<AppState>,
    /// The dynamic chain plus `require_authenticated_user`
    pub protected: Chain<AppState>,
}

impl Chains {
    pub fn new(state: &AppState, logging: RequestLogConfig) -> Self {
        let dynamic = dynamic_chain(state);
        let protected = dynamic.append([Interceptor::new(
            "require_authenticated_user",
            from_fn(auth::require_authenticated_user),
        )]);
        Self { standard: standard_chain(logging), dynamic, protected }
    }
}

pub fn standard_chain(logging: RequestLogConfig) -> Chain<AppState> {
    Chain::new([
        Interceptor::new("recover_panic", from_fn(recover::recover_panic)),
        Interceptor::new("log_request", from_fn(logging::log_request(logging))),
        Interceptor::new("secure_headers", from_fn(security::secure_headers)),
    ])
}

pub fn dynamic_chain(state: &AppState) -> Chain<AppState> {
    Chain::new([
        Interceptor::new("session_enable", from_fn_with_state(state.clone(), session::session_enable)),
        Interceptor::new("csrf_guard", from_fn(csrf::csrf_guard)),
        Interceptor::new("authenticate", from_fn_with_state(state.clone(), auth::authenticate)),
    ])
}
