use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use super::error::AppError;
use crate::infrastructure::session::Session;
use crate::presentation::state::AppState;

/// Load the client's session before the inner chain runs and commit it after
pub async fn session_enable(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match state.sessions.load(request.headers()).await {
        Ok(session) => session,
        Err(e) => return AppError::from(e).into_response(),
    };
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    match state.sessions.commit(&session).await {
        Ok(Some(cookie)) => match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => {
                error!(error = %e, "Session cookie is not a valid header value");
                return AppError::Internal { message: e.to_string() }.into_response();
            }
        },
        Ok(None) => {}
        Err(e) => return AppError::from(e).into_response(),
    }

    response
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| AppError::Internal {
            message: "session interceptor is not installed on this route".to_string(),
        })
    }
}
