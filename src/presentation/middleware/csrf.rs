//! CSRF protection.
//!
//! Each session owns a random secret. Rendered forms never embed the secret
//! itself: every response gets a freshly masked copy (`pad || pad ^ secret`,
//! base64), so the token changes on each page and resists compression
//! oracles. A state-changing request passes only if the token it carries
//! unmasks to the session's secret.

use axum::{
    body::{Body, to_bytes},
    extract::{FromRequestParts, Request},
    http::{HeaderMap, Method, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use tracing::{debug, warn};

use super::error::AppError;
use crate::application::forms::FormValues;
use crate::infrastructure::security::signing::{TOKEN_BYTES, random_bytes};
use crate::infrastructure::session::Session;

/// Form field carrying the token
pub const CSRF_FIELD: &str = "csrf_token";
/// Header alternative to the form field
pub const CSRF_HEADER: &str = "x-csrf-token";
/// Session key holding the unmasked secret
const SESSION_KEY: &str = "csrf_token";
/// Largest submission body the guard buffers
pub const MAX_FORM_BYTES: usize = 1024 * 1024;

/// Masked token to embed in the forms of the current response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CsrfToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CsrfToken>().cloned().ok_or_else(|| AppError::Internal {
            message: "CSRF guard is not installed on this route".to_string(),
        })
    }
}

/// Submitted form values as buffered by the guard
impl<S> FromRequestParts<S> for FormValues
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<FormValues>().cloned().ok_or_else(|| AppError::BadRequest {
            message: "request carries no form submission".to_string(),
        })
    }
}

/// Methods that must not change state and therefore skip verification
pub fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn secret_from_session(session: &Session) -> Option<[u8; TOKEN_BYTES]> {
    let encoded = session.get_string(SESSION_KEY)?;
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    bytes.try_into().ok()
}

fn ensure_secret(session: &Session) -> Result<[u8; TOKEN_BYTES], AppError> {
    if let Some(secret) = secret_from_session(session) {
        return Ok(secret);
    }
    let secret = random_bytes();
    session.put(SESSION_KEY, &URL_SAFE_NO_PAD.encode(secret))?;
    debug!("Issued new CSRF secret for session");
    Ok(secret)
}

/// One-time-pad the secret so every rendered token looks different
pub fn mask(secret: &[u8; TOKEN_BYTES]) -> String {
    let pad = random_bytes();
    let mut token = Vec::with_capacity(TOKEN_BYTES * 2);
    token.extend_from_slice(&pad);
    token.extend(pad.iter().zip(secret).map(|(p, s)| p ^ s));
    URL_SAFE_NO_PAD.encode(token)
}

/// Whether `submitted` is a masked (or raw) encoding of `secret`
pub fn verify(secret: &[u8; TOKEN_BYTES], submitted: &str) -> bool {
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(submitted.trim()) else {
        return false;
    };
    let candidate: Vec<u8> = match bytes.len() {
        len if len == TOKEN_BYTES * 2 => {
            let (pad, masked) = bytes.split_at(TOKEN_BYTES);
            pad.iter().zip(masked).map(|(p, m)| p ^ m).collect()
        }
        len if len == TOKEN_BYTES => bytes,
        _ => return false,
    };
    constant_time_eq(&candidate, secret)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn reject(parts: &Parts, reason: &str) -> Response {
    warn!(method = %parts.method, uri = %parts.uri, reason, "CSRF validation failed");
    AppError::BadRequest { message: "CSRF token validation failed".to_string() }.into_response()
}

/// CSRF guard middleware. Requires [`session_enable`](super::session::session_enable)
/// to run first.
pub async fn csrf_guard(mut request: Request, next: Next) -> Response {
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return AppError::Internal { message: "CSRF guard needs a session".to_string() }
            .into_response();
    };

    if is_idempotent(request.method()) {
        let secret = match ensure_secret(&session) {
            Ok(secret) => secret,
            Err(e) => return e.into_response(),
        };
        request.extensions_mut().insert(CsrfToken(mask(&secret)));
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();

    let Ok(bytes) = to_bytes(body, MAX_FORM_BYTES).await else {
        return reject(&parts, "unreadable or oversized body");
    };
    let form = if is_form_urlencoded(&parts.headers) {
        match FormValues::from_urlencoded(&bytes) {
            Ok(form) => form,
            Err(_) => return reject(&parts, "malformed form body"),
        }
    } else {
        FormValues::default()
    };

    let submitted = form
        .first(CSRF_FIELD)
        .map(str::to_owned)
        .or_else(|| parts.headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()).map(str::to_owned));

    let verified = match (secret_from_session(&session), submitted) {
        (Some(secret), Some(token)) => verify(&secret, &token).then_some(secret),
        _ => None,
    };
    let Some(secret) = verified else {
        return reject(&parts, "missing or mismatched token");
    };

    debug!(method = %parts.method, uri = %parts.uri, "CSRF token validated");
    parts.extensions.insert(form);
    parts.extensions.insert(CsrfToken(mask(&secret)));
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{body_string, session_router, with_cookie};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[test]
    fn test_masked_tokens_differ_but_verify() {
        let secret = random_bytes();
        let first = mask(&secret);
        let second = mask(&secret);

        assert_ne!(first, second);
        assert!(verify(&secret, &first));
        assert!(verify(&secret, &second));
        assert!(verify(&secret, &URL_SAFE_NO_PAD.encode(secret)));
    }

    #[test]
    fn test_foreign_or_garbage_tokens_rejected() {
        let secret = random_bytes();
        let other = random_bytes();

        assert!(!verify(&secret, &mask(&other)));
        assert!(!verify(&secret, ""));
        assert!(!verify(&secret, "not base64 !!"));
        assert!(!verify(&secret, &URL_SAFE_NO_PAD.encode([0u8; 5])));
    }

    #[test]
    fn test_idempotent_methods() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::HEAD));
        assert!(is_idempotent(&Method::OPTIONS));
        assert!(is_idempotent(&Method::TRACE));
        assert!(!is_idempotent(&Method::POST));
        assert!(!is_idempotent(&Method::DELETE));
    }

    fn counting_app(hits: Arc<AtomicUsize>) -> axum::Router {
        session_router(move |router| {
            router.route(
                "/form",
                axum::routing::get(|token: CsrfToken| async move { token.as_str().to_string() })
                    .post(move |values: FormValues| {
                        let hits = Arc::clone(&hits);
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            values.get("title").to_string()
                        }
                    }),
            )
        })
    }

    fn post(cookie: Option<&str>, body: String) -> Request {
        let builder = Request::builder()
            .method(Method::POST)
            .uri("/form")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        with_cookie(builder, cookie).body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_with_form_field() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(Arc::clone(&hits));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/form").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = crate::test_utils::session_cookie(&response).unwrap();
        let token = body_string(response).await;

        let response =
            app.oneshot(post(Some(&cookie), format!("csrf_token={token}&title=Hello"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Hello");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_header_token_accepted() {
        let app = counting_app(Arc::new(AtomicUsize::new(0)));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/form").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = crate::test_utils::session_cookie(&response).unwrap();
        let token = body_string(response).await;

        let mut request = post(Some(&cookie), "title=Hi".to_string());
        request.headers_mut().insert(CSRF_HEADER, token.parse().unwrap());

        assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_and_wrong_tokens_never_reach_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(Arc::clone(&hits));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/form").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = crate::test_utils::session_cookie(&response).unwrap();

        let missing = app.clone().oneshot(post(Some(&cookie), "title=x".into())).await.unwrap();
        let wrong = app
            .clone()
            .oneshot(post(Some(&cookie), format!("csrf_token={}&title=x", mask(&random_bytes()))))
            .await
            .unwrap();
        let no_session = app.oneshot(post(None, "csrf_token=abc&title=x".into())).await.unwrap();

        for response in [missing, wrong, no_session] {
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_string(response).await, "Bad Request");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
