use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::error;

use super::security::apply_security_headers;

/// Turn a panic in the wrapped chain into a generic 500 and close the connection
pub async fn recover_panic(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            error!(
                %method,
                %uri,
                panic = panic_message(panic.as_ref()),
                "Recovered from panic while handling request"
            );
            panic_response()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

fn panic_response() -> Response {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let mut response = (status, status.canonical_reason().unwrap_or_default()).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    apply_security_headers(headers);
    response
}
