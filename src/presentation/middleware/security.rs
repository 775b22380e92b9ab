use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, header},
    middleware::Next,
    response::Response,
};

const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");

/// Set the anti-framing and XSS-filter headers on `headers`
pub fn apply_security_headers(headers: &mut HeaderMap) {
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
}

/// Security headers middleware, applied to every response including errors
pub async fn secure_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    apply_security_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    async fn failing_handler() -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    #[tokio::test]
    async fn test_headers_on_success_and_error() {
        let app = Router::new()
            .route("/ok", get(|| async { "OK" }))
            .route("/bad", get(failing_handler))
            .layer(from_fn(secure_headers));

        for uri in ["/ok", "/bad", "/missing"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();

            assert_eq!(response.headers().get("x-frame-options").unwrap(), "deny", "{uri}");
            assert_eq!(
                response.headers().get("x-xss-protection").unwrap(),
                "1; mode=block",
                "{uri}"
            );
        }
    }
}
