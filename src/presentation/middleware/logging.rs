use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::{
    future::Future,
    net::{IpAddr, SocketAddr},
    pin::Pin,
    time::{Duration, Instant},
};
use tracing::{info, warn};

/// Logging configuration for the request logger
#[derive(Debug, Clone)]
pub struct RequestLogConfig {
    /// Requests slower than this are logged as warnings
    pub slow_request_threshold: Duration,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self { slow_request_threshold: Duration::from_secs(1) }
    }
}

/// Extract client IP from proxy headers
fn extract_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok());

    forwarded.or_else(|| {
        headers.get("x-real-ip").and_then(|value| value.to_str().ok()).and_then(|ip| ip.parse().ok())
    })
}

/// Best-effort remote address: proxy headers first, then the socket peer
fn remote_addr(request: &Request) -> Option<String> {
    extract_client_ip(request.headers()).map(|ip| ip.to_string()).or_else(|| {
        request.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0.to_string())
    })
}

/// Request logging middleware
pub fn log_request(
    config: RequestLogConfig,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone {
    move |request: Request, next: Next| {
        let config = config.clone();
        Box::pin(async move {
            let start_time = Instant::now();
            let method = request.method().clone();
            let uri = request.uri().clone();
            let version = request.version();
            let remote_addr = remote_addr(&request);
            let request_id =
                request.headers().get("x-request-id").and_then(|id| id.to_str().ok()).map(String::from);

            info!(
                remote_addr = remote_addr.as_deref().unwrap_or("-"),
                proto = ?version,
                %method,
                %uri,
                request_id = request_id.as_deref().unwrap_or("-"),
                "Request started"
            );

            let response = next.run(request).await;
            let duration = start_time.elapsed();
            let status = response.status().as_u16();

            if duration > config.slow_request_threshold {
                warn!(
                    %method,
                    %uri,
                    status,
                    duration_ms = duration.as_millis(),
                    request_id = request_id.as_deref().unwrap_or("-"),
                    "Slow request detected"
                );
            } else {
                info!(%method, %uri, status, duration_ms = duration.as_millis(), "Request finished");
            }

            response
        })
    }
}
