use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
    routing::get,
};
use regex::Regex;
use snippetbox::domain::entities::UserId;
use snippetbox::infrastructure::config::ServerConfig;
use snippetbox::infrastructure::http::create_app;
use snippetbox::infrastructure::session::{MemorySessionStore, SessionConfig, SessionManager};
use snippetbox::presentation::middleware::{RequestLogConfig, standard_chain};
use snippetbox::presentation::state::AppState;
use snippetbox::presentation::templates::PageRenderer;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use super::fixtures::{CountingSnippetRepository, CountingUserRepository};

const SECRET: &[u8] = b"s6Ndh+nzHbS*+9Pk8qGWhTzbpa@ge";

static CSRF_TOKEN_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="csrf_token" value="([^"]+)""#).unwrap());

/// The full application wired to counting in-memory stores
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub snippets: Arc<CountingSnippetRepository>,
    pub users: Arc<CountingUserRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_request_timeout(Duration::from_secs(5))
    }

    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        let snippets = Arc::new(CountingSnippetRepository::default());
        let users = Arc::new(CountingUserRepository::default());
        let sessions = SessionManager::new(
            Arc::new(MemorySessionStore::new()),
            SECRET,
            SessionConfig { secure: false, ..SessionConfig::default() },
        )
        .unwrap();
        let state = AppState::new(
            snippets.clone(),
            users.clone(),
            sessions,
            Arc::new(PageRenderer::new()),
        );

        let config = ServerConfig {
            addr: "127.0.0.1:0".parse().unwrap(),
            request_timeout,
            static_dir: std::env::temp_dir(),
        };
        let router = create_app(state.clone(), &config);

        Self { router, state, snippets, users }
    }

    /// A browser with its own cookie jar
    pub fn client(&self) -> TestClient {
        TestClient::new(self.router.clone())
    }

    /// A router serving only `/panic` behind the standard chain
    pub fn panicking_router(&self) -> Router {
        let routes = Router::new().route("/panic", get(explode));
        standard_chain(RequestLogConfig::default()).wrap(routes).with_state(self.state.clone())
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> UserId {
        self.users.inner.create(name, email, password).await.unwrap()
    }

    /// A client already logged in as a freshly registered user
    pub async fn logged_in_client(&self, email: &str, password: &str) -> (TestClient, UserId) {
        let id = self.register("Alice", email, password).await;
        let client = self.client();

        let response = client.submit("/user/login", "/user/login", &[("email", email), ("password", password)]).await;
        response.assert_redirect(StatusCode::SEE_OTHER, "/snippet/create");

        (client, id)
    }
}

/// Drives the router like a browser: keeps cookies between requests
pub struct TestClient {
    router: Router,
    cookies: Mutex<HashMap<String, String>>,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self { router, cookies: Mutex::new(HashMap::new()) }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder().uri(path).method(Method::GET);
        self.send(request, Body::empty()).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .method(Method::POST)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        let body = serde_urlencoded::to_string(fields).unwrap();
        self.send(request, Body::from(body)).await
    }

    /// Fetch the CSRF token rendered on `page`
    pub async fn csrf_token(&self, page: &str) -> String {
        let response = self.get(page).await;
        response.assert_status(StatusCode::OK);
        extract_csrf_token(&response.body)
    }

    /// Load `page`, then post `fields` plus its CSRF token to `action`
    pub async fn submit(&self, page: &str, action: &str, fields: &[(&str, &str)]) -> TestResponse {
        let token = self.csrf_token(page).await;
        let mut fields = fields.to_vec();
        fields.push(("csrf_token", &token));
        self.post_form(action, &fields).await
    }

    async fn send(&self, mut request: axum::http::request::Builder, body: Body) -> TestResponse {
        let cookie_header = {
            let cookies = self.cookies.lock().unwrap();
            cookies.iter().map(|(name, value)| format!("{name}={value}")).collect::<Vec<_>>().join("; ")
        };
        if !cookie_header.is_empty() {
            request = request.header(header::COOKIE, cookie_header);
        }

        let response = self.router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        self.store_cookies(response.headers());
        TestResponse::new(response).await
    }

    fn store_cookies(&self, headers: &HeaderMap) {
        let mut cookies = self.cookies.lock().unwrap();
        for value in headers.get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

pub fn extract_csrf_token(body: &str) -> String {
    CSRF_TOKEN_RX
        .captures(body)
        .map(|captures| captures[1].to_string())
        .unwrap_or_else(|| panic!("no csrf token in page:\n{body}"))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();

        Self { status, headers, body }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(self.status, expected, "Response body: {}", self.body);
    }

    pub fn assert_redirect(&self, expected: StatusCode, location: &str) {
        self.assert_status(expected);
        assert_eq!(self.header("location"), Some(location));
    }

    pub fn assert_security_headers(&self) {
        assert_eq!(self.header("x-frame-options"), Some("deny"), "status {}", self.status);
        assert_eq!(self.header("x-xss-protection"), Some("1; mode=block"), "status {}", self.status);
    }
}
