//! Shared fixtures for unit tests.

use async_trait::async_trait;
use axum::{
    Router,
    http::{header, request::Builder},
    middleware::{from_fn, from_fn_with_state},
    response::Response,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::entities::{User, UserId};
use crate::domain::repositories::{RepositoryError, UserRepository};
use crate::infrastructure::persistence::{InMemorySnippetRepository, InMemoryUserRepository};
use crate::infrastructure::session::{MemorySessionStore, SessionConfig, SessionManager};
use crate::presentation::middleware::{Chain, Interceptor, csrf, session};
use crate::presentation::state::AppState;
use crate::presentation::templates::PageRenderer;

pub const TEST_SECRET: &[u8] = b"s6Ndh+nzHbS*+9Pk8qGWhTzbpa@ge";

/// User store that counts lookups and can simulate an unavailable backend
#[derive(Debug, Default)]
pub struct CountingUserRepository {
    pub inner: InMemoryUserRepository,
    get_calls: AtomicUsize,
    failing: bool,
}

impl CountingUserRepository {
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing {
            return Err(RepositoryError::Internal { message: "store unavailable".to_string() });
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for CountingUserRepository {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.insert(name, email, password).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, RepositoryError> {
        self.check()?;
        self.inner.authenticate(email, password).await
    }

    async fn get(&self, id: UserId) -> Result<User, RepositoryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get(id).await
    }

    async fn update_password(&self, id: UserId, new_password: &str) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.update_password(id, new_password).await
    }
}

pub fn test_state() -> AppState {
    let sessions = SessionManager::new(
        Arc::new(MemorySessionStore::new()),
        TEST_SECRET,
        SessionConfig::default(),
    )
    .unwrap();

    AppState::new(
        Arc::new(InMemorySnippetRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
        sessions,
        Arc::new(PageRenderer::new()),
    )
}

/// Routes built by `routes` behind the session interceptor and CSRF guard
pub fn session_router(routes: impl FnOnce(Router<AppState>) -> Router<AppState>) -> Router {
    let state = test_state();
    let chain = Chain::new([
        Interceptor::new("session_enable", from_fn_with_state(state.clone(), session::session_enable)),
        Interceptor::new("csrf_guard", from_fn(csrf::csrf_guard)),
    ]);
    chain.then(routes(Router::new())).with_state(state)
}

/// `name=value` pair from the response's `Set-Cookie` header
pub fn session_cookie(response: &Response) -> Option<String> {
    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    set_cookie.split(';').next().map(str::to_owned)
}

pub fn with_cookie(builder: Builder, cookie: Option<&str>) -> Builder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
