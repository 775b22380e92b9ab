use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::AppError;
use crate::domain::entities::{User, UserId};
use crate::domain::repositories::{RepositoryError, UserRepository};
use crate::infrastructure::session::Session;
use crate::presentation::state::AppState;

/// Session key remembering the logged-in user
pub const USER_ID_KEY: &str = "userID";
/// Where unauthenticated visitors of protected pages are sent
pub const LOGIN_PATH: &str = "/user/login";

/// Identity resolved for the current request. Read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(Arc<User>);

impl AuthenticatedUser {
    pub fn new(user: User) -> Self {
        Self(Arc::new(user))
    }

    pub fn user(&self) -> &User {
        &self.0
    }

    pub fn id(&self) -> UserId {
        self.0.id
    }
}

impl fmt::Display for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthenticatedUser(id={}, email={})", self.0.id, self.0.email)
    }
}

/// Optional identity for handlers that serve both anonymous and known users
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

/// Mandatory identity; anonymous requests are sent to the login page
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthenticatedUser>().cloned().ok_or_else(redirect_to_login)
    }
}

/// Resolve the session's remembered user id into an identity.
///
/// A user id pointing at a user that no longer exists is dropped from the
/// session and the request continues anonymously.
pub async fn resolve_identity(
    session: &Session,
    users: &dyn UserRepository,
) -> Result<Option<AuthenticatedUser>, RepositoryError> {
    let user_id = match session.get::<UserId>(USER_ID_KEY) {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return Ok(None),
        Err(e) => {
            warn!(error = %e, "Discarding unreadable user id from session");
            session.remove(USER_ID_KEY);
            return Ok(None);
        }
    };

    match users.get(user_id).await {
        Ok(user) => Ok(Some(AuthenticatedUser::new(user))),
        Err(RepositoryError::NotFound) => {
            info!(%user_id, "Removing stale user id from session");
            session.remove(USER_ID_KEY);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Authentication middleware: publishes [`AuthenticatedUser`] when the session
/// names an existing user
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = request.extensions().get::<Session>().cloned().ok_or_else(|| {
        AppError::Internal { message: "authentication needs a session".to_string() }
    })?;

    if let Some(user) = resolve_identity(&session, state.users.as_ref()).await? {
        debug!("Authenticated user: {}", user);
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

fn redirect_to_login() -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, HeaderValue::from_static(LOGIN_PATH)),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response()
}

/// Route guard: anonymous requests get `302 Found` to the login page and the
/// wrapped handler never runs. Protected pages are not cached.
pub async fn require_authenticated_user(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        debug!(uri = %request.uri(), "Redirecting anonymous request to login");
        return redirect_to_login();
    }

    let mut response = next.run(request).await;
    response.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
