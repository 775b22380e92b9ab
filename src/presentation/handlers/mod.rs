pub mod pages;
pub mod snippets;
pub mod users;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Datelike, Utc};

use crate::infrastructure::session::Session;
use crate::presentation::middleware::{AppError, CsrfToken, CurrentUser};
use crate::presentation::state::AppState;
use crate::presentation::templates::TemplateData;

/// Session key for one-shot confirmation messages
pub const FLASH_KEY: &str = "flash";

/// Per-request inputs every rendered page needs
pub struct PageContext {
    pub session: Session,
    pub csrf_token: CsrfToken,
    pub current_user: CurrentUser,
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let csrf_token = CsrfToken::from_request_parts(parts, state).await?;
        let Ok(current_user) = CurrentUser::from_request_parts(parts, state).await;
        Ok(Self { session, csrf_token, current_user })
    }
}

impl PageContext {
    /// Queue a message for the next rendered page
    pub fn flash(&self, message: &str) -> Result<(), AppError> {
        self.session.put(FLASH_KEY, message)?;
        Ok(())
    }

    /// Fill the per-request defaults into `data` and render page `name`
    pub fn render(
        &self,
        state: &AppState,
        name: &str,
        mut data: TemplateData,
    ) -> Result<Response, AppError> {
        data.current_year = Utc::now().year();
        data.flash = self.session.pop_string(FLASH_KEY);
        data.authenticated_user = self.current_user.0.as_ref().map(|user| user.user().clone());
        data.csrf_token = self.csrf_token.as_str().to_string();

        let body = state.renderer.render(name, &data)?;
        Ok(Html(body).into_response())
    }
}

/// Post/redirect/get target after a successful submission
pub fn see_other(location: &str) -> Response {
    Redirect::to(location).into_response()
}
