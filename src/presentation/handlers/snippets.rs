use axum::{
    extract::{Path, State},
    response::Response,
};

use super::{PageContext, see_other};
use crate::application::forms::{Form, FormValues};
use crate::domain::entities::SnippetId;
use crate::domain::repositories::RepositoryError;
use crate::presentation::middleware::AppError;
use crate::presentation::state::AppState;
use crate::presentation::templates::TemplateData;

const TITLE_MAX_CHARS: usize = 100;
const PERMITTED_EXPIRY_DAYS: [&str; 3] = ["365", "7", "1"];

/// Parse a path segment as a positive snippet id
fn parse_id(raw: &str) -> Option<SnippetId> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1).map(SnippetId::new)
}

pub async fn show_snippet(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    page: PageContext,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id).ok_or_else(AppError::not_found)?;

    let snippet = match state.snippets.get(id).await {
        Ok(snippet) => snippet,
        Err(RepositoryError::NotFound) => return Err(AppError::not_found()),
        Err(e) => return Err(e.into()),
    };

    page.render(&state, "show.page", TemplateData { snippet: Some(snippet), ..TemplateData::default() })
}

pub async fn create_snippet_form(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    page.render(&state, "create.page", TemplateData { form: Some(Form::default()), ..TemplateData::default() })
}

pub async fn create_snippet(
    State(state): State<AppState>,
    page: PageContext,
    values: FormValues,
) -> Result<Response, AppError> {
    let mut form = Form::new(values);
    form.required(&["title", "content", "expires"]);
    form.max_length("title", TITLE_MAX_CHARS);
    form.permitted_values("expires", &PERMITTED_EXPIRY_DAYS);

    if !form.valid() {
        return page.render(&state, "create.page", TemplateData { form: Some(form), ..TemplateData::default() });
    }

    let expires_days: u32 = form.get("expires").parse().map_err(|_| AppError::BadRequest {
        message: "expiry is not a number of days".to_string(),
    })?;
    let id = state.snippets.insert(form.get("title"), form.get("content"), expires_days).await?;

    page.flash("Snippet successfully created!")?;
    Ok(see_other(&format!("/snippet/{id}")))
}
