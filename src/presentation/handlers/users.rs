use axum::{extract::State, response::Response};
use tracing::info;

use super::{PageContext, see_other};
use crate::application::forms::{EMAIL_RX, Form, FormValues};
use crate::domain::repositories::RepositoryError;
use crate::presentation::middleware::auth::USER_ID_KEY;
use crate::presentation::middleware::{AppError, AuthenticatedUser};
use crate::presentation::state::AppState;
use crate::presentation::templates::TemplateData;

const MIN_PASSWORD_CHARS: usize = 8;
const MAX_FIELD_CHARS: usize = 255;

fn form_data(form: Form) -> TemplateData {
    TemplateData { form: Some(form), ..TemplateData::default() }
}

pub async fn signup_form(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    page.render(&state, "signup.page", form_data(Form::default()))
}

pub async fn signup(
    State(state): State<AppState>,
    page: PageContext,
    values: FormValues,
) -> Result<Response, AppError> {
    let mut form = Form::new(values);
    form.required(&["name", "email", "password"]);
    form.max_length("name", MAX_FIELD_CHARS);
    form.max_length("email", MAX_FIELD_CHARS);
    form.matches_pattern("email", &EMAIL_RX);
    form.min_length("password", MIN_PASSWORD_CHARS);

    if !form.valid() {
        return page.render(&state, "signup.page", form_data(form));
    }

    match state.users.insert(form.get("name"), form.get("email"), form.get("password")).await {
        Ok(()) => {}
        Err(RepositoryError::DuplicateEmail) => {
            form.errors.add("email", "Address is already in use");
            return page.render(&state, "signup.page", form_data(form));
        }
        Err(e) => return Err(e.into()),
    }

    page.flash("Your signup was successful. Please log in.")?;
    Ok(see_other("/user/login"))
}

pub async fn login_form(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    page.render(&state, "login.page", form_data(Form::default()))
}

pub async fn login(
    State(state): State<AppState>,
    page: PageContext,
    values: FormValues,
) -> Result<Response, AppError> {
    let mut form = Form::new(values);

    let id = match state.users.authenticate(form.get("email"), form.get("password")).await {
        Ok(id) => id,
        Err(RepositoryError::InvalidCredentials) => {
            form.errors.add("generic", "Email or Password is incorrect");
            return page.render(&state, "login.page", form_data(form));
        }
        Err(e) => return Err(e.into()),
    };

    page.session.renew_token();
    page.session.put(USER_ID_KEY, &id)?;
    info!(user_id = %id, "User logged in");

    Ok(see_other("/snippet/create"))
}

pub async fn logout(page: PageContext, user: AuthenticatedUser) -> Result<Response, AppError> {
    page.session.remove(USER_ID_KEY);
    page.session.renew_token();
    page.flash("You've been logged out successfully!")?;
    info!(user_id = %user.id(), "User logged out");

    Ok(see_other("/"))
}

pub async fn change_password_form(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    page.render(&state, "password.page", form_data(Form::default()))
}

pub async fn change_password(
    State(state): State<AppState>,
    page: PageContext,
    user: AuthenticatedUser,
    values: FormValues,
) -> Result<Response, AppError> {
    let mut form = Form::new(values);
    form.required(&["current_password", "new_password", "new_password_confirmation"]);
    form.min_length("new_password", MIN_PASSWORD_CHARS);
    form.matches("new_password", "new_password_confirmation");

    if !form.valid() {
        return page.render(&state, "password.page", form_data(form));
    }

    match state.users.authenticate(&user.user().email, form.get("current_password")).await {
        Ok(_) => {}
        Err(RepositoryError::InvalidCredentials) => {
            form.errors.add("current_password", "Current password is incorrect");
            return page.render(&state, "password.page", form_data(form));
        }
        Err(e) => return Err(e.into()),
    }

    state.users.update_password(user.id(), form.get("new_password")).await?;
    page.flash("Your password has been updated!")?;
    info!(user_id = %user.id(), "User changed password");

    Ok(see_other("/"))
}
