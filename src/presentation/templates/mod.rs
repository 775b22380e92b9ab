//! Page rendering.
//!
//! Pages are compiled `maud` functions registered by name once at startup.
//! Handlers only know page names and [`TemplateData`], so any [`Renderer`]
//! can stand in for the real one in tests.

mod pages;

use chrono::{DateTime, Utc};
use maud::Markup;
use std::collections::HashMap;
use thiserror::Error;

use crate::application::forms::Form;
use crate::domain::entities::{Snippet, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("the template {name} does not exist")]
    TemplateNotFound { name: String },
}

/// Everything a page may display
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub current_year: i32,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    pub form: Option<Form>,
    pub flash: Option<String>,
    pub authenticated_user: Option<User>,
    pub csrf_token: String,
}

/// Turns a page name plus data into an HTML document
pub trait Renderer: Send + Sync {
    fn render(&self, name: &str, data: &TemplateData) -> Result<String, RenderError>;
}

type Page = fn(&TemplateData) -> Markup;

/// The compiled page set
pub struct PageRenderer {
    pages: HashMap<&'static str, Page>,
}

impl PageRenderer {
    pub fn new() -> Self {
        let pages: [(&'static str, Page); 7] = [
            ("home.page", pages::home),
            ("show.page", pages::show),
            ("create.page", pages::create),
            ("signup.page", pages::signup),
            ("login.page", pages::login),
            ("password.page", pages::password),
            ("about.page", pages::about),
        ];
        Self { pages: pages.into_iter().collect() }
    }

    pub fn has_page(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PageRenderer {
    fn render(&self, name: &str, data: &TemplateData) -> Result<String, RenderError> {
        let page = self
            .pages
            .get(name)
            .ok_or_else(|| RenderError::TemplateNotFound { name: name.to_string() })?;
        Ok(page(data).into_string())
    }
}

/// Format a timestamp as `02 Jan 2006 at 15:04` in UTC
pub fn human_date(t: &DateTime<Utc>) -> String {
    if t.timestamp() == 0 {
        return String::new();
    }
    t.format("%d %b %Y at %H:%M").to_string()
}
