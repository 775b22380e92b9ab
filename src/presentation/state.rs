use std::sync::Arc;

use crate::domain::repositories::{SnippetRepository, UserRepository};
use crate::infrastructure::session::SessionManager;
use crate::presentation::templates::Renderer;

/// Shared handles available to every handler and interceptor
#[derive(Clone)]
pub struct AppState {
    pub snippets: Arc<dyn SnippetRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionManager,
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    pub fn new(
        snippets: Arc<dyn SnippetRepository>,
        users: Arc<dyn UserRepository>,
        sessions: SessionManager,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self { snippets, users, sessions, renderer }
    }
}
