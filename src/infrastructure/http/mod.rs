use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::domain::repositories::{SnippetRepository, UserRepository};
use crate::infrastructure::config::{AppConfig, ServerConfig};
use crate::infrastructure::persistence::{
    Database, InMemorySnippetRepository, InMemoryUserRepository, PostgresSnippetRepository,
    PostgresUserRepository,
};
use crate::infrastructure::session::{MemorySessionStore, SessionConfig, SessionManager};
use crate::presentation::middleware::{Chains, RequestLogConfig};
use crate::presentation::routes;
use crate::presentation::state::AppState;
use crate::presentation::templates::PageRenderer;

/// Create the main application router
pub fn create_app(state: AppState, config: &ServerConfig) -> Router {
    let chains = Chains::new(&state, RequestLogConfig::default());

    let transport = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http());

    routes::create_routes(state, &chains, &config.static_dir, config.request_timeout)
        .layer(transport)
}

/// Build the shared state: record stores, sessions and the page renderer
///
/// # Errors
/// Returns an error if the database is configured but unreachable
pub async fn build_state(config: &AppConfig) -> Result<(AppState, Option<Database>)> {
    let database = match &config.database.dsn {
        Some(dsn) => {
            let database = Database::connect(dsn, &config.database).await?;
            database.migrate().await?;
            Some(database)
        }
        None => {
            warn!("No DSN configured; records are kept in memory and lost on restart");
            None
        }
    };

    let (snippets, users): (Arc<dyn SnippetRepository>, Arc<dyn UserRepository>) = match &database {
        Some(database) => (
            Arc::new(PostgresSnippetRepository::new(database.pool().clone())),
            Arc::new(PostgresUserRepository::new(database.pool().clone())),
        ),
        None => (Arc::new(InMemorySnippetRepository::new()), Arc::new(InMemoryUserRepository::new())),
    };

    let session_config = SessionConfig {
        lifetime: config.session.lifetime,
        secure: config.session.secure,
        ..SessionConfig::default()
    };
    let sessions = SessionManager::new(
        Arc::new(MemorySessionStore::new()),
        config.session.secret.as_bytes(),
        session_config,
    )
    .context("failed to initialise session manager")?;

    let state = AppState::new(snippets, users, sessions, Arc::new(PageRenderer::new()));
    Ok((state, database))
}

/// Start the HTTP server
///
/// # Errors
/// Returns an error if the server fails to start
pub async fn start_server(config: AppConfig) -> Result<()> {
    if config.session.uses_default_secret() {
        warn!("Session cookies are signed with the default development secret; set --secret");
    }
    let (state, database) = build_state(&config).await?;

    let sweeper = state.sessions.spawn_sweeper(config.session.sweep_interval);
    let app = create_app(state, &config.server);
    let addr = config.server.addr;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    if let Some(database) = database {
        database.close().await;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
