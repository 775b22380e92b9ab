#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use snippetbox::infrastructure::{
    config::{AppConfig, LogFormat, LoggingConfig},
    http::start_server,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::from_args()?;

    init_tracing(&config.logging);
    install_panic_hook();

    info!("Starting Snippetbox");
    info!("Configuration loaded: server will bind to {}", config.server.addr);

    if let Err(e) = start_server(config).await {
        error!("Server error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Initialize structured logging
fn init_tracing(config: &LoggingConfig) {
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snippetbox=debug,tower_http=info".into()),
        )
        .init();
}

/// Route panic reports through tracing so they carry the location
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let backtrace = std::backtrace::Backtrace::capture();
        error!(panic.location = %location, panic.backtrace = %backtrace, "{info}");
    }));
}
