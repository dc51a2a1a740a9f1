//! Tally Server
//!
//! HTTP JSON API over the ingestion pipeline: free-text ingestion,
//! transaction and asset CRUD, and the two spending reports.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use tally_extractor::Extractor;
use tally_llm::{LlmError, OpenAiProvider};
use tally_store::{SqliteStore, StoreError};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database could not be opened
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    /// Model client could not be built
    #[error("LLM client error: {0}")]
    Llm(#[from] LlmError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins; otherwise `default_level` applies.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        eprintln!("Warning: tracing subscriber already installed");
    }
}

/// Open the configured database
pub fn open_store(config: &ServerConfig) -> Result<SqliteStore, StoreError> {
    if config.app.db_path == ":memory:" {
        SqliteStore::open_in_memory()
    } else {
        SqliteStore::new(&config.app.db_path)
    }
}

/// Build the model client described by the `[openai]` section
pub fn build_provider(config: &ServerConfig) -> Result<OpenAiProvider, LlmError> {
    let mut provider = OpenAiProvider::new(&config.openai.token, &config.openai.model)?
        .with_timeout(config.openai_timeout())?
        .with_max_retries(config.openai.max_retries);
    if let Some(base_url) = &config.openai.base_url {
        provider = provider.with_base_url(base_url);
    }
    Ok(provider)
}

/// Start the Tally HTTP server
///
/// Opens the database, builds the model client and serves until SIGINT or
/// SIGTERM.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting Tally server");
    info!("Database: {}", config.app.db_path);
    info!("Model: {}", config.openai.model);

    let store = open_store(&config)?;
    let provider = build_provider(&config)?;
    let state = AppState::new(Extractor::new(provider, config.extractor.clone()), store);

    let app = create_router(state).layer(TimeoutLayer::new(config.http_timeout()));

    let listener = TcpListener::bind(&config.http.address).await?;
    info!("Listening on {}", config.http.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_domain::traits::LlmProvider;

    #[test]
    fn test_build_provider_from_config() {
        let mut config = ServerConfig::default_test_config();
        config.openai.base_url = Some("http://localhost:8000/v1".to_string());

        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_open_in_memory_store() {
        let config = ServerConfig::default_test_config();
        assert!(open_store(&config).is_ok());
    }
}
