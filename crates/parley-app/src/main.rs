//! Parley application binary - composition root.
//!
//! 1. Parse CLI flags and resolve the configuration (file, env, flags)
//! 2. Initialize tracing
//! 3. Build the HTTP backend client and check that Ollama answers
//! 4. Capture the local model list once
//! 5. Start the idle-session sweep
//! 6. Serve the axum router until the process is stopped

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use parley_api::{routes, AppState};
use parley_backend::{HttpBackendClient, ModelBackend};
use parley_chat::SessionStore;
use parley_core::ParleyConfig;

use cli::CliArgs;

/// Periodically drop text chat sessions that have gone idle.
async fn session_sweep_loop(sessions: Arc<SessionStore>, every: Duration) {
    tracing::info!(interval_secs = every.as_secs(), "Session sweep started");

    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let evicted = sessions.evict_idle();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "Session sweep");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Loaded before tracing so the configured level applies; the
    // outcome is logged once the subscriber is up.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = if config_file.exists() {
        match ParleyConfig::load(&config_file) {
            Ok(config) => (config, None),
            Err(e) => (ParleyConfig::default(), Some(e)),
        }
    } else {
        (ParleyConfig::default(), None)
    };
    config.apply_process_env();
    args.apply_overrides(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Invalid configuration file, using defaults"
        ),
        None if config_file.exists() => {
            tracing::info!(path = %config_file.display(), "Configuration loaded")
        }
        None => tracing::info!(path = %config_file.display(), "No configuration file, using defaults"),
    }

    // Backends.
    let backend = Arc::new(HttpBackendClient::from_config(&config));
    let vision = config.vision_backend();
    tracing::info!(url = %vision.base_url, model = %vision.model, "Checking Ollama API");
    if !backend.probe(&vision).await {
        tracing::warn!("Ollama API is not reachable. Make sure Ollama is running (ollama serve)");
    }
    if !backend.probe(&config.cloud_chat_backend()).await {
        tracing::warn!("GEMINI_API_KEY is not set; cloud chat replies will report an error");
    }

    let local = config.local_chat_backend(&config.ollama.chat_model);
    let models = backend.list_models(&local).await;
    tracing::info!(count = models.len(), default = %local.model, "Local chat models");

    // === HTTP server ===

    let url = format!("http://{}:{}/", config.server.host, config.server.port);
    let sweep_every = config.sessions.sweep_interval();
    let state = AppState::new(config, backend, models);
    tokio::spawn(session_sweep_loop(Arc::clone(&state.sessions), sweep_every));
    tracing::info!("UI at {}", url);

    if let Err(e) = routes::start_server(state).await {
        tracing::error!(error = %e, "Server stopped");
        return Err(e.into());
    }

    Ok(())
}
