//! HRY Chat — streaming chat server.

use std::sync::Arc;

use hrychat_core::AppConfig;
use hrychat_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // Initialize tracing
    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "check-config" | "--check-config" => {
                match AppState::new(config.clone()) {
                    Ok(_) => {
                        println!("{}", serde_json::to_string_pretty(&config.to_public())?);
                        return Ok(());
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        std::process::exit(1);
                    }
                }
            }
            "--help" | "-h" | "help" => {
                println!("HRY Chat — streaming chat server");
                println!();
                println!("Usage: hrychat [command]");
                println!();
                println!("Commands:");
                println!("  (none)          Start the server");
                println!("  check-config    Validate configuration and provider selection");
                println!("  help            Show this help message");
                println!();
                println!("Configuration is read from the environment and an optional .env file");
                println!("(override the path with HRYCHAT_ENV_FILE).");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'hrychat help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    info!(
        "Starting {}: provider={}, model={}, mock_mode={}",
        config.app_name, config.provider, config.model, config.mock_mode
    );

    // Build application state (fails fast on configuration errors)
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config)?);

    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HRY Chat server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        "Server stopped; discarding {} stored conversations",
        state.conversations.len()
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
