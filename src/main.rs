use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use zeroid_actions::config::ServerConfig;
use zeroid_actions::processor;
use zeroid_actions::state::ProcessorBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let server = ServerConfig::from_env().expect("Failed to load server configuration");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&server.log_level)
        }))
        .init();

    let build_processor: ProcessorBuilder = Arc::new(processor::from_env);
    let once = std::env::args().skip(1).any(|arg| arg == "--once");

    let (app, state) = zeroid_actions::build_app(server.clone(), build_processor);

    // Cron mode: one invocation, summary on stdout.
    if once {
        let (summary, ok) = match state.invoke().await {
            Ok(summary) => (summary, true),
            Err(e) => {
                tracing::error!("{e}");
                (e.summary(), false)
            }
        };
        println!("{}", serde_json::to_string(&summary)?);
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    tracing::info!("Starting zeroid-actions");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let schedule = server.schedule_secs.map(|secs| {
        zeroid_actions::worker::spawn_schedule(
            state.clone(),
            shutdown_rx,
            Duration::from_secs(secs),
        )
    });

    let addr = SocketAddr::new(server.host, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = schedule {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
