use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use llm_relay::config::{Config, Settings};
use llm_relay::relay::RelayClient;
use llm_relay::server;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Configure logging
    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt().json().init();
        }
        _ => {
            tracing_subscriber::fmt().init();
        }
    }

    // Fail fast: the process never serves with incomplete configuration.
    let settings = match Settings::from_config(&config) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    info!(
        provider = settings.provider,
        base_url = settings.base_url,
        model = settings.model,
        timeout_seconds = settings.timeout.as_secs(),
        "relay configured"
    );

    // Outbound HTTP client, shared by all requests via the relay client.
    // The per-request deadline comes from API_TIMEOUT, not the pool.
    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .build()
        .expect("failed to build HTTP client");

    let relay = RelayClient::new(settings, http_client);

    let app = server::build_router(relay);

    let addr = normalize_addr(&config.addr);
    let listener = TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        error!(addr = addr, error = %e, "failed to bind");
        std::process::exit(1);
    });

    info!(addr = addr, "server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "server error");
            std::process::exit(1);
        });

    info!("server stopped");
}

/// Convert Go-style ":8000" to "0.0.0.0:8000".
fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
