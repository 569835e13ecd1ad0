//! Foliant ingestion API server.
//!
//! Wires the database pool, the dual-transport publisher, the broadcast
//! hub, and the retry scheduler behind the ingest router, with health
//! probes and graceful shutdown.

mod config;
mod health;
mod logging;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::Config;
use foliant_api_ingest::{ingest_router, IngestState};
use foliant_delivery::{OutboundPublisher, RetryScheduler, WebhookSender};
use foliant_stream::BroadcastHub;
use health::{health_handler, livez_handler, readyz_handler, HealthState};

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on missing required values)
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        transport_mode = %config.transport_mode,
        "Starting foliant ingest API"
    );

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    let webhook = match WebhookSender::new(
        config.processor_webhook_url.clone(),
        config.webhook_signing_secret.clone(),
    ) {
        Ok(sender) => sender,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build webhook client");
            std::process::exit(1);
        }
    };

    let publisher = OutboundPublisher::new(
        config.transport_mode,
        webhook.clone(),
        pool.clone(),
        config.retry_policy,
    );
    #[cfg(feature = "kafka")]
    let publisher = attach_producer(publisher);
    if let Err(e) = publisher.validate() {
        tracing::error!(error = %e, "Transport configuration invalid");
        std::process::exit(1);
    }

    let hub = BroadcastHub::new();

    RetryScheduler::new(pool.clone(), webhook, hub.clone(), config.retry_policy)
        .with_sweep_interval(config.sweep_interval)
        .with_batch_size(config.sweep_batch_size)
        .spawn();

    let state = IngestState::new(
        pool.clone(),
        publisher,
        hub,
        config.public_base_url.clone(),
        config.embedding_dimension,
    );

    let shutting_down = Arc::new(AtomicBool::new(false));
    let health_state = HealthState {
        pool,
        shutting_down: shutting_down.clone(),
    };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/livez", get(livez_handler))
        .route("/readyz", get(readyz_handler))
        .with_state(health_state)
        .merge(ingest_router(state))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Invalid bind address");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutting_down))
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

#[cfg(feature = "kafka")]
fn attach_producer(publisher: OutboundPublisher) -> OutboundPublisher {
    use foliant_events::{EventProducer, KafkaConfig};

    match KafkaConfig::from_env().and_then(EventProducer::new) {
        Ok(producer) => publisher.with_producer(Arc::new(producer)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize Kafka producer");
            std::process::exit(1);
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal(shutting_down: Arc<AtomicBool>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    // Readiness flips to 503 before connection draining starts.
    shutting_down.store(true, Ordering::Release);
    info!("Readiness probe set to unhealthy, draining traffic");
}
