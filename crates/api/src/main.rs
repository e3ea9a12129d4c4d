use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mansei_api::config::ServerConfig;
use mansei_api::router::build_app_router;
use mansei_api::state::AppState;
use mansei_notify::{EmailConfig, EmailSender, NotificationSender, NullSender, SmtpSender};
use mansei_store::{BookingStore, QuoteMirror};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mansei_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Stores ---
    let bookings = Arc::new(BookingStore::new(config.booking_ttl()));
    let quotes = Arc::new(QuoteMirror::new(config.quote_ttl()));

    let sweeper_cancel = tokio_util::sync::CancellationToken::new();
    let booking_sweeper =
        bookings.start_sweeper(config.sweep_interval(), sweeper_cancel.clone());
    let quote_sweeper = quotes.start_sweeper(config.sweep_interval(), sweeper_cancel.clone());
    tracing::info!("Store sweepers started");

    // --- Email transport ---
    let email: Arc<dyn EmailSender> = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(host = %email_config.smtp_host, "SMTP transport configured");
            Arc::new(SmtpSender::new(email_config))
        }
        None => {
            tracing::warn!("SMTP_HOST not set; confirmation emails will not be delivered");
            Arc::new(NullSender)
        }
    };
    let notifier = Arc::new(NotificationSender::new(email));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        bookings,
        quotes,
        notifier,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweeper_cancel.cancel();
    let drain = Duration::from_secs(config.shutdown_timeout_secs.min(5));
    let _ = tokio::time::timeout(drain, booking_sweeper).await;
    let _ = tokio::time::timeout(drain, quote_sweeper).await;
    tracing::info!("Store sweepers stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
