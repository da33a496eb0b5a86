use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hark_api::config::ServerConfig;
use hark_api::router::build_app_router;
use hark_api::state::AppState;
use hark_core::retry::LinearBackoff;
use hark_db::repositories::PgJobStore;
use hark_db::JobStore;
use hark_engine::HttpTranscriber;
use hark_jobs::{dispatch_channel, Dispatcher, Orchestrator, ProgressReporter, Watchdog};
use hark_notify::WebhookNotifier;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hark_api=debug,hark_jobs=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = hark_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    hark_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    hark_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Metrics ---
    let metrics = hark_api::metrics::install_recorder();

    // --- Job services ---
    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool.clone()));
    let notifier = Arc::new(WebhookNotifier::new(config.webhook.clone()));
    let transcriber = Arc::new(HttpTranscriber::new(config.transcriber_url.clone()));

    let (progress, progress_task) = ProgressReporter::start(store.clone());
    let (dispatch, queue) = dispatch_channel(config.jobs.queue_capacity);

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        notifier.clone(),
        Arc::new(LinearBackoff::default()),
        dispatch,
        progress,
        config.jobs.clone(),
    ));

    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::start(
        queue,
        Arc::clone(&orchestrator),
        transcriber,
        config.jobs.worker_concurrency,
        cancel.clone(),
    );

    let watchdog = Watchdog::new(store, notifier.clone(), &config.jobs);
    let watchdog_cancel = cancel.clone();
    let watchdog_handle = tokio::spawn(async move { watchdog.run(watchdog_cancel).await });

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator: Arc::clone(&orchestrator),
        notifier,
        metrics,
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

    // Stop the workers and the watchdog. Workers finish their in-flight
    // attempt before exiting, so give them a grace period.
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(30), dispatcher.join()).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), watchdog_handle).await;
    tracing::info!("Job services stopped");

    // Drop the last progress sender so the persistence task drains and exits.
    drop(orchestrator);
    let _ = tokio::time::timeout(Duration::from_secs(5), progress_task).await;
    tracing::info!("Progress pipeline drained");

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
