//! Contest Scheduler - Application Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contest_scheduler::{
    config::Config,
    constants::{MAX_REQUEST_BODY_BYTES, REQUEST_TIMEOUT_SECONDS},
    db::{self, CompetitionRepository, QueuedSubmissionRepository},
    handlers, metrics,
    services::{HttpGrader, RedisNotifier},
    state::AppState,
    Collaborators, Supervisor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting contest scheduler...");
    tracing::info!("Environment: {}", config.environment);

    metrics::init_metrics();

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    // Initialize Redis connection
    tracing::info!("Connecting to Redis...");
    let redis_client = RedisClient::open(config.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    let collaborators = Collaborators {
        competitions: Arc::new(CompetitionRepository::new(db_pool.clone())),
        submissions: Arc::new(QueuedSubmissionRepository::new(db_pool)),
        grader: Arc::new(HttpGrader::new(&config.judge)?),
        notifier: Arc::new(RedisNotifier::new(
            redis_conn,
            config.redis.channel_prefix.clone(),
        )),
    };

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let supervisor = Supervisor::start(
        collaborators,
        &config.scheduler,
        config.workers.min_pool_size,
    )
    .await?;

    let state = AppState::new(supervisor.queue(), supervisor.activity());

    // Build the router
    let app = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::metrics_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECONDS)))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .with_state(state);

    // Start the server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await?;

    // Intake is closed; only now stop the workers and the scheduler
    tracing::info!("Shutting down background tasks...");
    supervisor.shutdown().await;

    tracing::info!("Contest scheduler shutdown complete");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!("Failed to install SIGTERM handler: {}", e);
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

        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });
}
