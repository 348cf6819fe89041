mod api;
mod middleware;
mod scheduler;

use std::net::SocketAddr;
use std::sync::Arc;

use dealsdb_ingest::{IngestContext, OutcomeSink, TracingSink};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, build_cors, AppState};
use crate::middleware::RateLimitState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(dealsdb_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    config.require_catalog_api_key()?;

    let registry = Arc::new(dealsdb_core::load_categories(&config.categories_path)?);
    tracing::info!(
        nodes = registry.len(),
        roots = registry.roots().len(),
        path = %config.categories_path.display(),
        "loaded category registry"
    );

    let pool_config = dealsdb_db::PoolConfig::from_app_config(&config);
    let pool = dealsdb_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = dealsdb_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let ingest = Arc::new(IngestContext::from_app_config(pool.clone(), &config)?);
    let sink: Arc<dyn OutcomeSink> = Arc::new(TracingSink);

    let _scheduler = if config.schedule.enabled {
        Some(
            scheduler::build_scheduler(
                Arc::clone(&ingest),
                Arc::clone(&registry),
                config.schedule,
                Arc::clone(&sink),
            )
            .await?,
        )
    } else {
        tracing::warn!("scheduler disabled; categories refresh only on manual trigger");
        None
    };

    let is_development = matches!(config.env, dealsdb_core::Environment::Development);
    let cors = build_cors(&config.cors_origins, is_development);
    let state = AppState {
        pool,
        registry,
        ingest,
        sink,
    };
    let rate_limit = RateLimitState::from_config(config.rate_limit);
    let app = build_app(state, cors, rate_limit).layer(TraceLayer::new_for_http());

    tracing::info!(addr = %config.bind_addr, env = %config.env, "dealsdb-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
