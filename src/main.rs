use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use straight_pool::{
    persistence::{
        load_snapshot, FileKeyValueStore, InMemoryKeyValueStore, InMemoryMatchRepository,
        KeyValueStore, MatchRepository, PostgresMatchRepository, SnapshotSaver,
    },
    router, AppConfig, AppState, MatchService,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "straight_pool=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting straight pool scorekeeper");

    if let Err(e) = run().await {
        error!(error = %e, "Server stopped with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let match_repository: Arc<dyn MatchRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            let repository = PostgresMatchRepository::new(pool);
            repository.ensure_schema().await?;
            info!("Storing finished matches in PostgreSQL");
            Arc::new(repository)
        }
        None => {
            warn!("DATABASE_URL not set, finished matches are kept in memory");
            Arc::new(InMemoryMatchRepository::new())
        }
    };

    let store: Arc<dyn KeyValueStore> = match &config.snapshot_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Storing match snapshots on disk");
            Arc::new(FileKeyValueStore::new(dir.clone()))
        }
        None => Arc::new(InMemoryKeyValueStore::new()),
    };

    let snapshot = load_snapshot(store.as_ref()).await;
    let (saver, saver_handle) = SnapshotSaver::spawn(store, config.saver.clone());
    let match_service = Arc::new(MatchService::restore(
        config.rules.clone(),
        snapshot,
        saver,
        match_repository.clone(),
    ));

    let app = router(AppState::new(match_service.clone(), match_repository));

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Write whatever is still pending before exiting
    match_service.flush().await;
    saver_handle.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
