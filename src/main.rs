use anyhow::Context;
use darkquest::api::{self, app_state::AppState};
use darkquest::config::loader::ConfigLoader;
use darkquest::observability::{AppMetrics, init_tracing};
use darkquest::services::{
    GeneratorContext, LenientJsonParser, SessionRules, create_character_service,
    create_game_session_service, create_narrative_generator,
};
use darkquest::storage::StorageFactory;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    ConfigLoader::validate(&config).context("invalid configuration")?;

    // guard 存活期间文件日志持续刷盘
    let _log_guard = init_tracing(&config.logging)?;

    info!(
        app = %config.app_name,
        environment = %config.environment,
        "Starting Darkquest..."
    );

    let storage = Arc::new(
        StorageFactory::create(&config.database)
            .await
            .context("failed to open storage")?,
    );
    info!(backend = storage.backend_name(), "Storage initialized");

    let repository = storage.repository();
    let metrics = Arc::new(AppMetrics::default());

    let generator_context = Arc::new(GeneratorContext::new(config.generator.clone())?);
    let generator = create_narrative_generator(generator_context)?;
    info!(
        backend = %config.generator.backend,
        model = %config.generator.model,
        "Narrative generator initialized"
    );

    let session_service = create_game_session_service(
        repository.clone(),
        Arc::from(generator),
        Arc::new(LenientJsonParser::new()),
        SessionRules {
            context_window: config.game.context_window,
            max_choice_length: config.game.max_choice_length,
        },
        metrics.clone(),
    );
    let character_service = create_character_service(repository, metrics.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app_state = AppState::new(
        character_service,
        session_service,
        storage.clone(),
        metrics,
        config,
    );
    let router = api::initialize_api(app_state).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.close().await;
    info!("Storage closed, shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
