use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use gallery_gate::{
    cli::{self, Cli, Command},
    config::Config,
    db::{create_pool, run_migrations, PgStore},
    storage::S3ObjectStore,
    tagging::{DisabledTagger, Tagger, WorkersAiTagger},
    token::{SecretKey, TokenCodec},
    utils::init_logger,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Keep the guard alive for the entire program lifetime
    let _log_guard = init_logger(&config.logging);

    let codec = TokenCodec::new(SecretKey::new(config.auth.secret.as_str())?);

    match cli.command() {
        Command::Serve => serve(config, codec).await,
        Command::IssueToken { user, ttl, claims } => {
            let ttl = ttl.unwrap_or(config.auth.token_ttl);
            println!("{}", cli::issue_token(&codec, user, ttl, claims)?);
            Ok(())
        }
        Command::VerifyToken { token } => {
            println!("{}", cli::verify_token(&codec, token)?);
            Ok(())
        }
    }
}

async fn serve(config: Config, codec: TokenCodec) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    // Connect to database
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;
    let store = Arc::new(PgStore::new(pool));

    let objects = Arc::new(S3ObjectStore::new(&config.storage)?);

    let tagger: Arc<dyn Tagger> = match WorkersAiTagger::from_config(&config.tagging)? {
        Some(tagger) => Arc::new(tagger),
        None => {
            warn!("TAGGING_ENDPOINT not set; uploads will be stored without tags");
            Arc::new(DisabledTagger)
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, codec, objects, store.clone(), store, tagger);
    let app = gallery_gate::create_router(state)?;

    // Start server
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
