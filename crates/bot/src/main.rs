mod commands;
mod telegram;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use encodarr_core::{
    load_config, validate_config, FeedPoller, FfmpegTranscoder, HttpFetcher, JsonFeedClient,
    Ledger, Messenger, MessengerPublisher, Orchestrator, OrchestratorConfig, ProgressReporter,
    Transcoder,
};

use commands::CommandLoop;
use telegram::{TelegramClient, TelegramMessenger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("ENCODARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Incoming dir: {:?}", config.storage.incoming_dir);
    info!("Outgoing dir: {:?}", config.storage.outgoing_dir);
    info!("Ledger path: {:?}", config.storage.ledger_path);

    tokio::fs::create_dir_all(&config.storage.incoming_dir)
        .await
        .context("Failed to create incoming dir")?;
    tokio::fs::create_dir_all(&config.storage.outgoing_dir)
        .await
        .context("Failed to create outgoing dir")?;

    // Load the completed-task ledger
    let ledger = Arc::new(
        Ledger::load(&config.storage.ledger_path)
            .await
            .context("Failed to load ledger")?,
    );
    info!("Ledger loaded with {} entries", ledger.len().await);

    // Telegram transport
    let telegram = Arc::new(TelegramClient::new(
        &config.telegram.token,
        config.telegram.chat_id,
    ));
    let messenger: Arc<dyn Messenger> =
        Arc::new(TelegramMessenger::new(Arc::clone(&telegram)));

    // Stage runners
    let fetcher = HttpFetcher::new(config.storage.incoming_dir.clone());
    let transcoder = FfmpegTranscoder::new(config.transcoder.clone());
    transcoder
        .validate()
        .await
        .context("Transcoder validation failed")?;
    info!(
        "Transcoder ready ({} crf {})",
        config.transcoder.video_codec, config.transcoder.crf
    );
    let publisher = MessengerPublisher::new(Arc::clone(&messenger));

    let reporter = Arc::new(ProgressReporter::new(
        Arc::clone(&messenger),
        Duration::from_secs(config.reporter.update_interval_secs),
    ));

    // Orchestrator
    let orchestrator = Arc::new(Orchestrator::new(
        OrchestratorConfig {
            outgoing_dir: config.storage.outgoing_dir.clone(),
            ..Default::default()
        },
        Arc::clone(&ledger),
        fetcher,
        transcoder,
        publisher,
        Arc::clone(&reporter),
    ));
    let handle = orchestrator.handle();

    let run_loop = Arc::clone(&orchestrator);
    let orchestrator_task = tokio::spawn(async move { run_loop.run().await });
    info!("Orchestrator started");

    // Shutdown fan-out for the auxiliary loops
    let (shutdown_tx, _) = broadcast::channel(1);

    // Feed poller, if configured
    let poller_task = match &config.feed {
        Some(feed_config) => {
            info!("Starting feed poller for {}", feed_config.url);
            let poller = FeedPoller::new(
                JsonFeedClient::new(feed_config.url.clone()),
                handle.clone(),
                Arc::clone(&ledger),
                feed_config.clone(),
            );
            let shutdown_rx = shutdown_tx.subscribe();
            Some(tokio::spawn(async move { poller.run(shutdown_rx).await }))
        }
        None => {
            info!("No feed configured, manual submissions only");
            None
        }
    };

    // Chat command loop
    let command_loop = CommandLoop::new(
        Arc::clone(&telegram),
        handle.clone(),
        Arc::clone(&reporter),
        config.storage.incoming_dir.clone(),
    );
    let command_shutdown_rx = shutdown_tx.subscribe();
    let command_task = tokio::spawn(async move { command_loop.run(command_shutdown_rx).await });

    reporter.announce("🤖 encodarr is up").await;

    // Run until Ctrl+C or SIGTERM
    shutdown_signal().await;
    info!("Shutting down...");

    let _ = shutdown_tx.send(());
    orchestrator.stop();

    if let Some(task) = poller_task {
        if let Err(e) = task.await {
            warn!("Feed poller task panicked: {}", e);
        }
    }
    if let Err(e) = command_task.await {
        warn!("Command loop task panicked: {}", e);
    }
    if let Err(e) = orchestrator_task.await {
        warn!("Orchestrator task panicked: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
