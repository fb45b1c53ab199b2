use herald_common::config::AppConfig;
use herald_notifier::Dispatcher;
use herald_store::{ResilientStore, StoreError};

use herald_bot::StartupCoordinator;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald_bot=info,herald_notifier=info,herald_store=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("Herald bot starting...");

    if let Err(e) = run().await {
        let fatal = e
            .downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_fatal);
        tracing::error!(error = %e, fatal, "Herald bot exited with error");
        std::process::exit(1);
    }

    tracing::info!("Herald bot stopped.");
}

async fn run() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Lazy pool: nothing connects until the first store operation
    let store = ResilientStore::from_config(&config)?;
    store.migrate().await?;

    let dispatcher = Dispatcher::from_config(&config)?;
    for channel in dispatcher.channels() {
        tracing::info!(channel = %channel, "Channel ready");
    }
    if dispatcher.active_count() == 0 {
        tracing::warn!("No chat platform configured, messages will not be delivered");
    }

    let mut startup = StartupCoordinator::new(&store, &dispatcher, config.restart_message);
    if let Err(e) = startup.run().await {
        dispatcher.shutdown(config.shutdown_grace()).await;
        return Err(e.into());
    }

    tracing::info!("Running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal, draining deliveries...");

    dispatcher.shutdown(config.shutdown_grace()).await;
    Ok(())
}
