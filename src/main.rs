// src/main.rs
use anyhow::Result;
use site_health_probe::{
    config,
    job::{HealthCheckJob, Scheduler},
    notifier::SmtpNotifier,
    secrets::KeyVaultSecretStore,
};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("site_health_probe=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Usage: site-health-probe [CONFIG_PATH] [--once]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let run_once = args.iter().any(|a| a == "--once");
    let config_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;

    let secrets = Arc::new(KeyVaultSecretStore::new(&config.key_vault)?);
    let notifier = Arc::new(SmtpNotifier::new(&config.mail));
    let job = Arc::new(HealthCheckJob::new(&config, secrets, notifier)?);

    info!(
        "Monitoring {} (alerts to {})",
        config.target.url, config.mail.recipient
    );

    let scheduler = Arc::new(Scheduler::new(job, &config.schedule));

    if run_once {
        // An external scheduler (cron, orchestrator) owns the timing.
        scheduler.invoke(None).await;
        return Ok(());
    }

    let runner = scheduler.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    shutdown_signal().await;
    scheduler.shutdown();
    handle.await?;

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

    info!("Shutdown signal received");
}
