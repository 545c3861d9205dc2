use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radar_detector::config::DetectorConfig;
use radar_detector::monitor::Monitor;
use radar_detector::relay::{ChangeRelay, RelayClient};
use radar_detector::source::HetznerSource;
use radar_detector::telemetry::{AnalyticsSink, HttpAnalyticsSink, TelemetrySink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radar_detector=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DetectorConfig::from_env().context("Invalid detector configuration")?;
    tracing::info!(
        api_base = %config.hetzner_api_base,
        interval_ms = config.fetch_interval.as_millis() as u64,
        relay = config.relay.is_some(),
        analytics = config.analytics.is_some(),
        "Loaded detector configuration"
    );

    let source = HetznerSource::new(&config.hetzner_api_base, &config.hetzner_api_token)
        .context("Failed to build Hetzner API client")?;

    let relay: Option<Arc<dyn ChangeRelay>> = match &config.relay {
        Some(relay) => Some(Arc::new(
            RelayClient::new(&relay.url, &relay.api_key).context("Failed to build relay client")?,
        )),
        None => {
            tracing::warn!("INGEST_URL not set, changes will not be relayed");
            None
        }
    };

    let analytics: Option<Arc<dyn AnalyticsSink>> = match &config.analytics {
        Some(analytics) => Some(Arc::new(
            HttpAnalyticsSink::new(&analytics.url, analytics.token.clone())
                .context("Failed to build analytics client")?,
        )),
        None => None,
    };

    let monitor = Monitor::new(
        Arc::new(source),
        TelemetrySink::new(analytics, relay),
        config.fetch_interval,
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(monitor.run(cancel.clone()));

    shutdown_signal().await;
    cancel.cancel();
    handle.await.context("Monitor task panicked")?;

    tracing::info!("Detector stopped");
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
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
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
