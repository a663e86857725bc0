//! Pacbot Pilot - decision-to-robot bridge
//!
//! This is the main entry point for the pilot. It handles:
//! - The pub/sub feed connection delivering game snapshots
//! - The Bluetooth serial link carrying commands and acknowledgments
//! - The cooperative tick loop driving policy, motion, and telemetry

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pacbot_pilot::config::Config;
use pacbot_pilot::feed::FeedClient;
use pacbot_pilot::link::SerialRobotLink;
use pacbot_pilot::map::Map;
use pacbot_pilot::pilot::Pilot;
use pacbot_pilot::policy::GreedyPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Pacbot Pilot");
    info!("Engine address: {}", config.engine_addr);
    info!("Serial device: {}", config.serial_device);

    let map = Arc::new(Map::new());

    // Connect the snapshot/telemetry feed
    let feed = FeedClient::connect(&config.engine_addr).await?;

    // Open the robot link
    let robot = SerialRobotLink::open(
        &config.serial_device,
        config.serial_baud,
        config.serial_timeout,
    )?;

    let policy = GreedyPolicy::new(map.clone());

    let (pilot, handle) = Pilot::new(
        &config,
        map,
        robot,
        policy,
        feed.snapshots,
        feed.telemetry,
    );

    let pilot_task = tokio::spawn(pilot.run());

    info!(
        decision_hz = config.decision_hz,
        world_hz = config.world_hz,
        "Pilot running"
    );

    shutdown_signal().await;
    handle.shutdown();
    pilot_task.await?;

    info!("Pilot shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
