//! TCP client for the game engine's pub/sub server
//!
//! Newline-delimited JSON in both directions: the reader task forwards
//! snapshots into the pilot's inbox, the writer task drains telemetry.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::feed::protocol::{EngineMsg, GameSnapshot, PilotMsg, Telemetry};

/// Feed transport failures
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("engine connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine message encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Connected feed client handle
pub struct FeedClient {
    /// Inbound snapshots, consumed by the pilot loop
    pub snapshots: mpsc::Receiver<GameSnapshot>,
    /// Outbound telemetry, drained by the writer task
    pub telemetry: mpsc::Sender<Telemetry>,
}

impl FeedClient {
    /// Connect, subscribe to snapshot delivery, and spawn the reader and
    /// writer tasks.
    pub async fn connect(addr: &str) -> Result<Self, FeedError> {
        let stream = TcpStream::connect(addr).await?;
        info!(addr = %addr, "Connected to game engine");

        let (read_half, mut write_half) = stream.into_split();

        let subscribe = PilotMsg::Subscribe {
            topics: vec!["light_state".to_string()],
        };
        let mut line = serde_json::to_string(&subscribe)?;
        line.push('\n');
        write_half.write_all(line.as_bytes()).await?;

        let (snapshot_tx, snapshot_rx) = mpsc::channel(64);
        let (telemetry_tx, mut telemetry_rx) = mpsc::channel::<Telemetry>(64);

        // Reader task: engine -> pilot inbox
        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(text)) => match serde_json::from_str::<EngineMsg>(&text) {
                        Ok(EngineMsg::Snapshot { state }) => {
                            if snapshot_tx.send(state).await.is_err() {
                                debug!("Snapshot inbox closed, stopping reader");
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to parse engine message");
                        }
                    },
                    Ok(None) => {
                        info!("Engine closed the feed");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Feed read error");
                        break;
                    }
                }
            }
        });

        // Writer task: telemetry channel -> engine
        tokio::spawn(async move {
            while let Some(pose) = telemetry_rx.recv().await {
                let msg = PilotMsg::Telemetry { pose };
                let mut line = match serde_json::to_string(&msg) {
                    Ok(line) => line,
                    Err(e) => {
                        error!(error = %e, "Failed to encode telemetry");
                        continue;
                    }
                };
                line.push('\n');
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    error!(error = %e, "Telemetry write failed");
                    break;
                }
            }
            debug!("Telemetry channel closed, stopping writer");
        });

        Ok(Self {
            snapshots: snapshot_rx,
            telemetry: telemetry_tx,
        })
    }
}
