//! Game-engine feed: inbound snapshots, outbound telemetry

pub mod client;
pub mod protocol;

pub use client::{FeedClient, FeedError};
pub use protocol::{EngineMsg, GameSnapshot, Ghost, GhostState, GridPos, PilotMsg, Telemetry};
