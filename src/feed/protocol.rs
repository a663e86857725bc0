//! Feed message definitions
//! These are the wire types exchanged with the game engine's pub/sub server

use serde::{Deserialize, Serialize};

use crate::map::Dir;
use crate::protocol::Mode;

/// A grid coordinate as reported by the engine's camera tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i16,
    pub y: i16,
}

/// Ghost behavior state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Chase,
    Scatter,
    Frightened,
}

/// One ghost in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ghost {
    pub x: i16,
    pub y: i16,
    pub state: GhostState,
}

/// One periodic world snapshot from the engine, immutable per arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub score: u32,
    pub lives: u32,
    pub mode: Mode,
    pub pacman: GridPos,
    pub red_ghost: Ghost,
    pub pink_ghost: Ghost,
    pub orange_ghost: Ghost,
    pub blue_ghost: Ghost,
}

impl GameSnapshot {
    pub fn ghosts(&self) -> [Ghost; 4] {
        [
            self.red_ghost,
            self.pink_ghost,
            self.orange_ghost,
            self.blue_ghost,
        ]
    }
}

/// Messages from the engine to this client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineMsg {
    /// Periodic world snapshot
    Snapshot { state: GameSnapshot },
}

/// Dead-reckoned robot pose published at decision-tick rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Telemetry {
    pub x: i16,
    pub y: i16,
    pub direction: Dir,
}

/// Messages from this client to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PilotMsg {
    /// Subscribe to snapshot delivery
    Subscribe { topics: Vec<String> },
    /// Robot pose report
    Telemetry { pose: Telemetry },
}
