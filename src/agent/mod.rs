//! Game-state distillation
//!
//! Folds raw engine snapshots into the decision-ready local model: pellet
//! bookkeeping, frightened-timer countdown, life tracking, and the robot's
//! confirmed orientation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::feed::protocol::{GameSnapshot, Ghost};
use crate::map::{Dir, Map, START_POS};
use crate::protocol::Mode;

/// Score awarded for a power pellet; the exact delta confirms consumption
pub const POWER_PELLET_VALUE: u32 = 50;
/// Frightened-timer maximum, in ghost moves
pub const GHOST_FRIGHT_TICKS: u8 = 40;
/// World ticks between frightened-timer decrements; at 24 Hz this matches
/// the engine's half-second frightened move period
pub const FRIGHT_DECAY_DIVISOR: u64 = 12;
/// Lives at the start of a session
pub const STARTING_LIVES: u32 = 3;

/// Decision-ready model handed to the policy, replaced wholesale on every
/// snapshot
#[derive(Debug, Clone)]
pub struct AgentState {
    pub pellets: HashSet<(i16, i16)>,
    pub power_pellets: HashSet<(i16, i16)>,
    /// Effective pacman cell: the respawn cell on the life-loss snapshot,
    /// the tracked cell otherwise
    pub pac: (i16, i16),
    pub ghosts: [Ghost; 4],
    pub score: u32,
    pub frightened_timer: u8,
    /// Orientation last confirmed by a robot acknowledgment
    pub orientation: Dir,
    pub mode: Mode,
    /// True only for the snapshot in which the life decrement was observed
    pub life_lost: bool,
}

/// Outcome of distilling one snapshot
pub struct DistillOutcome {
    pub state: AgentState,
    /// The tracked position moved since the last snapshot; counts as an
    /// out-of-band movement acknowledgment
    pub position_changed: bool,
}

/// Folds snapshots into [`AgentState`]; owned exclusively by the pilot loop
pub struct Distiller {
    map: Arc<Map>,
    pellets: HashSet<(i16, i16)>,
    power_pellets: HashSet<(i16, i16)>,
    frightened_timer: u8,
    world_ticks: u64,
    orientation: Dir,
    last_score: u32,
    life_count: u32,
    prev_pos: (i16, i16),
}

impl Distiller {
    pub fn new(map: Arc<Map>) -> Self {
        let pellets = map.pellet_cells().collect();
        let power_pellets = map.power_pellet_cells().collect();
        Self {
            map,
            pellets,
            power_pellets,
            frightened_timer: 0,
            world_ticks: 0,
            orientation: Dir::Up,
            last_score: 0,
            life_count: STARTING_LIVES,
            prev_pos: START_POS,
        }
    }

    /// Confirmed orientation, as of the last committed acknowledgment
    pub fn orientation(&self) -> Dir {
        self.orientation
    }

    /// Commit an orientation confirmed by the robot
    pub fn set_orientation(&mut self, dir: Dir) {
        if self.orientation != dir {
            debug!(orientation = ?dir, "Orientation confirmed");
        }
        self.orientation = dir;
    }

    /// One fixed-rate world tick; decays the frightened timer every
    /// [`FRIGHT_DECAY_DIVISOR`] ticks while it is positive
    pub fn world_tick(&mut self) {
        self.world_ticks += 1;
        if self.world_ticks % FRIGHT_DECAY_DIVISOR == 0 && self.frightened_timer > 0 {
            self.frightened_timer -= 1;
        }
    }

    /// Fold one snapshot into the local model
    pub fn on_snapshot(&mut self, snap: &GameSnapshot) -> DistillOutcome {
        // New game: the engine reports score 0 only before the first pellet.
        if snap.score == 0 {
            self.pellets = self.map.pellet_cells().collect();
            self.power_pellets = self.map.power_pellet_cells().collect();
        }

        let pac = (snap.pacman.x, snap.pacman.y);

        // Low stakes, so no validation that the pellet was actually eaten;
        // discarding an absent cell is a no-op.
        self.pellets.remove(&pac);

        // A power pellet only counts when the score moved by exactly its
        // value, which guards against simultaneous multi-pellet scoring.
        if self.power_pellets.contains(&pac) && snap.score == self.last_score + POWER_PELLET_VALUE {
            self.power_pellets.remove(&pac);
            self.frightened_timer = GHOST_FRIGHT_TICKS;
            info!(cell = ?pac, "Power pellet consumed, ghosts frightened");
        }

        let mut life_lost = false;
        let mut effective_pac = pac;
        if snap.lives < self.life_count {
            self.life_count -= 1;
            self.frightened_timer = 0;
            life_lost = true;
            effective_pac = START_POS;
            info!(lives = self.life_count, "Life lost, reporting respawn cell");
        }

        self.last_score = snap.score;

        let position_changed = effective_pac != self.prev_pos;
        if position_changed {
            self.prev_pos = effective_pac;
        }

        DistillOutcome {
            state: AgentState {
                pellets: self.pellets.clone(),
                power_pellets: self.power_pellets.clone(),
                pac: effective_pac,
                ghosts: snap.ghosts(),
                score: snap.score,
                frightened_timer: self.frightened_timer,
                orientation: self.orientation,
                mode: snap.mode,
                life_lost,
            },
            position_changed,
        }
    }
}
