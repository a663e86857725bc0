//! Decision policy seam
//!
//! The real competition policy lives outside this repo; the pilot only
//! needs `get_action`. The built-in greedy policy keeps the binary
//! runnable on its own: breadth-first search to the nearest pellet,
//! steering clear of unfrightened ghosts.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::agent::AgentState;
use crate::map::{Dir, Map};
use crate::protocol::Action;

/// Chooses one abstract action per decision tick
pub trait Policy: Send {
    /// Returns the action and a distance hint in cells
    fn get_action(&mut self, state: &AgentState) -> (Action, u8);
}

/// Cells this close to an unfrightened ghost are avoided
const GHOST_RADIUS: i16 = 2;

/// Nearest-pellet chase with ghost avoidance
pub struct GreedyPolicy {
    map: Arc<Map>,
}

impl GreedyPolicy {
    pub fn new(map: Arc<Map>) -> Self {
        Self { map }
    }

    fn dangerous(&self, state: &AgentState, cell: (i16, i16)) -> bool {
        if state.frightened_timer > 0 {
            return false;
        }
        state.ghosts.iter().any(|g| {
            (g.x - cell.0).abs() + (g.y - cell.1).abs() <= GHOST_RADIUS
        })
    }

    /// First step of the shortest safe path to any pellet, plus how many
    /// cells that path continues straight.
    fn chase_pellet(&self, state: &AgentState) -> Option<(Dir, u8)> {
        let dirs = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];
        let mut came_from: HashMap<(i16, i16), ((i16, i16), Dir)> = HashMap::new();
        let mut queue = VecDeque::from([state.pac]);

        let mut goal = None;
        while let Some(cell) = queue.pop_front() {
            if state.pellets.contains(&cell) || state.power_pellets.contains(&cell) {
                goal = Some(cell);
                break;
            }
            for dir in dirs {
                let (dx, dy) = dir.offset();
                let next = (cell.0 + dx, cell.1 + dy);
                if !self.map.is_passable(next.0, next.1)
                    || self.dangerous(state, next)
                    || next == state.pac
                    || came_from.contains_key(&next)
                {
                    continue;
                }
                came_from.insert(next, (cell, dir));
                queue.push_back(next);
            }
        }

        let goal = goal?;

        // Walk back to the first step, counting the straight run.
        let mut cell = goal;
        let mut path = Vec::new();
        while cell != state.pac {
            let &(prev, dir) = came_from.get(&cell)?;
            path.push(dir);
            cell = prev;
        }
        let first = *path.last()?;
        let straight = path.iter().rev().take_while(|&&d| d == first).count();
        Some((first, straight.min(u8::MAX as usize) as u8))
    }
}

impl Policy for GreedyPolicy {
    fn get_action(&mut self, state: &AgentState) -> (Action, u8) {
        match self.chase_pellet(state) {
            Some((dir, distance)) => (Action::Move(dir), distance),
            None => (Action::Stay, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Distiller;
    use crate::feed::protocol::{GameSnapshot, Ghost, GhostState, GridPos};
    use crate::protocol::Mode;

    fn state_at(pac: (i16, i16)) -> AgentState {
        let ghost = Ghost {
            x: 13,
            y: 16,
            state: GhostState::Scatter,
        };
        let snap = GameSnapshot {
            score: 1,
            lives: 3,
            mode: Mode::Running,
            pacman: GridPos { x: pac.0, y: pac.1 },
            red_ghost: ghost,
            pink_ghost: ghost,
            orange_ghost: ghost,
            blue_ghost: ghost,
        };
        Distiller::new(Arc::new(Map::new())).on_snapshot(&snap).state
    }

    #[test]
    fn heads_for_an_adjacent_pellet() {
        let mut policy = GreedyPolicy::new(Arc::new(Map::new()));
        // Both horizontal neighbors of (11, 7) hold pellets; search order
        // reaches the left one first.
        let (action, distance) = policy.get_action(&state_at((11, 7)));
        assert_eq!(action, Action::Move(Dir::Left));
        assert!(distance >= 1);
    }

    #[test]
    fn stays_when_no_pellet_is_reachable() {
        let mut state = state_at((14, 7));
        state.pellets.clear();
        state.power_pellets.clear();
        let mut policy = GreedyPolicy::new(Arc::new(Map::new()));
        let (action, distance) = policy.get_action(&state);
        assert_eq!(action, Action::Stay);
        assert_eq!(distance, 0);
    }
}
