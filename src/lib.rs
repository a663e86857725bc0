//! Pacbot Pilot - decision-to-robot bridge
//!
//! Distills the game engine's snapshot feed into a local decision model,
//! drives the physical robot over a half-duplex serial link with a
//! sequence-correlated binary command protocol, and reports the
//! dead-reckoned pose back as telemetry.

pub mod agent;
pub mod config;
pub mod feed;
pub mod link;
pub mod map;
pub mod motion;
pub mod pilot;
pub mod policy;
pub mod protocol;
