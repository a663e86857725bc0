//! Fixed-length command and acknowledgment frames
//!
//! Command frame (host -> robot), 8 bytes:
//! `[ BOF | seq:4 big-endian | mode:1 | action:1 | EOF ]`
//!
//! Action byte:
//! `[ FB | D4 D3 D2 D1 D0 | C1 C0 ]` — bit 7 forward (0) / backward (1),
//! bits 6-2 distance 0-31, bits 1-0 compass code N=00 S=01 E=10 W=11.
//!
//! Ack frame (robot -> host), 7 bytes:
//! `[ BOF | seq:4 big-endian | reserved:1 | EOF ]`

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::map::Dir;

/// Begin-of-frame sentinel (ASCII `|`)
pub const BOF: u8 = 0x7C;
/// End-of-frame sentinel (ASCII `\n`)
pub const EOF: u8 = 0x0A;
/// Command frame length on the wire
pub const CMD_LEN: usize = 8;
/// Ack frame length on the wire
pub const FRAME_LEN: usize = 7;
/// Largest distance hint representable in the action byte
pub const MAX_DISTANCE: u8 = 31;

/// Game mode carried in every command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Running,
    Paused,
}

impl Mode {
    fn to_byte(self) -> u8 {
        match self {
            Mode::Running => 0,
            Mode::Paused => 1,
        }
    }

    fn from_byte(b: u8) -> Result<Self, FrameError> {
        match b {
            0 => Ok(Mode::Running),
            1 => Ok(Mode::Paused),
            other => Err(FrameError::BadMode(other)),
        }
    }
}

/// Abstract action chosen by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move in a grid direction
    Move(Dir),
    /// Hold position
    Stay,
}

/// Compass code for the robot's firmware; grid up faces west on the field
fn compass_code(dir: Dir) -> u8 {
    match dir {
        Dir::Right => 0b00, // north
        Dir::Left => 0b01,  // south
        Dir::Down => 0b10,  // east
        Dir::Up => 0b11,    // west
    }
}

fn dir_from_compass(code: u8) -> Dir {
    match code & 0b11 {
        0b00 => Dir::Right,
        0b01 => Dir::Left,
        0b10 => Dir::Down,
        _ => Dir::Up,
    }
}

/// Result of encoding one command
#[derive(Debug, Clone)]
pub struct EncodedCommand {
    /// The bytes to put on the wire
    pub bytes: Bytes,
    /// Orientation to commit once the robot acknowledges; None for Stay
    pub pending_orientation: Option<Dir>,
}

/// Encode a command frame.
///
/// If the requested direction is the exact inverse of the confirmed
/// `orientation`, the backward variant is emitted instead of two 90-degree
/// turns, and the orientation to confirm stays unchanged. Distance is
/// clamped to [`MAX_DISTANCE`] and forced to 0 while paused or staying.
pub fn encode_command(
    action: Action,
    distance: u8,
    seq: u32,
    mode: Mode,
    orientation: Dir,
) -> EncodedCommand {
    let distance = if mode == Mode::Paused {
        0
    } else {
        distance.min(MAX_DISTANCE)
    };

    let (backward, heading, distance, pending) = match action {
        Action::Stay => (false, orientation, 0, None),
        Action::Move(dir) if dir == orientation.inverse() => {
            (true, orientation, distance, Some(orientation))
        }
        Action::Move(dir) => (false, dir, distance, Some(dir)),
    };

    let action_byte = ((backward as u8) << 7) | (distance << 2) | compass_code(heading);

    let mut buf = BytesMut::with_capacity(CMD_LEN);
    buf.put_u8(BOF);
    buf.put_u32(seq);
    buf.put_u8(mode.to_byte());
    buf.put_u8(action_byte);
    buf.put_u8(EOF);

    EncodedCommand {
        bytes: buf.freeze(),
        pending_orientation: pending,
    }
}

/// A validated acknowledgment frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckFrame {
    pub seq: u32,
}

/// A decoded command frame (loopback tooling and tests)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedCommand {
    pub seq: u32,
    pub mode: Mode,
    pub backward: bool,
    pub distance: u8,
    pub heading: Dir,
}

/// Framing failures on the serial link
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame length {got}, expected {want}")]
    Length { got: usize, want: usize },

    #[error("begin-of-frame byte {0:#04x}, expected {BOF:#04x}")]
    BadBof(u8),

    #[error("end-of-frame byte {0:#04x}, expected {EOF:#04x}")]
    BadEof(u8),

    #[error("unknown mode byte {0:#04x}")]
    BadMode(u8),
}

fn check_sentinels(buf: &[u8], want: usize) -> Result<(), FrameError> {
    if buf.len() != want {
        return Err(FrameError::Length {
            got: buf.len(),
            want,
        });
    }
    if buf[0] != BOF {
        return Err(FrameError::BadBof(buf[0]));
    }
    if buf[want - 1] != EOF {
        return Err(FrameError::BadEof(buf[want - 1]));
    }
    Ok(())
}

/// Validate and decode an acknowledgment frame. The reserved byte is
/// ignored.
pub fn decode_ack(buf: &[u8]) -> Result<AckFrame, FrameError> {
    check_sentinels(buf, FRAME_LEN)?;
    let seq = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
    Ok(AckFrame { seq })
}

/// Decode a command frame back into its fields
pub fn decode_command(buf: &[u8]) -> Result<DecodedCommand, FrameError> {
    check_sentinels(buf, CMD_LEN)?;
    let seq = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
    let mode = Mode::from_byte(buf[5])?;
    let action = buf[6];
    Ok(DecodedCommand {
        seq,
        mode,
        backward: action & 0x80 != 0,
        distance: (action >> 2) & 0x1F,
        heading: dir_from_compass(action & 0b11),
    })
}
