//! Half-duplex serial link to the robot
//!
//! One command out, one ack back, with a bounded per-read timeout. A
//! malformed ack gets a single resynchronization re-read before the cycle
//! is reported failed.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::{info, warn};

use crate::protocol::{decode_ack, AckFrame, FrameError, EOF, FRAME_LEN};

/// Longest byte run scanned for a terminator before giving up on a frame
const MAX_FRAME_SCAN: usize = 64;

/// Serial transport failures
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("serial i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port unavailable: {0}")]
    Port(#[from] serialport::Error),

    #[error("malformed ack: {0}")]
    Framing(#[from] FrameError),

    #[error("no frame terminator within {MAX_FRAME_SCAN} bytes")]
    Desynchronized,
}

/// The robot end of the command protocol
pub trait RobotLink: Send {
    /// Write one command frame
    fn send(&mut self, frame: &[u8]) -> Result<(), LinkError>;
    /// Read and validate one ack frame, resynchronizing once on garbage
    fn recv_ack(&mut self) -> Result<AckFrame, LinkError>;
}

/// Read one terminator-delimited frame, then decode; on a framing error,
/// re-read once before failing the cycle.
pub fn recv_ack_with_resync<R>(mut read_frame: R) -> Result<AckFrame, LinkError>
where
    R: FnMut() -> Result<Vec<u8>, LinkError>,
{
    let first = read_frame()?;
    match decode_ack(&first) {
        Ok(ack) => Ok(ack),
        Err(e) => {
            warn!(error = %e, "Malformed ack, resynchronizing");
            let second = read_frame()?;
            Ok(decode_ack(&second)?)
        }
    }
}

/// Bluetooth (HC-05) serial link
pub struct SerialRobotLink {
    port: Box<dyn SerialPort>,
}

impl SerialRobotLink {
    /// Open the device with a bounded read timeout
    pub fn open(device: &str, baud: u32, timeout: Duration) -> Result<Self, LinkError> {
        let port = serialport::new(device, baud).timeout(timeout).open()?;
        info!(device = %device, baud = baud, "Serial link open");
        Ok(Self { port })
    }

    /// Read bytes until the frame terminator or timeout
    fn read_frame(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut frame = Vec::with_capacity(FRAME_LEN);
        let mut byte = [0u8; 1];
        loop {
            self.port.read_exact(&mut byte)?;
            frame.push(byte[0]);
            if byte[0] == EOF {
                return Ok(frame);
            }
            if frame.len() >= MAX_FRAME_SCAN {
                return Err(LinkError::Desynchronized);
            }
        }
    }
}

impl RobotLink for SerialRobotLink {
    fn send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }

    fn recv_ack(&mut self) -> Result<AckFrame, LinkError> {
        let ack = recv_ack_with_resync(|| {
            let frame = self.read_frame();
            // Half-duplex: anything still buffered belongs to a past cycle.
            let _ = self.port.clear(ClearBuffer::Input);
            frame
        });
        ack
    }
}
