//! Serial command/acknowledgment protocol

pub mod frame;
pub mod sequence;

pub use frame::{
    decode_ack, decode_command, encode_command, AckFrame, Action, DecodedCommand, EncodedCommand,
    FrameError, Mode, CMD_LEN, EOF, FRAME_LEN,
};
pub use sequence::SequenceCounter;
