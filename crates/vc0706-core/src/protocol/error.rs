//! Protocol errors

use std::fmt;

use thiserror::Error;

use super::ReplyStatus;

/// Errors that can occur during camera communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Channel error: {0}")]
    ChannelError(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Reply too short: expected at least {expected} bytes, got {actual}")]
    ShortReply { expected: usize, actual: usize },

    #[error("Not a reply frame: sync byte {0:#04x}")]
    WrongSync(u8),

    #[error("Unexpected serial number {0:#04x}")]
    WrongSerialNumber(u8),

    #[error("Expected reply to opcode {expected:#04x}, got {got:#04x}")]
    UnexpectedOpcode { expected: u8, got: u8 },

    #[error("Camera rejected opcode {opcode:#04x}: {status}")]
    DeviceStatus { opcode: u8, status: ReplyStatus },

    #[error("Invalid buffer length reply: expected 4 payload bytes, got {0}")]
    InvalidBufferLength(usize),

    #[error("Chunk at offset {offset} failed integrity check: {fault}")]
    FrameIntegrityError { offset: u32, fault: ChunkFault },

    #[error("Too many retries: {attempts} failed chunk reads, last at offset {offset}")]
    TooManyRetries { attempts: u8, offset: u32 },

    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),
}

/// Why a read-buffer chunk was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFault {
    /// Fewer bytes arrived than header + payload + trailer
    Truncated { expected: usize, actual: usize },
    /// Leading 5 bytes are not the read-buffer success reply
    BadHeader,
    /// Trailing 5 bytes are not the read-buffer success reply
    BadTrailer,
}

impl fmt::Display for ChunkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkFault::Truncated { expected, actual } => {
                write!(f, "truncated ({} of {} bytes)", actual, expected)
            }
            ChunkFault::BadHeader => write!(f, "bad header"),
            ChunkFault::BadTrailer => write!(f, "bad trailer"),
        }
    }
}

impl ProtocolError {
    /// Whether the error came from reply validation rather than the channel
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProtocolError::ShortReply { .. }
                | ProtocolError::WrongSync(_)
                | ProtocolError::WrongSerialNumber(_)
                | ProtocolError::UnexpectedOpcode { .. }
                | ProtocolError::DeviceStatus { .. }
                | ProtocolError::InvalidBufferLength(_)
        )
    }
}
