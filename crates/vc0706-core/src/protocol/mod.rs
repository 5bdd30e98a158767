//! Serial Protocol Communication
//!
//! Implements the VC0706 binary command/reply protocol.
//!
//! Every exchange is a single command frame followed, after a fixed settle
//! delay, by a single reply frame:
//!
//! ```text
//! command: 0x56 | serial | opcode | len | payload[len]
//! reply:   0x76 | serial | opcode | status | len | payload[len]
//! ```

pub mod commands;
mod error;
pub mod frame;
pub mod serial;
pub mod stream;
pub mod transaction;

pub use commands::{
    ColorControlMode, ColorShowMode, DeviceType, FrameControl, Opcode, PhotoSize, ReplyStatus,
    TransferMode,
};
pub use error::{ChunkFault, ProtocolError};
pub use frame::{
    decode_and_check_reply, encode_command, encode_reply, encode_simple_command,
    encode_simple_reply, verify_chunk_frame, Command, PayloadBuilder, Reply,
};
pub use serial::{configure_port, list_ports, open_port, PortInfo};
pub use stream::{CommunicationChannel, SerialChannel, TcpChannel};
pub use transaction::Transaction;

/// Sync byte that starts every host-to-camera command frame
pub const CMD_SEND: u8 = 0x56;

/// Sync byte that starts every camera-to-host reply frame
pub const CMD_REPLY: u8 = 0x76;

/// Serial number used to pair commands with replies (fixed; multi-session
/// correlation is unused)
pub const SERIAL_NUMBER: u8 = 0x00;

/// Length of a command header (sync, serial, opcode, length)
pub const COMMAND_HEADER_LEN: usize = 4;

/// Length of a reply header (sync, serial, opcode, status, length)
pub const REPLY_HEADER_LEN: usize = 5;

/// Maximum payload length representable in the one-byte length field
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Default serial port on a Raspberry Pi header
pub const DEFAULT_PORT: &str = "/dev/ttyAMA0";

/// Default baud rate of the camera after power-up
pub const DEFAULT_BAUD_RATE: u32 = 38400;

/// Default number of image bytes requested per read-buffer transaction
pub const DEFAULT_CHUNK_SIZE: u32 = 256;

/// Default number of failed chunk reads tolerated during one transfer
pub const DEFAULT_MAX_CHUNK_ATTEMPTS: u8 = 5;
