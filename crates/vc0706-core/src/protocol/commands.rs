//! Protocol commands
//!
//! Defines the opcodes, status codes and register values used by the VC0706
//! protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opcodes understood by the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Query firmware version string
    GetVersion,

    /// Soft reset of the camera
    SystemReset,

    /// Write to a register space
    WriteData,

    /// Read a slice of the frame buffer
    ReadFbuf,

    /// Query the number of bytes held in the frame buffer
    GetFbufLen,

    /// Frame buffer control (freeze, resume, step)
    FbufCtrl,

    /// Color / black-and-white mode control
    ColorCtrl,
}

impl Opcode {
    /// Get the wire byte of this opcode
    pub fn as_byte(&self) -> u8 {
        match self {
            Opcode::GetVersion => 0x11,
            Opcode::SystemReset => 0x26,
            Opcode::WriteData => 0x31,
            Opcode::ReadFbuf => 0x32,
            Opcode::GetFbufLen => 0x34,
            Opcode::FbufCtrl => 0x36,
            Opcode::ColorCtrl => 0x3C,
        }
    }

    /// Look up an opcode by its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x11 => Some(Opcode::GetVersion),
            0x26 => Some(Opcode::SystemReset),
            0x31 => Some(Opcode::WriteData),
            0x32 => Some(Opcode::ReadFbuf),
            0x34 => Some(Opcode::GetFbufLen),
            0x36 => Some(Opcode::FbufCtrl),
            0x3C => Some(Opcode::ColorCtrl),
            _ => None,
        }
    }
}

/// Status byte carried in every reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyStatus {
    Success,
    NotReceived,
    DataLenError,
    DataFmtError,
    CmdNotExec,
    CmdExecError,
    /// Status byte outside the documented range
    Unknown(u8),
}

impl From<u8> for ReplyStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => ReplyStatus::Success,
            1 => ReplyStatus::NotReceived,
            2 => ReplyStatus::DataLenError,
            3 => ReplyStatus::DataFmtError,
            4 => ReplyStatus::CmdNotExec,
            5 => ReplyStatus::CmdExecError,
            _ => ReplyStatus::Unknown(code),
        }
    }
}

impl From<ReplyStatus> for u8 {
    fn from(status: ReplyStatus) -> Self {
        match status {
            ReplyStatus::Success => 0,
            ReplyStatus::NotReceived => 1,
            ReplyStatus::DataLenError => 2,
            ReplyStatus::DataFmtError => 3,
            ReplyStatus::CmdNotExec => 4,
            ReplyStatus::CmdExecError => 5,
            ReplyStatus::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyStatus::Success => write!(f, "success"),
            ReplyStatus::NotReceived => write!(f, "command not received"),
            ReplyStatus::DataLenError => write!(f, "data length error"),
            ReplyStatus::DataFmtError => write!(f, "data format error"),
            ReplyStatus::CmdNotExec => write!(f, "command cannot execute now"),
            ReplyStatus::CmdExecError => write!(f, "command received but failed"),
            ReplyStatus::Unknown(code) => write!(f, "unknown status (0x{:02X})", code),
        }
    }
}

/// JPEG resolution stored in the image size register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSize {
    /// 640x480
    Large,
    /// 320x240
    #[default]
    Medium,
    /// 160x120
    Small,
}

impl PhotoSize {
    /// Register value written for this size
    pub fn register_value(&self) -> u8 {
        match self {
            PhotoSize::Large => 0x00,
            PhotoSize::Medium => 0x11,
            PhotoSize::Small => 0x22,
        }
    }

    /// Parse a size code (`l`, `m`, `s` or the full name).
    ///
    /// Unrecognised codes fall back to `Medium` instead of failing.
    pub fn parse_lenient(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "l" | "large" => PhotoSize::Large,
            "s" | "small" => PhotoSize::Small,
            _ => PhotoSize::Medium,
        }
    }
}

/// Frame buffer control flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    StopCurrentFrame,
    StopNextFrame,
    ResumeFrame,
    StepFrame,
}

impl FrameControl {
    pub fn as_byte(&self) -> u8 {
        match self {
            FrameControl::StopCurrentFrame => 0x00,
            FrameControl::StopNextFrame => 0x01,
            FrameControl::ResumeFrame => 0x02,
            FrameControl::StepFrame => 0x03,
        }
    }
}

/// How the frame buffer is shipped out of the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Data follows the reply header on the UART
    Mcu,
    Dma,
}

impl TransferMode {
    pub fn as_byte(&self) -> u8 {
        match self {
            TransferMode::Mcu => 0x0A,
            TransferMode::Dma => 0x0F,
        }
    }
}

/// Who controls color mode switching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorControlMode {
    #[default]
    Gpio,
    Uart,
}

impl ColorControlMode {
    pub fn as_byte(&self) -> u8 {
        match self {
            ColorControlMode::Gpio => 0x00,
            ColorControlMode::Uart => 0x01,
        }
    }
}

/// Which color mode the sensor shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorShowMode {
    /// Switch automatically based on light level
    #[default]
    Auto,
    Color,
    BlackWhite,
}

impl ColorShowMode {
    pub fn as_byte(&self) -> u8 {
        match self {
            ColorShowMode::Auto => 0x00,
            ColorShowMode::Color => 0x01,
            ColorShowMode::BlackWhite => 0x02,
        }
    }
}

/// Register spaces addressable with `WriteData`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    ChipRegister,
    SensorRegister,
    Ccir656Register,
    I2cEeprom,
    SpiEeprom,
    SpiFlash,
}

impl DeviceType {
    pub fn as_byte(&self) -> u8 {
        match self {
            DeviceType::ChipRegister => 0x00,
            DeviceType::SensorRegister => 0x01,
            DeviceType::Ccir656Register => 0x02,
            DeviceType::I2cEeprom => 0x03,
            DeviceType::SpiEeprom => 0x04,
            DeviceType::SpiFlash => 0x05,
        }
    }
}
