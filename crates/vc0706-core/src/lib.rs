//! # VC0706 Core Library
//!
//! Host-side driver for VC0706-based serial JPEG camera modules.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Command/reply frame encoding and validation for the VC0706 binary protocol
//! - Single-shot request/response transactions over any byte channel
//! - Camera configuration (photo size, compression, color mode, reset)
//! - Chunked, retry-tolerant transfer of captured JPEG images
//!
//! ## Example
//!
//! ```rust,ignore
//! use vc0706_core::{camera::{Camera, CameraConfig}, protocol::{open_port, SerialChannel}};
//!
//! let config = CameraConfig::default();
//! let port = open_port(&config.port_name, Some(config.baud_rate))?;
//! let mut camera = Camera::new(SerialChannel::new(port), config);
//!
//! camera.reset()?;
//! println!("Firmware: {}", camera.get_version()?);
//!
//! let jpeg = camera.take_photo()?;
//! std::fs::write("photo.jpg", &jpeg)?;
//! ```

pub mod camera;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::camera::{Camera, CameraConfig, SharedCamera, Timings};
    pub use crate::protocol::{
        CommunicationChannel, Opcode, PhotoSize, ProtocolError, ReplyStatus, SerialChannel,
        TcpChannel,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
