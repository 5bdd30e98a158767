//! Simulated VC0706 camera for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use std::time::Duration;

use byteorder::{BigEndian, ByteOrder};
use vc0706_core::camera::{CameraConfig, Timings};
use vc0706_core::protocol::{
    encode_reply, encode_simple_reply, CommunicationChannel, ReplyStatus, CMD_SEND,
};

/// Damage applied to one read-buffer reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    Header,
    Trailer,
    Truncate,
}

/// Camera simulator answering commands the way the real module does
pub struct FakeCamera {
    pub image: Vec<u8>,
    pub version: String,
    /// Every complete command frame received
    pub commands: Vec<Vec<u8>>,
    /// Corruption applied to the next read-buffer replies, in order
    /// (`None` leaves that reply intact)
    pub corruptions: VecDeque<Option<Corruption>>,
    /// Corrupt every read-buffer reply
    pub corrupt_all_chunks: bool,
    /// Status returned for frame buffer control
    pub capture_status: ReplyStatus,
    /// Answer resets with garbage instead of a reply
    pub garbled_reset: bool,
    /// Start failing reads once this opcode is received
    pub unplug_on: Option<u8>,
    pub frozen: bool,
    pub registers: HashMap<(u8, u16), u8>,
    pub color: Option<(u8, u8)>,
    input: Vec<u8>,
    pending: VecDeque<u8>,
    unplugged: bool,
}

impl FakeCamera {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            version: "VC0703 1.00".to_string(),
            commands: Vec::new(),
            corruptions: VecDeque::new(),
            corrupt_all_chunks: false,
            capture_status: ReplyStatus::Success,
            garbled_reset: false,
            unplug_on: None,
            frozen: false,
            registers: HashMap::new(),
            color: None,
            input: Vec::new(),
            pending: VecDeque::new(),
            unplugged: false,
        }
    }

    /// Commands received with the given opcode
    pub fn commands_for(&self, opcode: u8) -> Vec<&Vec<u8>> {
        self.commands.iter().filter(|c| c[2] == opcode).collect()
    }

    /// `(offset, length)` of every read-buffer request, in order
    pub fn chunk_requests(&self) -> Vec<(u32, u32)> {
        self.commands_for(0x32)
            .into_iter()
            .map(|c| {
                (
                    BigEndian::read_u32(&c[6..10]),
                    BigEndian::read_u32(&c[10..14]),
                )
            })
            .collect()
    }

    fn handle(&mut self, frame: Vec<u8>) {
        let opcode = frame[2];
        let payload = frame[4..].to_vec();
        self.commands.push(frame);

        if self.unplug_on == Some(opcode) {
            self.unplugged = true;
        }

        let reply = match opcode {
            0x11 => encode_reply(opcode, ReplyStatus::Success, self.version.as_bytes()),
            0x26 => {
                if self.garbled_reset {
                    b"\r\n\x00VC0703 1.00\r\nCtrl infr exist\r\n".to_vec()
                } else {
                    let mut reply = encode_simple_reply(opcode);
                    reply.extend_from_slice(b"\r\nVC0703 1.00\r\nCtrl infr exist\r\n");
                    reply
                }
            }
            0x31 => {
                let register = BigEndian::read_u16(&payload[2..4]);
                self.registers.insert((payload[0], register), payload[4]);
                encode_simple_reply(opcode)
            }
            0x3C => {
                self.color = Some((payload[0], payload[1]));
                encode_simple_reply(opcode)
            }
            0x36 => {
                if self.capture_status == ReplyStatus::Success {
                    self.frozen = payload[0] != 0x02;
                }
                encode_reply(opcode, self.capture_status, &[])
            }
            0x34 => {
                let mut len = [0u8; 4];
                BigEndian::write_u32(&mut len, self.image.len() as u32);
                encode_reply(opcode, ReplyStatus::Success, &len)
            }
            0x32 => self.chunk_reply(&payload),
            _ => encode_reply(opcode, ReplyStatus::NotReceived, &[]),
        };
        self.pending.extend(reply);
    }

    fn chunk_reply(&mut self, payload: &[u8]) -> Vec<u8> {
        let offset = BigEndian::read_u32(&payload[2..6]) as usize;
        let length = BigEndian::read_u32(&payload[6..10]) as usize;
        let start = offset.min(self.image.len());
        let end = (offset + length).min(self.image.len());

        let marker = encode_simple_reply(0x32);
        let mut reply = marker.clone();
        reply.extend_from_slice(&self.image[start..end]);
        reply.extend_from_slice(&marker);

        let corruption = if self.corrupt_all_chunks {
            Some(Corruption::Header)
        } else {
            self.corruptions.pop_front().flatten()
        };
        match corruption {
            Some(Corruption::Header) => reply[0] = 0x00,
            Some(Corruption::Trailer) => {
                let last = reply.len() - 1;
                reply[last] = 0xFF;
            }
            Some(Corruption::Truncate) => reply.truncate(reply.len() / 2),
            None => {}
        }
        reply
    }
}

impl Read for FakeCamera {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.unplugged {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "camera unplugged"));
        }
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for FakeCamera {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.input.extend_from_slice(buf);
        while self.input.len() >= 4 {
            assert_eq!(self.input[0], CMD_SEND, "command sync byte");
            let total = 4 + self.input[3] as usize;
            if self.input.len() < total {
                break;
            }
            let frame: Vec<u8> = self.input.drain(..total).collect();
            self.handle(frame);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CommunicationChannel for FakeCamera {
    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }
}

/// Configuration with no settle delays
pub fn fast_config() -> CameraConfig {
    CameraConfig {
        timings: Timings::none(),
        ..CameraConfig::default()
    }
}

/// Deterministic fake JPEG of `len` bytes
pub fn test_image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 256) as u8).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
