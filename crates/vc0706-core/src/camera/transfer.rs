//! Frame buffer transfer
//!
//! Pulls a captured JPEG out of the camera's frame buffer:
//!
//! ```text
//! Idle -> AwaitingCapture -> LengthKnown -> Transferring -> Done
//! ```
//!
//! Any error ends the transfer and discards the partial
//! image. Only chunk integrity failures are retried, from a single budget
//! shared by the whole transfer; the same cursor is requested again until it
//! reads cleanly or the budget runs out.

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, info, warn};

use super::config::{CameraConfig, Timings};
use crate::protocol::{
    verify_chunk_frame, Command, CommunicationChannel, FrameControl, Opcode, PayloadBuilder,
    ProtocolError, Transaction, TransferMode, REPLY_HEADER_LEN,
};

/// Delay field of the read-buffer command, in units of 0.01ms
const READ_DELAY: u16 = 0x0100;

/// Frame buffer selector: the frame that was just frozen
const FBUF_CURRENT_FRAME: u8 = 0x00;

/// Reply length of a buffer length query: header + 4-byte length
const BUFFER_LEN_REPLY: usize = REPLY_HEADER_LEN + 4;

/// Bookkeeping for one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSession {
    /// Bytes held in the frame buffer
    pub total_length: u32,
    /// Offset of the next chunk to request
    pub cursor: u32,
    /// Failed chunk reads still tolerated
    pub retries_remaining: u8,
}

impl TransferSession {
    pub fn new(total_length: u32, max_attempts: u8) -> Self {
        Self {
            total_length,
            cursor: 0,
            retries_remaining: max_attempts,
        }
    }

    /// Length of the next chunk: `min(chunk_size, total_length - cursor)`
    pub fn next_chunk_len(&self, chunk_size: u32) -> u32 {
        chunk_size.min(self.total_length.saturating_sub(self.cursor))
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.total_length
    }
}

/// Transfer progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    /// Frame frozen, length not yet known
    AwaitingCapture,
    /// Buffer length read from the camera
    LengthKnown(u32),
    Transferring(TransferSession),
    Done,
}

/// Freeze the current frame
pub fn capture_command() -> Command {
    PayloadBuilder::new()
        .byte(FrameControl::StopCurrentFrame.as_byte())
        .build(Opcode::FbufCtrl)
}

/// Query the length of the current frame buffer
pub fn buffer_len_command() -> Command {
    PayloadBuilder::new()
        .byte(FBUF_CURRENT_FRAME)
        .build(Opcode::GetFbufLen)
}

/// Request `length` bytes of the current frame starting at `offset`
pub fn read_chunk_command(offset: u32, length: u32) -> Command {
    PayloadBuilder::new()
        .byte(FBUF_CURRENT_FRAME)
        .byte(TransferMode::Mcu.as_byte())
        .u32_be(offset)
        .u32_be(length)
        .u16_be(READ_DELAY)
        .build(Opcode::ReadFbuf)
}

/// Decode the big-endian length carried by a buffer length reply
pub fn parse_buffer_length(payload: &[u8]) -> Result<u32, ProtocolError> {
    if payload.len() != 4 {
        return Err(ProtocolError::InvalidBufferLength(payload.len()));
    }
    Ok(BigEndian::read_u32(payload))
}

/// Query the frame buffer length
pub fn get_buffer_len<C>(channel: &mut C, timings: &Timings) -> Result<u32, ProtocolError>
where
    C: CommunicationChannel + ?Sized,
{
    let reply = Transaction::new(
        buffer_len_command(),
        BUFFER_LEN_REPLY,
        Timings::ms(timings.buffer_len_ms),
    )
    .run(channel)?;
    parse_buffer_length(&reply.payload)
}

/// Capture a photo and transfer it out of the frame buffer
pub fn take_photo<C>(channel: &mut C, config: &CameraConfig) -> Result<Vec<u8>, ProtocolError>
where
    C: CommunicationChannel + ?Sized,
{
    BufferTransfer::new(channel, config).run()
}

/// Drives one capture-and-transfer run
pub struct BufferTransfer<'a, C: ?Sized> {
    channel: &'a mut C,
    config: &'a CameraConfig,
    image: Vec<u8>,
}

impl<'a, C> BufferTransfer<'a, C>
where
    C: CommunicationChannel + ?Sized,
{
    pub fn new(channel: &'a mut C, config: &'a CameraConfig) -> Self {
        Self {
            channel,
            config,
            image: Vec::new(),
        }
    }

    /// Run the state machine to completion
    pub fn run(mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut state = TransferState::Idle;
        loop {
            if state == TransferState::Done {
                info!("transfer complete: {} bytes", self.image.len());
                return Ok(self.image);
            }
            state = match self.step(state) {
                Ok(next) => next,
                Err(e) => {
                    warn!(?state, "transfer failed: {}", e);
                    return Err(e);
                }
            };
        }
    }

    fn step(&mut self, state: TransferState) -> Result<TransferState, ProtocolError> {
        let next = match state {
            TransferState::Idle => {
                Transaction::new(
                    capture_command(),
                    REPLY_HEADER_LEN,
                    Timings::ms(self.config.timings.capture_ms),
                )
                .run(self.channel)?;
                TransferState::AwaitingCapture
            }
            TransferState::AwaitingCapture => {
                let length = get_buffer_len(self.channel, &self.config.timings)?;
                info!("frame buffer holds {} bytes", length);
                TransferState::LengthKnown(length)
            }
            TransferState::LengthKnown(total) => {
                // Corrupt lengths can be huge; let the buffer grow on demand past 1 MiB
                self.image = Vec::with_capacity(total.min(1 << 20) as usize);
                TransferState::Transferring(TransferSession::new(
                    total,
                    self.config.max_chunk_attempts,
                ))
            }
            TransferState::Transferring(mut session) => {
                if session.is_complete() {
                    TransferState::Done
                } else {
                    self.read_chunk(&mut session)?;
                    TransferState::Transferring(session)
                }
            }
            TransferState::Done => TransferState::Done,
        };
        Ok(next)
    }

    /// Request the chunk at the session cursor. Advances the cursor on a
    /// clean read; leaves it in place and spends a retry otherwise.
    fn read_chunk(&mut self, session: &mut TransferSession) -> Result<(), ProtocolError> {
        let length = session.next_chunk_len(self.config.chunk_size.max(1));
        let data_len = length as usize;
        let frame = Transaction::new(
            read_chunk_command(session.cursor, length),
            REPLY_HEADER_LEN + data_len + REPLY_HEADER_LEN,
            Timings::ms(self.config.timings.read_chunk_ms),
        )
        .exchange(self.channel)?;

        match verify_chunk_frame(&frame, data_len) {
            Ok(data) => {
                self.image.extend_from_slice(data);
                session.cursor += length;
                debug!(
                    "chunk ok: {}/{} bytes",
                    session.cursor, session.total_length
                );
                Ok(())
            }
            Err(fault) => {
                let error = ProtocolError::FrameIntegrityError {
                    offset: session.cursor,
                    fault,
                };
                session.retries_remaining = session.retries_remaining.saturating_sub(1);
                if session.retries_remaining == 0 {
                    return Err(ProtocolError::TooManyRetries {
                        attempts: self.config.max_chunk_attempts,
                        offset: session.cursor,
                    });
                }
                warn!(
                    "{}, retrying ({} retries left)",
                    error, session.retries_remaining
                );
                Ok(())
            }
        }
    }
}
