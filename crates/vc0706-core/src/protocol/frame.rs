//! Frame encoding/decoding
//!
//! Implements the command and reply frames of the VC0706 protocol.
//!
//! Frame format:
//! - Command: `0x56, serial, opcode, len, payload[len]`
//! - Reply: `0x76, serial, opcode, status, len, payload[len]`
//!
//! Frame buffer reads are the one exception: the image bytes are wrapped
//! between two empty success replies instead of being length-prefixed.

use byteorder::{BigEndian, ByteOrder};

use super::{
    ChunkFault, Opcode, ProtocolError, ReplyStatus, CMD_REPLY, CMD_SEND, COMMAND_HEADER_LEN,
    MAX_PAYLOAD_LEN, REPLY_HEADER_LEN, SERIAL_NUMBER,
};

/// A host-to-camera command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Operation requested
    pub opcode: Opcode,
    /// Command arguments
    pub payload: Vec<u8>,
}

impl Command {
    /// Create a command with the given payload
    pub fn new(opcode: Opcode, payload: Vec<u8>) -> Self {
        Self { opcode, payload }
    }

    /// Create a command with an empty payload
    pub fn simple(opcode: Opcode) -> Self {
        Self::new(opcode, Vec::new())
    }

    /// Encode the command to raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_command(self.opcode.as_byte(), &self.payload)
    }
}

/// A validated camera-to-host reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Opcode the camera is answering
    pub opcode: u8,
    /// Execution status reported by the camera
    pub status: ReplyStatus,
    /// Reply data
    pub payload: Vec<u8>,
}

/// Encode a command frame.
///
/// # Panics
///
/// Panics if `payload` is longer than 255 bytes; the length field is a
/// single byte.
pub fn encode_command(opcode: u8, payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= MAX_PAYLOAD_LEN,
        "command payload of {} bytes does not fit the length byte",
        payload.len()
    );
    let mut bytes = Vec::with_capacity(COMMAND_HEADER_LEN + payload.len());
    bytes.extend_from_slice(&[CMD_SEND, SERIAL_NUMBER, opcode, payload.len() as u8]);
    bytes.extend_from_slice(payload);
    bytes
}

/// Encode a command frame with an empty payload
pub fn encode_simple_command(opcode: u8) -> Vec<u8> {
    encode_command(opcode, &[])
}

/// Encode a reply frame, as the camera would send it.
///
/// # Panics
///
/// Panics if `payload` is longer than 255 bytes.
pub fn encode_reply(opcode: u8, status: ReplyStatus, payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= MAX_PAYLOAD_LEN,
        "reply payload of {} bytes does not fit the length byte",
        payload.len()
    );
    let mut bytes = Vec::with_capacity(REPLY_HEADER_LEN + payload.len());
    bytes.extend_from_slice(&[
        CMD_REPLY,
        SERIAL_NUMBER,
        opcode,
        status.into(),
        payload.len() as u8,
    ]);
    bytes.extend_from_slice(payload);
    bytes
}

/// Encode an empty success reply
pub fn encode_simple_reply(opcode: u8) -> Vec<u8> {
    encode_reply(opcode, ReplyStatus::Success, &[])
}

/// Decode a reply and check that it answers `expected_opcode` successfully.
///
/// Fields are checked in wire order (sync, serial number, opcode, status), so
/// a reply with several bad fields reports the first one.
pub fn decode_and_check_reply(expected_opcode: u8, bytes: &[u8]) -> Result<Reply, ProtocolError> {
    let short = || ProtocolError::ShortReply {
        expected: REPLY_HEADER_LEN,
        actual: bytes.len(),
    };

    let sync = *bytes.first().ok_or_else(short)?;
    if sync != CMD_REPLY {
        return Err(ProtocolError::WrongSync(sync));
    }

    let serial = *bytes.get(1).ok_or_else(short)?;
    if serial != SERIAL_NUMBER {
        return Err(ProtocolError::WrongSerialNumber(serial));
    }

    let opcode = *bytes.get(2).ok_or_else(short)?;
    if opcode != expected_opcode {
        return Err(ProtocolError::UnexpectedOpcode {
            expected: expected_opcode,
            got: opcode,
        });
    }

    let status = ReplyStatus::from(*bytes.get(3).ok_or_else(short)?);
    if status != ReplyStatus::Success {
        return Err(ProtocolError::DeviceStatus { opcode, status });
    }

    let length = *bytes.get(4).ok_or_else(short)? as usize;
    let end = REPLY_HEADER_LEN + length;
    if bytes.len() < end {
        return Err(ProtocolError::ShortReply {
            expected: end,
            actual: bytes.len(),
        });
    }

    Ok(Reply {
        opcode,
        status,
        payload: bytes[REPLY_HEADER_LEN..end].to_vec(),
    })
}

/// Check a frame buffer chunk: `[success reply][data][success reply]`.
///
/// Returns the data bytes between the header and trailer.
pub fn verify_chunk_frame(frame: &[u8], data_len: usize) -> Result<&[u8], ChunkFault> {
    let expected = REPLY_HEADER_LEN + data_len + REPLY_HEADER_LEN;
    if frame.len() < expected {
        return Err(ChunkFault::Truncated {
            expected,
            actual: frame.len(),
        });
    }

    let marker = encode_simple_reply(Opcode::ReadFbuf.as_byte());
    let data_end = REPLY_HEADER_LEN + data_len;
    if frame[..REPLY_HEADER_LEN] != marker[..] {
        return Err(ChunkFault::BadHeader);
    }
    if frame[data_end..expected] != marker[..] {
        return Err(ChunkFault::BadTrailer);
    }

    Ok(&frame[REPLY_HEADER_LEN..data_end])
}

/// Builder for constructing command payloads
pub struct PayloadBuilder {
    payload: Vec<u8>,
}

impl PayloadBuilder {
    /// Create a new payload builder
    pub fn new() -> Self {
        Self {
            payload: Vec::new(),
        }
    }

    /// Add a single byte
    pub fn byte(mut self, b: u8) -> Self {
        self.payload.push(b);
        self
    }

    /// Add a 16-bit value (big-endian)
    pub fn u16_be(mut self, value: u16) -> Self {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.payload.extend_from_slice(&bytes);
        self
    }

    /// Add a 32-bit value (big-endian)
    pub fn u32_be(mut self, value: u32) -> Self {
        let mut bytes = [0u8; 4];
        BigEndian::write_u32(&mut bytes, value);
        self.payload.extend_from_slice(&bytes);
        self
    }

    /// Add raw bytes
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.payload.extend_from_slice(data);
        self
    }

    /// Build a command for `opcode` carrying the accumulated payload
    pub fn build(self, opcode: Opcode) -> Command {
        Command::new(opcode, self.payload)
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_command() {
        let bytes = encode_command(0x36, &[0x00]);
        assert_eq!(bytes, vec![0x56, 0x00, 0x36, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_simple_command() {
        assert_eq!(encode_simple_command(0x11), vec![0x56, 0x00, 0x11, 0x00]);
        assert_eq!(
            Command::simple(Opcode::SystemReset).to_bytes(),
            vec![0x56, 0x00, 0x26, 0x00]
        );
    }

    #[test]
    #[should_panic]
    fn test_encode_oversized_payload_panics() {
        encode_command(0x31, &[0u8; 256]);
    }

    #[test]
    fn test_reply_roundtrip() {
        let payloads: [&[u8]; 4] = [&[], &[0x01], &[0x00, 0x00, 0x01, 0x00], &[0xAB; 16]];
        for opcode in [0x11u8, 0x26, 0x31, 0x32, 0x34, 0x36, 0x3C] {
            for payload in payloads {
                let encoded = encode_reply(opcode, ReplyStatus::Success, payload);
                let reply = decode_and_check_reply(opcode, &encoded).expect("valid reply");
                assert_eq!(reply.payload, payload.to_vec());
                assert_eq!(reply.opcode, opcode);
            }
        }
    }

    #[test]
    fn test_decode_wrong_sync() {
        let mut bytes = encode_simple_reply(0x36);
        bytes[0] = 0x56;
        assert!(matches!(
            decode_and_check_reply(0x36, &bytes),
            Err(ProtocolError::WrongSync(0x56))
        ));
    }

    #[test]
    fn test_decode_wrong_serial() {
        let mut bytes = encode_simple_reply(0x36);
        bytes[1] = 0x07;
        assert!(matches!(
            decode_and_check_reply(0x36, &bytes),
            Err(ProtocolError::WrongSerialNumber(0x07))
        ));
    }

    #[test]
    fn test_decode_unexpected_opcode() {
        let bytes = encode_simple_reply(0x34);
        assert!(matches!(
            decode_and_check_reply(0x36, &bytes),
            Err(ProtocolError::UnexpectedOpcode {
                expected: 0x36,
                got: 0x34
            })
        ));
    }

    #[test]
    fn test_decode_device_status() {
        let bytes = encode_reply(0x36, ReplyStatus::DataFmtError, &[]);
        assert!(matches!(
            decode_and_check_reply(0x36, &bytes),
            Err(ProtocolError::DeviceStatus {
                opcode: 0x36,
                status: ReplyStatus::DataFmtError
            })
        ));
    }

    #[test]
    fn test_decode_every_bad_status() {
        for code in 1..=0xFFu8 {
            let bytes = encode_reply(0x31, ReplyStatus::from(code), &[]);
            match decode_and_check_reply(0x31, &bytes) {
                Err(ProtocolError::DeviceStatus { status, .. }) => {
                    assert_eq!(u8::from(status), code)
                }
                other => panic!("status {code:#04x} decoded as {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_short_reply() {
        assert!(matches!(
            decode_and_check_reply(0x11, &[]),
            Err(ProtocolError::ShortReply {
                expected: 5,
                actual: 0
            })
        ));
        assert!(matches!(
            decode_and_check_reply(0x11, &[0x76, 0x00, 0x11]),
            Err(ProtocolError::ShortReply { .. })
        ));

        // Header declares 4 payload bytes, only 2 arrived
        let mut bytes = encode_reply(0x34, ReplyStatus::Success, &[0, 0, 1, 0]);
        bytes.truncate(7);
        assert!(matches!(
            decode_and_check_reply(0x34, &bytes),
            Err(ProtocolError::ShortReply {
                expected: 9,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_decode_short_reply_still_checks_sync() {
        assert!(matches!(
            decode_and_check_reply(0x11, &[0xFF, 0x00]),
            Err(ProtocolError::WrongSync(0xFF))
        ));
    }

    #[test]
    fn test_verify_chunk_frame() {
        let marker = encode_simple_reply(0x32);
        let mut frame = marker.clone();
        frame.extend_from_slice(&[1, 2, 3]);
        frame.extend_from_slice(&marker);

        assert_eq!(verify_chunk_frame(&frame, 3), Ok(&[1u8, 2, 3][..]));

        let mut bad_header = frame.clone();
        bad_header[3] = 0x01;
        assert_eq!(verify_chunk_frame(&bad_header, 3), Err(ChunkFault::BadHeader));

        let mut bad_trailer = frame.clone();
        bad_trailer[10] = 0x00;
        assert_eq!(
            verify_chunk_frame(&bad_trailer, 3),
            Err(ChunkFault::BadTrailer)
        );

        assert_eq!(
            verify_chunk_frame(&frame[..12], 3),
            Err(ChunkFault::Truncated {
                expected: 13,
                actual: 12
            })
        );
    }

    #[test]
    fn test_payload_builder() {
        let command = PayloadBuilder::new()
            .byte(0x00)
            .byte(0x0A)
            .u32_be(256)
            .u32_be(44)
            .u16_be(0x0100)
            .build(Opcode::ReadFbuf);

        assert_eq!(command.payload.len(), 12);
        assert_eq!(
            command.to_bytes(),
            vec![
                0x56, 0x00, 0x32, 0x0C, // header
                0x00, 0x0A, // frame type, transfer mode
                0x00, 0x00, 0x01, 0x00, // offset 256
                0x00, 0x00, 0x00, 0x2C, // length 44
                0x01, 0x00, // delay
            ]
        );
    }
}
