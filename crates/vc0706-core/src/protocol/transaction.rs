//! Request/response transactions
//!
//! One transaction is one command, one blind wait and one reply. The camera
//! has no ready signal, so the wait is a fixed sleep tuned per command rather
//! than a poll. Transactions never retry; retry policy belongs to callers.

use std::io::{self, Read, Write};
use std::time::Duration;

use tracing::{debug, trace};

use super::{decode_and_check_reply, CommunicationChannel, Command, ProtocolError, Reply};

/// A single command/reply exchange
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Command to send
    pub command: Command,
    /// Maximum number of reply bytes to read
    pub reply_len: usize,
    /// Wait between writing the command and reading the reply
    pub settle: Duration,
}

impl Transaction {
    pub fn new(command: Command, reply_len: usize, settle: Duration) -> Self {
        Self {
            command,
            reply_len,
            settle,
        }
    }

    /// Send the command, wait, and return whatever reply bytes arrived.
    ///
    /// The reply is not validated.
    pub fn exchange<C>(&self, channel: &mut C) -> Result<Vec<u8>, ProtocolError>
    where
        C: CommunicationChannel + ?Sized,
    {
        let bytes = self.command.to_bytes();

        if let Err(e) = channel.clear_input_buffer() {
            trace!("clear_input_buffer failed: {} (continuing)", e);
        }

        debug!(
            opcode = ?self.command.opcode,
            "sending {} bytes: {:02x?}",
            bytes.len(),
            bytes
        );
        channel.write_all(&bytes)?;
        channel.flush()?;

        std::thread::sleep(self.settle);

        let reply = read_up_to(channel, self.reply_len)?;
        if reply.len() < self.reply_len {
            debug!(
                opcode = ?self.command.opcode,
                "short read: {} of {} bytes",
                reply.len(),
                self.reply_len
            );
        }
        trace!("received {} bytes: {:02x?}", reply.len(), reply);

        Ok(reply)
    }

    /// Send the command and validate the reply against its opcode
    pub fn run<C>(&self, channel: &mut C) -> Result<Reply, ProtocolError>
    where
        C: CommunicationChannel + ?Sized,
    {
        let raw = self.exchange(channel)?;
        decode_and_check_reply(self.command.opcode.as_byte(), &raw)
    }
}

/// Read until `len` bytes arrived, the channel reports end of data, or the
/// read times out.
fn read_up_to<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = vec![0u8; len];
    let mut filled = 0;

    while filled < len {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock =>
            {
                break
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProtocolError::ChannelError(e)),
        }
    }

    buf.truncate(filled);
    Ok(buf)
}
