//! Packet framing and chunked message reassembly.
//!
//! A message that fits in one packet is sent with `chunked = 0`. Larger
//! messages are split; every chunk carries, right after the header, a
//! little-endian base-128 varint: the total message length in the first chunk
//! (`chunk_start = 1`), the byte offset of the chunk's data in the rest. The
//! header `length` counts the chunk data only.
//!
//! ```
//! use xbox_proto::gip::{encode, Command, GipEvent, GipHeader, GipReassembler};
//!
//! let payload: Vec<u8> = (0..150u8).collect();
//! let header = GipHeader::new(Command::DeviceDescriptor).with_sequence(1);
//! let mut rx: GipReassembler = GipReassembler::new();
//!
//! let mut assembled = None;
//! for packet in encode(header, &payload).unwrap() {
//!     if let GipEvent::Message(msg) = rx.feed(packet.as_bytes()).unwrap() {
//!         assembled = Some(msg.payload.to_vec());
//!     }
//! }
//! assert_eq!(assembled.as_deref(), Some(&payload[..]));
//! ```

use heapless::Vec;

use super::header::GipHeader;
use super::{Command, GipError, ENDPOINT_SIZE, HEADER_SIZE, MAX_MESSAGE_SIZE, MAX_PACKET_PAYLOAD};

/// Largest total message length [`encode`] accepts.
pub const MAX_ENCODED_MESSAGE: usize = u16::MAX as usize;

/// Longest varint accepted on the wire.
const MAX_VARINT_LEN: usize = 3;

/// Append `value` as LEB128 to `out`, returning the number of bytes written.
pub fn write_varint(mut value: u32, out: &mut [u8]) -> Option<usize> {
    let mut i = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        let slot = out.get_mut(i)?;
        i += 1;
        if value == 0 {
            *slot = byte;
            return Some(i);
        }
        *slot = byte | 0x80;
    }
}

/// Decode a LEB128 varint from the front of `bytes`: `(value, bytes used)`.
pub fn read_varint(bytes: &[u8]) -> Result<(u32, usize), GipError> {
    let mut value = 0u32;
    for (i, &byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(GipError::MalformedVarint)
}

#[must_use]
pub const fn varint_len(mut value: u32) -> usize {
    let mut n = 1;
    while value >= 0x80 {
        value >>= 7;
        n += 1;
    }
    n
}

/// One wire packet, header included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GipPacket {
    buf: [u8; ENDPOINT_SIZE],
    len: usize,
}

impl GipPacket {
    /// Single unchunked packet. Sets the header `length` and clears the chunk flags.
    pub fn single(header: GipHeader, payload: &[u8]) -> Result<Self, GipError> {
        if payload.len() > MAX_PACKET_PAYLOAD {
            return Err(GipError::LengthExceedsPacket(payload.len()));
        }
        let header = header
            .with_chunked(false)
            .with_chunk_start(false)
            .with_length(payload.len() as u8);
        Ok(Self::assemble(header, &[], payload))
    }

    /// Packet for a payload whose size is fixed by its type.
    pub(crate) fn fixed<const L: usize>(header: GipHeader, payload: &[u8; L]) -> Self {
        Self::assemble(header.with_length(L as u8), &[], payload)
    }

    // Callers guarantee prefix + data fit.
    fn assemble(header: GipHeader, prefix: &[u8], data: &[u8]) -> Self {
        let mut buf = [0u8; ENDPOINT_SIZE];
        buf[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        let mut len = HEADER_SIZE;
        for part in [prefix, data] {
            buf[len..len + part.len()].copy_from_slice(part);
            len += part.len();
        }
        Self { buf, len }
    }

    #[must_use]
    pub fn header(&self) -> GipHeader {
        let mut h = [0u8; HEADER_SIZE];
        h.copy_from_slice(&self.buf[..HEADER_SIZE]);
        GipHeader::from_bytes(h)
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl core::ops::Deref for GipPacket {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Split `payload` into wire packets.
///
/// `header` supplies command, client, ack/internal flags and the sequence
/// shared by every chunk; its chunk flags and length are overwritten. The
/// needs-ack flag is kept on the first chunk only.
pub fn encode(header: GipHeader, payload: &[u8]) -> Result<GipPackets<'_>, GipError> {
    if payload.len() > MAX_ENCODED_MESSAGE {
        return Err(GipError::MessageTooLarge(payload.len()));
    }
    Ok(GipPackets {
        header,
        payload,
        offset: 0,
        chunked: payload.len() > MAX_PACKET_PAYLOAD,
        done: false,
    })
}

/// Iterator returned by [`encode`].
#[derive(Clone, Debug)]
pub struct GipPackets<'a> {
    header: GipHeader,
    payload: &'a [u8],
    offset: usize,
    chunked: bool,
    done: bool,
}

impl GipPackets<'_> {
    /// Whether the message is split into chunks.
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Payload bytes already emitted.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for GipPackets<'_> {
    type Item = GipPacket;

    fn next(&mut self) -> Option<GipPacket> {
        if self.done {
            return None;
        }
        if !self.chunked {
            self.done = true;
            self.offset = self.payload.len();
            let header = self
                .header
                .with_chunked(false)
                .with_chunk_start(false)
                .with_length(self.payload.len() as u8);
            return Some(GipPacket::assemble(header, &[], self.payload));
        }

        let first = self.offset == 0;
        let marker = u32::try_from(if first { self.payload.len() } else { self.offset }).ok()?;
        let mut prefix = [0u8; MAX_VARINT_LEN];
        let prefix_len = write_varint(marker, &mut prefix)?;

        let room = MAX_PACKET_PAYLOAD - prefix_len;
        let end = (self.offset + room).min(self.payload.len());
        let data = &self.payload[self.offset..end];
        // Only the first chunk asks for an acknowledgement.
        let header = self
            .header
            .with_chunked(true)
            .with_chunk_start(first)
            .with_needs_ack(first && self.header.needs_ack())
            .with_length(data.len() as u8);
        let packet = GipPacket::assemble(header, &prefix[..prefix_len], data);

        self.offset = end;
        self.done = end == self.payload.len();
        Some(packet)
    }
}

/// A complete message, borrowed from the packet or the reassembly buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GipMessage<'a> {
    /// Header of the single packet, or of the first chunk.
    pub header: GipHeader,
    pub command: Command,
    pub payload: &'a [u8],
}

/// Outcome of feeding one packet to the reassembler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GipEvent<'a> {
    /// A whole message is available.
    Message(GipMessage<'a>),
    /// Chunk accepted, message not complete yet.
    Pending,
    /// Command code this codec does not know; the packet was ignored.
    Unhandled(u8),
}

#[derive(Clone, Copy, Debug)]
struct PendingMessage {
    header: GipHeader,
    command: Command,
    total: usize,
}

/// Receive-side decoder with chunk reassembly.
///
/// Holds at most one in-progress message. `N` is the largest total message
/// length it accepts.
#[derive(Debug)]
pub struct GipReassembler<const N: usize = MAX_MESSAGE_SIZE> {
    buffer: Vec<u8, N>,
    pending: Option<PendingMessage>,
    last_completed: Option<u8>,
}

impl<const N: usize> Default for GipReassembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> GipReassembler<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            pending: None,
            last_completed: None,
        }
    }

    /// Drop any pending message and forget the completed sequence.
    pub fn reset(&mut self) {
        self.abort();
        self.last_completed = None;
    }

    /// Whether a chunked message is in progress.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Bytes accumulated for the pending message.
    #[must_use]
    pub fn received(&self) -> usize {
        self.buffer.len()
    }

    fn abort(&mut self) {
        self.pending = None;
        self.buffer.clear();
    }

    /// Decode one packet.
    ///
    /// Protocol violations discard the pending message (if any) and return an
    /// error; the reassembler is idle afterwards.
    pub fn feed<'a>(&'a mut self, packet: &'a [u8]) -> Result<GipEvent<'a>, GipError> {
        let header = GipHeader::parse(packet)?;
        let body = &packet[HEADER_SIZE..];
        let Some(command) = Command::from_u8(header.command()) else {
            return Ok(GipEvent::Unhandled(header.command()));
        };

        let len = header.length() as usize;
        if !header.chunked() {
            if len > MAX_PACKET_PAYLOAD {
                return Err(GipError::LengthExceedsPacket(len));
            }
            let payload = body.get(..len).ok_or(GipError::TruncatedPayload {
                expected: len,
                actual: body.len(),
            })?;
            return Ok(GipEvent::Message(GipMessage {
                header,
                command,
                payload,
            }));
        }

        let (marker, prefix_len) = read_varint(body)?;
        if prefix_len + len > MAX_PACKET_PAYLOAD {
            return Err(GipError::LengthExceedsPacket(prefix_len + len));
        }
        let data = body
            .get(prefix_len..prefix_len + len)
            .ok_or(GipError::TruncatedPayload {
                expected: len,
                actual: body.len().saturating_sub(prefix_len),
            })?;

        if header.chunk_start() {
            self.start(header, command, marker as usize, data)?;
        } else {
            self.extend(header, marker as usize, data)?;
        }
        self.try_complete()
    }

    fn start(
        &mut self,
        header: GipHeader,
        command: Command,
        total: usize,
        data: &[u8],
    ) -> Result<(), GipError> {
        if self.pending.is_some() {
            self.abort();
            return Err(GipError::UnexpectedChunkStart);
        }
        if self.last_completed == Some(header.sequence()) {
            return Err(GipError::DuplicateSequence(header.sequence()));
        }
        if total > N {
            return Err(GipError::MessageTooLarge(total));
        }
        if data.len() > total {
            return Err(GipError::ChunkOverflow);
        }
        self.buffer.clear();
        self.buffer
            .extend_from_slice(data)
            .map_err(|_| GipError::ChunkOverflow)?;
        self.pending = Some(PendingMessage {
            header,
            command,
            total,
        });
        Ok(())
    }

    fn extend(&mut self, header: GipHeader, offset: usize, data: &[u8]) -> Result<(), GipError> {
        let Some(pending) = self.pending else {
            return Err(if self.last_completed == Some(header.sequence()) {
                GipError::DuplicateSequence(header.sequence())
            } else {
                GipError::UnexpectedContinuation
            });
        };
        let expected = pending.header.sequence();
        if header.sequence() != expected {
            self.abort();
            return Err(GipError::SequenceMismatch {
                expected,
                actual: header.sequence(),
            });
        }
        if offset != self.buffer.len() {
            let expected = self.buffer.len();
            self.abort();
            return Err(GipError::ChunkOutOfOrder {
                expected,
                actual: offset,
            });
        }
        if self.buffer.len() + data.len() > pending.total
            || self.buffer.extend_from_slice(data).is_err()
        {
            self.abort();
            return Err(GipError::ChunkOverflow);
        }
        Ok(())
    }

    fn try_complete(&mut self) -> Result<GipEvent<'_>, GipError> {
        match self.pending {
            Some(pending) if self.buffer.len() == pending.total => {
                self.pending = None;
                self.last_completed = Some(pending.header.sequence());
                Ok(GipEvent::Message(GipMessage {
                    header: pending.header,
                    command: pending.command,
                    payload: &self.buffer,
                }))
            }
            _ => Ok(GipEvent::Pending),
        }
    }
}
