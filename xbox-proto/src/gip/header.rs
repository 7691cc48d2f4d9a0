//! The 4-byte GIP packet header.
//!
//! ```text
//! byte 0  command
//! byte 1  flags: client[0..3] needs_ack[4] internal[5] chunk_start[6] chunked[7]
//! byte 2  sequence
//! byte 3  length of this packet's payload
//! ```

use super::{Command, GipError, HEADER_SIZE};

pub const CLIENT_MASK: u8 = 0x0F;
pub const FLAG_NEEDS_ACK: u8 = 1 << 4;
pub const FLAG_INTERNAL: u8 = 1 << 5;
pub const FLAG_CHUNK_START: u8 = 1 << 6;
pub const FLAG_CHUNKED: u8 = 1 << 7;

/// First chunk of a device response (`0xF0`).
pub const FLAGS_RESPONSE_FIRST: u8 = FLAG_CHUNKED | FLAG_CHUNK_START | FLAG_INTERNAL | FLAG_NEEDS_ACK;
/// Continuation chunk (`0xA0`).
pub const FLAGS_CONTINUE: u8 = FLAG_CHUNKED | FLAG_INTERNAL;

/// Packet header stored as its wire bytes.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GipHeader([u8; HEADER_SIZE]);

impl GipHeader {
    /// Header for `command` with all flags clear and zero sequence/length.
    #[must_use]
    pub const fn new(command: Command) -> Self {
        Self([command.code(), 0, 0, 0])
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self(bytes)
    }

    /// Read the header at the start of `packet`.
    pub fn parse(packet: &[u8]) -> Result<Self, GipError> {
        match packet.get(..HEADER_SIZE) {
            Some(&[a, b, c, d]) => Ok(Self([a, b, c, d])),
            _ => Err(GipError::TruncatedHeader),
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_bytes(self) -> [u8; HEADER_SIZE] {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn command(self) -> u8 {
        self.0[0]
    }

    #[inline]
    #[must_use]
    pub const fn flags(self) -> u8 {
        self.0[1]
    }

    #[inline]
    #[must_use]
    pub const fn client(self) -> u8 {
        self.0[1] & CLIENT_MASK
    }

    #[inline]
    #[must_use]
    pub const fn needs_ack(self) -> bool {
        self.0[1] & FLAG_NEEDS_ACK != 0
    }

    #[inline]
    #[must_use]
    pub const fn internal(self) -> bool {
        self.0[1] & FLAG_INTERNAL != 0
    }

    #[inline]
    #[must_use]
    pub const fn chunk_start(self) -> bool {
        self.0[1] & FLAG_CHUNK_START != 0
    }

    #[inline]
    #[must_use]
    pub const fn chunked(self) -> bool {
        self.0[1] & FLAG_CHUNKED != 0
    }

    #[inline]
    #[must_use]
    pub const fn sequence(self) -> u8 {
        self.0[2]
    }

    #[inline]
    #[must_use]
    pub const fn length(self) -> u8 {
        self.0[3]
    }

    #[must_use]
    pub const fn with_client(mut self, client: u8) -> Self {
        self.0[1] = (self.0[1] & !CLIENT_MASK) | (client & CLIENT_MASK);
        self
    }

    #[must_use]
    pub const fn with_needs_ack(self, on: bool) -> Self {
        self.with_flag(FLAG_NEEDS_ACK, on)
    }

    #[must_use]
    pub const fn with_internal(self, on: bool) -> Self {
        self.with_flag(FLAG_INTERNAL, on)
    }

    #[must_use]
    pub const fn with_chunk_start(self, on: bool) -> Self {
        self.with_flag(FLAG_CHUNK_START, on)
    }

    #[must_use]
    pub const fn with_chunked(self, on: bool) -> Self {
        self.with_flag(FLAG_CHUNKED, on)
    }

    #[must_use]
    pub const fn with_sequence(mut self, sequence: u8) -> Self {
        self.0[2] = sequence;
        self
    }

    #[must_use]
    pub const fn with_length(mut self, length: u8) -> Self {
        self.0[3] = length;
        self
    }

    const fn with_flag(mut self, flag: u8, on: bool) -> Self {
        if on {
            self.0[1] |= flag;
        } else {
            self.0[1] &= !flag;
        }
        self
    }
}
