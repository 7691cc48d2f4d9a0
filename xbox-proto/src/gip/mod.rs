//! Xbox One Game Input Protocol (GIP).
//!
//! GIP is message oriented. Every USB packet starts with a 4-byte
//! [`GipHeader`]; messages larger than one packet are split into chunks
//! ([`chunk`]) and reassembled on the receiving side by [`GipReassembler`].
//! Typed payloads live in [`message`].

pub mod chunk;
pub mod header;
pub mod message;

pub use chunk::{encode, GipEvent, GipMessage, GipPacket, GipPackets, GipReassembler};
pub use header::GipHeader;
pub use message::{
    BatteryLevel, BatteryType, DeviceArrival, DeviceStatus, FirmwareVersion, ForceFeedback,
    ForceFeedbackBuilder, GipInput, GipSequence, VirtualKey,
};

use crate::descriptor::InterfaceClass;

/// Interrupt endpoint packet size.
pub const ENDPOINT_SIZE: usize = 64;
/// Size of the header at the start of every packet.
pub const HEADER_SIZE: usize = 4;
/// Largest payload a single packet can carry.
pub const MAX_PACKET_PAYLOAD: usize = ENDPOINT_SIZE - HEADER_SIZE;
/// Default capacity of the chunk reassembly buffer.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Vendor-specific interface class/subclass/protocol.
pub const INTERFACE_CLASS: InterfaceClass = InterfaceClass::new(0xFF, 0x47, 0xD0);

/// Message commands understood by this codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    DeviceArrival = 0x02,
    DeviceStatus = 0x03,
    DeviceDescriptor = 0x04,
    VirtualKey = 0x07,
    SetDeviceState = 0x09,
    Input = 0x20,
    SystemFocusChange = 0xE0,
}

impl Command {
    /// Map a raw command byte. Unknown codes return `None`.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x02 => Some(Self::DeviceArrival),
            0x03 => Some(Self::DeviceStatus),
            0x04 => Some(Self::DeviceDescriptor),
            0x07 => Some(Self::VirtualKey),
            0x09 => Some(Self::SetDeviceState),
            0x20 => Some(Self::Input),
            0xE0 => Some(Self::SystemFocusChange),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Error type for GIP decoding and reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GipError {
    /// Fewer than [`HEADER_SIZE`] bytes.
    TruncatedHeader,
    /// The packet holds fewer bytes than the header's `length`.
    TruncatedPayload { expected: usize, actual: usize },
    /// `length` (plus chunk framing) exceeds a packet's payload capacity.
    LengthExceedsPacket(usize),
    /// Chunk offset/length varint is truncated or too long.
    MalformedVarint,
    /// A chunk start arrived while another message was still pending.
    UnexpectedChunkStart,
    /// A continuation chunk arrived with no message pending.
    UnexpectedContinuation,
    /// Continuation sequence differs from the pending message.
    SequenceMismatch { expected: u8, actual: u8 },
    /// Continuation offset is not the number of bytes received so far.
    ChunkOutOfOrder { expected: usize, actual: usize },
    /// Chunk data runs past the declared total length.
    ChunkOverflow,
    /// Declared total length exceeds the reassembly buffer or encodable range.
    MessageTooLarge(usize),
    /// The sequence of the last completed message was delivered again.
    DuplicateSequence(u8),
    /// Payload shorter than the typed message needs.
    PayloadTooShort { expected: usize, actual: usize },
}

impl core::fmt::Display for GipError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TruncatedHeader => write!(f, "packet shorter than GIP header"),
            Self::TruncatedPayload { expected, actual } => {
                write!(f, "payload truncated: header says {expected}, got {actual}")
            }
            Self::LengthExceedsPacket(len) => write!(f, "length {len} exceeds packet capacity"),
            Self::MalformedVarint => write!(f, "malformed chunk varint"),
            Self::UnexpectedChunkStart => write!(f, "chunk start while message pending"),
            Self::UnexpectedContinuation => write!(f, "continuation without chunk start"),
            Self::SequenceMismatch { expected, actual } => {
                write!(f, "chunk sequence {actual}, expected {expected}")
            }
            Self::ChunkOutOfOrder { expected, actual } => {
                write!(f, "chunk offset {actual}, expected {expected}")
            }
            Self::ChunkOverflow => write!(f, "chunk overflows declared length"),
            Self::MessageTooLarge(len) => write!(f, "message length {len} too large"),
            Self::DuplicateSequence(seq) => write!(f, "sequence {seq} already completed"),
            Self::PayloadTooShort { expected, actual } => {
                write!(f, "payload too short: need {expected}, got {actual}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_codes() {
        for cmd in [
            Command::DeviceArrival,
            Command::DeviceStatus,
            Command::DeviceDescriptor,
            Command::VirtualKey,
            Command::SetDeviceState,
            Command::Input,
            Command::SystemFocusChange,
        ] {
            assert_eq!(Command::from_u8(cmd.code()), Some(cmd));
        }
        assert_eq!(Command::from_u8(0x01), None);
        assert_eq!(Command::from_u8(0x0A), None);
    }

    #[test]
    fn test_packet_capacity() {
        assert_eq!(MAX_PACKET_PAYLOAD, 60);
    }
}
