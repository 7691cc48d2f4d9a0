//! USB interface/endpoint descriptor views.
//!
//! Only what interface negotiation needs: walking a descriptor block, reading
//! the interface class triple and reading endpoint descriptors. Every field is
//! read at its fixed offset; nothing is reinterpreted in place.

/// `bDescriptorType` of an interface descriptor.
pub const DESC_TYPE_INTERFACE: u8 = 0x04;
/// `bDescriptorType` of an endpoint descriptor.
pub const DESC_TYPE_ENDPOINT: u8 = 0x05;
/// Vendor-specific descriptor that XInput places between the interface and its endpoints.
pub const DESC_TYPE_VENDOR: u8 = 0x21;

/// Size of a standard interface descriptor.
pub const INTERFACE_DESC_LEN: usize = 9;
/// Size of a standard endpoint descriptor.
pub const ENDPOINT_DESC_LEN: usize = 7;

/// Error type for descriptor parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorError {
    /// Fewer bytes than `bLength` (or than the fixed descriptor size).
    Truncated,
    /// `bLength` of zero or smaller than the two-byte descriptor prefix.
    InvalidLength,
    /// The descriptor is not of the expected type.
    UnexpectedType(u8),
}

impl core::fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Truncated => write!(f, "descriptor truncated"),
            Self::InvalidLength => write!(f, "invalid descriptor length"),
            Self::UnexpectedType(t) => write!(f, "unexpected descriptor type {t:#04x}"),
        }
    }
}

/// USB endpoint address: bit 7 is the direction, bits 0..3 the number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointAddress(pub u8);

impl EndpointAddress {
    const DIR_IN: u8 = 0x80;

    /// Build an IN (device to host) address.
    #[must_use]
    pub const fn in_ep(number: u8) -> Self {
        Self(Self::DIR_IN | (number & 0x0F))
    }

    /// Build an OUT (host to device) address.
    #[must_use]
    pub const fn out_ep(number: u8) -> Self {
        Self(number & 0x0F)
    }

    #[inline]
    #[must_use]
    pub const fn is_in(self) -> bool {
        self.0 & Self::DIR_IN != 0
    }

    #[inline]
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0 & 0x0F
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// Interface class/subclass/protocol triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceClass {
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

impl InterfaceClass {
    #[must_use]
    pub const fn new(class: u8, subclass: u8, protocol: u8) -> Self {
        Self {
            class,
            subclass,
            protocol,
        }
    }
}

/// Parsed standard interface descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceDescriptor {
    pub number: u8,
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub class: InterfaceClass,
    pub string_index: u8,
}

impl InterfaceDescriptor {
    /// Parse the interface descriptor at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let raw = RawDescriptor::parse(bytes)?;
        if raw.kind() != DESC_TYPE_INTERFACE {
            return Err(DescriptorError::UnexpectedType(raw.kind()));
        }
        let b = raw.bytes();
        if b.len() < INTERFACE_DESC_LEN {
            return Err(DescriptorError::Truncated);
        }
        Ok(Self {
            number: b[2],
            alternate_setting: b[3],
            num_endpoints: b[4],
            class: InterfaceClass::new(b[5], b[6], b[7]),
            string_index: b[8],
        })
    }
}

/// Parsed standard endpoint descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointDescriptor {
    pub address: EndpointAddress,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}

impl EndpointDescriptor {
    /// Parse the endpoint descriptor at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let raw = RawDescriptor::parse(bytes)?;
        if raw.kind() != DESC_TYPE_ENDPOINT {
            return Err(DescriptorError::UnexpectedType(raw.kind()));
        }
        let b = raw.bytes();
        if b.len() < ENDPOINT_DESC_LEN {
            return Err(DescriptorError::Truncated);
        }
        Ok(Self {
            address: EndpointAddress(b[2]),
            attributes: b[3],
            max_packet_size: u16::from_le_bytes([b[4], b[5]]),
            interval: b[6],
        })
    }
}

/// One descriptor inside a configuration block: `bLength`-sized byte slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawDescriptor<'a> {
    bytes: &'a [u8],
}

impl<'a> RawDescriptor<'a> {
    /// Take the first descriptor from `bytes`, validating `bLength`.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DescriptorError> {
        let len = *bytes.first().ok_or(DescriptorError::Truncated)? as usize;
        if len < 2 {
            return Err(DescriptorError::InvalidLength);
        }
        let bytes = bytes.get(..len).ok_or(DescriptorError::Truncated)?;
        Ok(Self { bytes })
    }

    /// `bDescriptorType`.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> u8 {
        self.bytes[1]
    }

    /// `bLength`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Iterator over consecutive descriptors in a block.
///
/// Stops after the first malformed descriptor, yielding its error once.
#[derive(Clone, Debug)]
pub struct Descriptors<'a> {
    rest: &'a [u8],
}

impl<'a> Descriptors<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        self.rest
    }

    /// Look at the next descriptor without consuming it.
    pub fn peek(&self) -> Option<Result<RawDescriptor<'a>, DescriptorError>> {
        if self.rest.is_empty() {
            None
        } else {
            Some(RawDescriptor::parse(self.rest))
        }
    }
}

impl<'a> Iterator for Descriptors<'a> {
    type Item = Result<RawDescriptor<'a>, DescriptorError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.peek()?;
        match item {
            Ok(desc) => self.rest = &self.rest[desc.len()..],
            Err(_) => self.rest = &[],
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: [u8; 23] = [
        0x09, 0x04, 0x00, 0x00, 0x02, 0xFF, 0x47, 0xD0, 0x00, // interface
        0x07, 0x05, 0x02, 0x03, 0x40, 0x00, 0x04, // EP 0x02 OUT
        0x07, 0x05, 0x82, 0x03, 0x40, 0x00, 0x04, // EP 0x82 IN
    ];

    #[test]
    fn test_parse_interface() {
        let itf = InterfaceDescriptor::parse(&BLOCK).unwrap();
        assert_eq!(itf.num_endpoints, 2);
        assert_eq!(itf.class, InterfaceClass::new(0xFF, 0x47, 0xD0));
    }

    #[test]
    fn test_parse_endpoint() {
        let ep = EndpointDescriptor::parse(&BLOCK[9..]).unwrap();
        assert_eq!(ep.address, EndpointAddress::out_ep(2));
        assert!(!ep.address.is_in());
        assert_eq!(ep.max_packet_size, 64);
        assert_eq!(ep.interval, 4);
    }

    #[test]
    fn test_walk_block() {
        let kinds: [u8; 3] = {
            let mut it = Descriptors::new(&BLOCK);
            [
                it.next().unwrap().unwrap().kind(),
                it.next().unwrap().unwrap().kind(),
                it.next().unwrap().unwrap().kind(),
            ]
        };
        assert_eq!(kinds, [DESC_TYPE_INTERFACE, DESC_TYPE_ENDPOINT, DESC_TYPE_ENDPOINT]);
        assert!(Descriptors::new(&BLOCK).nth(3).is_none());
    }

    #[test]
    fn test_zero_length_stops_walk() {
        let bytes = [0x00, 0x05, 0x81];
        let mut it = Descriptors::new(&bytes);
        assert_eq!(it.next(), Some(Err(DescriptorError::InvalidLength)));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_truncated_descriptor() {
        assert_eq!(
            EndpointDescriptor::parse(&BLOCK[9..14]),
            Err(DescriptorError::Truncated)
        );
        assert_eq!(
            InterfaceDescriptor::parse(&BLOCK[9..]),
            Err(DescriptorError::UnexpectedType(DESC_TYPE_ENDPOINT))
        );
    }

    #[test]
    fn test_endpoint_address_helpers() {
        let ep = EndpointAddress::in_ep(1);
        assert_eq!(ep.raw(), 0x81);
        assert!(ep.is_in());
        assert_eq!(ep.number(), 1);
    }
}
