//! The USB stack as seen by the class drivers.
//!
//! The stack executes transfers and reports completions; drivers only start
//! them. Nothing here blocks: a transfer is started, and its completion is
//! delivered later through the driver's `transfer_complete` callback.

use xbox_proto::{EndpointAddress, EndpointDescriptor};

/// Error type for transfer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// Not configured, endpoint unassigned or busy. Retry next cycle.
    NotReady,
    /// The stack refused the request.
    Io,
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotReady => write!(f, "endpoint not ready"),
            Self::Io => write!(f, "transfer rejected by USB stack"),
        }
    }
}

/// How a transfer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferResult {
    Success,
    Failed,
    Stalled,
}

/// Control transfer stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlStage {
    Setup,
    Data,
    Ack,
}

/// Standard 8-byte SETUP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlRequest {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

/// Primitives a class driver needs from the USB stack.
pub trait UsbTransport {
    /// Device role: configured by the host. Host role: device mounted.
    fn is_ready(&self) -> bool;

    /// Claim an endpoint described by `desc`.
    fn open_endpoint(&mut self, desc: &EndpointDescriptor) -> Result<(), TransferError>;

    /// Whether the stack still has a transfer outstanding on `ep`.
    fn endpoint_busy(&self, ep: EndpointAddress) -> bool;

    /// Start sending `data` on `ep`. The stack copies `data` before returning.
    fn start_write(&mut self, ep: EndpointAddress, data: &[u8]) -> Result<(), TransferError>;

    /// Start a receive of up to `max_len` bytes on `ep`.
    fn start_read(&mut self, ep: EndpointAddress, max_len: usize) -> Result<(), TransferError>;
}

/// Callbacks the USB stack invokes on a device-role class driver.
pub trait UsbClassDriver<T: UsbTransport> {
    fn init(&mut self);

    fn deinit(&mut self);

    /// Bus reset or re-enumeration. Safe with transfers in flight.
    fn reset(&mut self);

    /// Offer an interface block. Returns the bytes consumed, or `0` when the
    /// interface belongs to another driver or cannot be opened.
    fn open(&mut self, transport: &mut T, descriptors: &[u8], max_len: u16) -> u16;

    /// Returns `true` when the request was accepted.
    fn control_request(
        &mut self,
        transport: &mut T,
        stage: ControlStage,
        request: &ControlRequest,
    ) -> bool;

    /// A transfer on one of this driver's endpoints finished. `data` holds the
    /// received bytes for reads and is empty for writes. Returns `false` for
    /// endpoints the driver does not own.
    fn transfer_complete(
        &mut self,
        transport: &mut T,
        ep: EndpointAddress,
        result: TransferResult,
        data: &[u8],
    ) -> bool;
}
