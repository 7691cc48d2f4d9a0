//! Xbox controller class drivers over an abstract, callback-driven USB stack.
//!
//! The USB stack executes transfers and calls back into the drivers here. The
//! drivers own the endpoint buffers, run the `xbox-proto` codecs and move
//! state in and out of a [`gamepad_core::GamepadPort`].
//!
//! # Layers
//!
//! - [`transport`]: the primitives a driver needs from the stack, and the
//!   callbacks the stack invokes on a driver
//! - [`scheduler`]: one transmit and one receive buffer per interface,
//!   busy tracking, re-arm on completion
//! - [`class`]: interface negotiation and lifecycle
//! - [`device`]: present a gamepad to a host as an Xbox 360 or Xbox One pad
//! - [`host`]: read an attached Xbox 360 or Xbox One pad into a gamepad
//!
//! Everything is synchronous and bounded. Nothing blocks; a send on a busy
//! endpoint fails with [`TransferError::NotReady`] and the caller retries on
//! its next poll.
//!
//! # Example
//!
//! ```rust
//! use gamepad_core::Gamepad;
//! use xbox_proto::{xinput, EndpointAddress, EndpointDescriptor};
//! use xbox_usb::{GamepadBridge, TransferError, UsbClassDriver, UsbTransport, XInputDevice};
//!
//! /// A stack that accepts everything and completes nothing.
//! struct Loopback;
//!
//! impl UsbTransport for Loopback {
//!     fn is_ready(&self) -> bool { true }
//!     fn open_endpoint(&mut self, _: &EndpointDescriptor) -> Result<(), TransferError> { Ok(()) }
//!     fn endpoint_busy(&self, _: EndpointAddress) -> bool { false }
//!     fn start_write(&mut self, _: EndpointAddress, _: &[u8]) -> Result<(), TransferError> { Ok(()) }
//!     fn start_read(&mut self, _: EndpointAddress, _: usize) -> Result<(), TransferError> { Ok(()) }
//! }
//!
//! let mut usb = Loopback;
//! let mut pad = Gamepad::new();
//! let mut device = XInputDevice::new();
//!
//! UsbClassDriver::<Loopback>::init(&mut device);
//! assert_eq!(device.open(&mut usb, &xinput::INTERFACE_DESCRIPTOR, 512), 39);
//! assert!(device.poll(&mut usb, &mut pad).is_ok());
//! // The first report is still in flight.
//! assert!(device.poll(&mut usb, &mut pad).unwrap_err().is_not_ready());
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log and format through defmt (for embedded logging)
//! - **`log`**: Log through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to the other modules.
mod fmt;

pub mod class;
pub mod device;
pub mod host;
pub mod scheduler;
pub mod transport;

#[cfg(test)]
mod mock;

pub use class::{ClassState, OpenError, XboxClass};
pub use device::{BridgeError, GamepadBridge, XInputDevice, XboxOneDevice};
pub use host::{HostConfig, HostDriver, Xbox360Host, XboxOneHost};
pub use scheduler::{Completion, EndpointScheduler, Role};
pub use transport::{
    ControlRequest, ControlStage, TransferError, TransferResult, UsbClassDriver, UsbTransport,
};
