//! Xbox controller wire formats: XInput (Xbox 360) reports and the Xbox One
//! Game Input Protocol (GIP), with conversions to the canonical
//! [`gamepad_core::PadIn`]/[`gamepad_core::PadOut`] state.
//!
//! # Overview
//!
//! - [`xinput`]: the 20-byte input report, wireless and chatpad variants,
//!   rumble/LED output reports and the interface descriptor block
//! - [`gip`]: packet header, chunking and reassembly, typed payloads
//! - [`descriptor`]: interface/endpoint descriptor parsing used during
//!   interface negotiation
//!
//! Every codec reads and writes named fields at fixed offsets; no buffer is
//! reinterpreted as a struct, and no codec keeps a reference to a caller's
//! buffer after it returns.
//!
//! # Example
//!
//! ```rust
//! use gamepad_core::{Buttons, PadIn};
//! use xbox_proto::gip::GipInput;
//! use xbox_proto::xinput::InReport;
//!
//! let pad = PadIn { buttons: Buttons::LB, trigger_r: 200, ..PadIn::neutral() };
//!
//! let report = InReport::from(&pad).to_bytes();
//! assert_eq!(InReport::parse(&report).unwrap().to_pad_in(), pad);
//!
//! let packet = GipInput::from_pad_in(&pad).to_packet(1);
//! let input = GipInput::parse(&packet[4..]).unwrap();
//! assert_eq!(input.to_pad_in(false), pad);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod descriptor;
pub mod gip;
pub mod xinput;

pub use descriptor::{
    DescriptorError, Descriptors, EndpointAddress, EndpointDescriptor, InterfaceClass,
    InterfaceDescriptor,
};
pub use gip::GipError;
pub use xinput::XInputError;
