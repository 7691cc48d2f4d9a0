//! Platform-agnostic canonical gamepad state.
//!
//! This crate holds the single normalized controller representation that all
//! protocol codecs convert to and from. It owns no wire bit layout and
//! performs no I/O.
//!
//! # Overview
//!
//! - [`types`]: Core data structures ([`PadIn`], [`PadOut`], [`Buttons`], [`DPad`], [`AnalogStick`])
//! - [`gamepad`]: The Gamepad component contract ([`GamepadPort`]) and an in-memory
//!   implementation ([`Gamepad`])
//!
//! # Example
//!
//! ```rust
//! use gamepad_core::{Buttons, DPad, Gamepad, GamepadPort, PadIn};
//!
//! let mut gamepad = Gamepad::new();
//! gamepad.set_pad_in(PadIn {
//!     buttons: Buttons::A | Buttons::START,
//!     dpad: DPad::UP,
//!     ..PadIn::neutral()
//! });
//! assert!(gamepad.pad_in().buttons.contains(Buttons::START));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod gamepad;
pub mod types;

// Re-export main types at crate root
pub use gamepad::{invert_axis, Gamepad, GamepadPort};
pub use types::{AnalogStick, Buttons, DPad, PadIn, PadOut};
