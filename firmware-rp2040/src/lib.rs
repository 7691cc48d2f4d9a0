//! Xbox 360 (XInput) controller firmware for RP2040.
//!
//! Presents the board to a USB host as a wired Xbox 360 controller. The
//! protocol work happens in [`xbox_usb`]; this crate is board glue: USB
//! identity and descriptors, an adapter from embassy-usb endpoints to the
//! [`UsbTransport`](xbox_usb::UsbTransport) contract, and GPIO buttons.
//!
//! # Hardware Configuration
//!
//! | Function   | GPIO  | Description |
//! |------------|-------|-------------|
//! | A, B, X, Y | 2-5   | Face buttons (active low, internal pull-up) |
//! | BACK       | 6     | View |
//! | START      | 7     | Menu |
//! | D-pad      | 10-13 | Up, down, left, right (active low) |
//! | LED        | 25    | On-board LED, lit while the host drives rumble |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with four tasks:
//!
//! - **USB Task**: Runs the embassy-usb device stack (enumeration, control pipe)
//! - **IN Pump**: Writes queued reports to the interrupt IN endpoint
//! - **OUT Pump**: Reads host reports from the interrupt OUT endpoint when armed
//! - **Driver Task**: Every millisecond, samples the buttons and polls the
//!   [`XInputDevice`](xbox_usb::XInputDevice) bridge; between ticks, hands
//!   finished transfers back to it
//!
//! The pumps and the driver share one static [`UsbPipes`]. The driver never
//! awaits a transfer: it queues one and learns about the result from a
//! completion.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features - pick one panic handler");

pub mod input;
pub mod pipes;
pub mod usb;

pub use input::ButtonInput;
pub use pipes::{Completion, EmbassyTransport, Packet, UsbPipes};
pub use usb::{configure_xinput, interface_block, usb_config, UsbStateHandler, USB_PID, USB_VID};
