//! Host-role drivers: read a real controller and feed a [`GamepadPort`].
//!
//! Each driver decodes inbound reports, drops reports whose button and axis
//! fields match the previous one, scales through the gamepad and pushes the
//! result. Rumble goes back through [`HostDriver::send_feedback`] on a
//! best-effort basis.

mod xbox360;
mod xbox_one;

pub use xbox360::Xbox360Host;
pub use xbox_one::XboxOneHost;

use gamepad_core::{AnalogStick, GamepadPort, PadIn};
use xbox_proto::EndpointAddress;

use crate::class::OpenError;
use crate::device::BridgeError;
use crate::transport::{TransferError, TransferResult, UsbTransport};

/// Host driver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostConfig {
    /// Flip left stick Y when scaling.
    pub invert_left_y: bool,
    /// Flip right stick Y when scaling.
    pub invert_right_y: bool,
}

impl HostConfig {
    /// Xbox controllers report Y up; both sticks are flipped.
    pub const DEFAULT: Self = Self {
        invert_left_y: true,
        invert_right_y: true,
    };
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A driver for one attached controller.
pub trait HostDriver<T: UsbTransport> {
    /// Decode failure for an inbound report.
    type Error;

    /// Claim the controller's interface. Returns the bytes consumed.
    fn mount(&mut self, transport: &mut T, descriptors: &[u8], max_len: u16)
        -> Result<u16, OpenError>;

    /// Controller detached.
    fn unmount(&mut self);

    /// Arm the first receive.
    fn initialize(&mut self, transport: &mut T) -> Result<(), TransferError>;

    /// Decode one inbound report and push changed state into `gamepad`.
    /// Re-arms the receive endpoint whatever the outcome. Returns whether the
    /// gamepad was updated.
    fn process_report<G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &mut G,
        report: &[u8],
    ) -> Result<bool, Self::Error>;

    /// Route a completion; received reports go through
    /// [`process_report`](Self::process_report). Returns `false` for
    /// endpoints this driver does not own.
    fn transfer_complete<G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &mut G,
        ep: EndpointAddress,
        result: TransferResult,
        data: &[u8],
    ) -> bool;

    /// Send the gamepad's current rumble. A busy endpoint skips this cycle.
    fn send_feedback<G: GamepadPort>(&mut self, transport: &mut T, gamepad: &G)
        -> Result<(), BridgeError>;
}

/// Run triggers and sticks through the gamepad's scaling functions.
fn scale_pad<G: GamepadPort>(gamepad: &G, raw: PadIn, config: HostConfig) -> PadIn {
    let (lx, ly) =
        gamepad.scale_joystick_l(raw.left_stick.x, raw.left_stick.y, config.invert_left_y);
    let (rx, ry) =
        gamepad.scale_joystick_r(raw.right_stick.x, raw.right_stick.y, config.invert_right_y);
    PadIn {
        trigger_l: gamepad.scale_trigger_l(raw.trigger_l),
        trigger_r: gamepad.scale_trigger_r(raw.trigger_r),
        left_stick: AnalogStick::new(lx, ly),
        right_stick: AnalogStick::new(rx, ry),
        ..raw
    }
}
