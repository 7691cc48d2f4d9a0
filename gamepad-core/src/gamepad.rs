//! The Gamepad component contract and a plain in-memory implementation.

use crate::types::{PadIn, PadOut};

/// Storage and scaling for the canonical controller state.
///
/// Protocol drivers push decoded input through [`set_pad_in`](Self::set_pad_in)
/// and read feedback through [`pad_out`](Self::pad_out). They hand raw trigger
/// and stick values to the `scale_*` functions and never interpret the units
/// that come back.
pub trait GamepadPort {
    /// Replace the current input state.
    fn set_pad_in(&mut self, pad: PadIn);

    /// Current input state.
    fn pad_in(&self) -> PadIn;

    /// Replace the current feedback state.
    fn set_pad_out(&mut self, pad: PadOut);

    /// Current feedback state.
    fn pad_out(&self) -> PadOut;

    /// Scale a raw left trigger byte.
    fn scale_trigger_l(&self, value: u8) -> u8 {
        value
    }

    /// Scale a raw right trigger byte.
    fn scale_trigger_r(&self, value: u8) -> u8 {
        value
    }

    /// Scale a raw left stick position, optionally flipping Y.
    fn scale_joystick_l(&self, x: i16, y: i16, invert_y: bool) -> (i16, i16) {
        (x, maybe_invert(y, invert_y))
    }

    /// Scale a raw right stick position, optionally flipping Y.
    fn scale_joystick_r(&self, x: i16, y: i16, invert_y: bool) -> (i16, i16) {
        (x, maybe_invert(y, invert_y))
    }
}

/// Negate an axis value. `i16::MIN` maps to `i16::MAX`.
#[inline]
#[must_use]
pub const fn invert_axis(value: i16) -> i16 {
    value.saturating_neg()
}

#[inline]
const fn maybe_invert(value: i16, invert: bool) -> i16 {
    if invert {
        invert_axis(value)
    } else {
        value
    }
}

/// In-memory gamepad with identity scaling.
///
/// Deadzones and response curves are out of scope; this is the reference
/// store used by the firmware and by tests.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gamepad {
    pad_in: PadIn,
    pad_out: PadOut,
}

impl Gamepad {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pad_in: PadIn::neutral(),
            pad_out: PadOut::OFF,
        }
    }

    /// Return to neutral input and motors off.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl GamepadPort for Gamepad {
    #[inline]
    fn set_pad_in(&mut self, pad: PadIn) {
        self.pad_in = pad;
    }

    #[inline]
    fn pad_in(&self) -> PadIn {
        self.pad_in
    }

    #[inline]
    fn set_pad_out(&mut self, pad: PadOut) {
        self.pad_out = pad;
    }

    #[inline]
    fn pad_out(&self) -> PadOut {
        self.pad_out
    }
}
