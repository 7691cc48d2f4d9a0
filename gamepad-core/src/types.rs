//! Canonical gamepad types: Buttons, DPad, AnalogStick, PadIn, PadOut.
//!
//! These carry no protocol-specific bit layout. Every codec converts its own
//! wire bits to and from these masks through explicit tables.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Button state represented as a bitfield.
///
/// Face buttons, shoulders, stick clicks and the system buttons. The d-pad
/// lives in [`DPad`].
///
/// # Example
///
/// ```
/// use gamepad_core::Buttons;
///
/// let buttons = Buttons::A | Buttons::LB;
/// assert!(buttons.contains(Buttons::A));
/// assert!(buttons.contains(Buttons::LB));
/// assert!(!buttons.contains(Buttons::X));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const A: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const X: Self = Self(1 << 2);
    pub const Y: Self = Self(1 << 3);
    pub const L3: Self = Self(1 << 4); // Left stick press
    pub const R3: Self = Self(1 << 5); // Right stick press
    pub const BACK: Self = Self(1 << 6); // View/Select
    pub const START: Self = Self(1 << 7); // Menu
    pub const LB: Self = Self(1 << 8); // Left bumper
    pub const RB: Self = Self(1 << 9); // Right bumper
    pub const SYS: Self = Self(1 << 10); // Guide/Home
    pub const MISC: Self = Self(1 << 11); // Share/Sync/Capture

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Get the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Check if no buttons are pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// D-pad state as a 4-bit mask. Opposite directions may both be set; the
/// protocols do not forbid it and neither does this type.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DPad(pub u8);

impl DPad {
    pub const UP: Self = Self(1 << 0);
    pub const DOWN: Self = Self(1 << 1);
    pub const LEFT: Self = Self(1 << 2);
    pub const RIGHT: Self = Self(1 << 3);

    /// Centered.
    pub const NONE: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn contains(self, direction: DPad) -> bool {
        (self.0 & direction.0) == direction.0
    }

    #[inline]
    pub fn set(&mut self, direction: DPad, pressed: bool) {
        if pressed {
            self.0 |= direction.0;
        } else {
            self.0 &= !direction.0;
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

macro_rules! impl_mask_ops {
    ($ty:ident) => {
        impl BitOr for $ty {
            type Output = Self;

            #[inline]
            fn bitor(self, rhs: Self) -> Self::Output {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $ty {
            #[inline]
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $ty {
            type Output = Self;

            #[inline]
            fn bitand(self, rhs: Self) -> Self::Output {
                Self(self.0 & rhs.0)
            }
        }

        impl BitAndAssign for $ty {
            #[inline]
            fn bitand_assign(&mut self, rhs: Self) {
                self.0 &= rhs.0;
            }
        }

        impl Not for $ty {
            type Output = Self;

            #[inline]
            fn not(self) -> Self::Output {
                Self(!self.0)
            }
        }
    };
}

impl_mask_ops!(Buttons);
impl_mask_ops!(DPad);

/// Analog stick with X/Y axes.
///
/// Range: [-32768, 32767] for full precision.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogStick {
    pub x: i16,
    pub y: i16,
}

impl AnalogStick {
    #[must_use]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    pub const NEUTRAL: Self = Self { x: 0, y: 0 };
}

/// Controller input snapshot in canonical form.
///
/// Produced by host-role decoders, consumed by device-role encoders.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadIn {
    pub dpad: DPad,
    pub buttons: Buttons,
    /// Left trigger (0-255).
    pub trigger_l: u8,
    /// Right trigger (0-255).
    pub trigger_r: u8,
    pub left_stick: AnalogStick,
    pub right_stick: AnalogStick,
}

impl PadIn {
    /// Create a zeroed/neutral input state (no buttons pressed, sticks centered).
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            dpad: DPad::NONE,
            buttons: Buttons::NONE,
            trigger_l: 0,
            trigger_r: 0,
            left_stick: AnalogStick::NEUTRAL,
            right_stick: AnalogStick::NEUTRAL,
        }
    }
}

/// Feedback requested by the host: two rumble motor strengths (0-255).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadOut {
    pub rumble_l: u8,
    pub rumble_r: u8,
}

impl PadOut {
    /// Motors off.
    pub const OFF: Self = Self {
        rumble_l: 0,
        rumble_r: 0,
    };

    #[must_use]
    pub const fn new(rumble_l: u8, rumble_r: u8) -> Self {
        Self { rumble_l, rumble_r }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_bitwise_or() {
        let buttons = Buttons::A | Buttons::B;
        assert!(buttons.contains(Buttons::A));
        assert!(buttons.contains(Buttons::B));
        assert!(!buttons.contains(Buttons::X));
    }

    #[test]
    fn test_buttons_set_clear() {
        let mut buttons = Buttons::NONE;
        buttons.set(Buttons::SYS, true);
        assert!(buttons.contains(Buttons::SYS));
        buttons.set(Buttons::SYS, false);
        assert!(buttons.is_empty());
    }

    #[test]
    fn test_buttons_are_distinct_bits() {
        let all = [
            Buttons::A,
            Buttons::B,
            Buttons::X,
            Buttons::Y,
            Buttons::L3,
            Buttons::R3,
            Buttons::BACK,
            Buttons::START,
            Buttons::LB,
            Buttons::RB,
            Buttons::SYS,
            Buttons::MISC,
        ];
        let mut seen = 0u16;
        for b in all {
            assert_eq!(b.raw().count_ones(), 1);
            assert_eq!(seen & b.raw(), 0);
            seen |= b.raw();
        }
    }

    #[test]
    fn test_dpad_mask_ops() {
        let mut dpad = DPad::UP | DPad::LEFT;
        assert!(dpad.contains(DPad::UP));
        assert!(!dpad.contains(DPad::DOWN));
        dpad &= !DPad::UP;
        assert_eq!(dpad, DPad::LEFT);
    }

    #[test]
    fn test_pad_in_neutral_is_default() {
        assert_eq!(PadIn::neutral(), PadIn::default());
        assert_eq!(PadOut::OFF, PadOut::default());
    }
}
