//! GPIO buttons as the pad's input source.

use embassy_rp::gpio::Input;
use gamepad_core::{Buttons, DPad, PadIn};

/// Active-low push buttons wired to GPIO with pull-ups.
pub struct ButtonInput<'d, const B: usize, const D: usize> {
    buttons: [(Input<'d>, Buttons); B],
    dpad: [(Input<'d>, DPad); D],
}

impl<'d, const B: usize, const D: usize> ButtonInput<'d, B, D> {
    #[must_use]
    pub fn new(buttons: [(Input<'d>, Buttons); B], dpad: [(Input<'d>, DPad); D]) -> Self {
        Self { buttons, dpad }
    }

    /// Sample every pin. Sticks and triggers stay centered.
    #[must_use]
    pub fn read(&self) -> PadIn {
        let mut pad = PadIn::neutral();
        for (pin, button) in &self.buttons {
            pad.buttons.set(*button, pin.is_low());
        }
        for (pin, direction) in &self.dpad {
            pad.dpad.set(*direction, pin.is_low());
        }
        pad
    }
}
