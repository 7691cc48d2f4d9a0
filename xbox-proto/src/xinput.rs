//! Xbox 360 wired ("XInput") report formats.
//!
//! XInput is a single-packet protocol: one 20-byte input report towards the
//! host, and short output reports (rumble, LED) towards the device. All reports
//! are read and written field by field at fixed little-endian offsets.

use gamepad_core::{AnalogStick, Buttons, DPad, PadIn, PadOut};

use crate::descriptor::InterfaceClass;

/// Interrupt endpoint packet size.
pub const ENDPOINT_SIZE: usize = 32;

/// Vendor-specific interface class/subclass/protocol.
pub const INTERFACE_CLASS: InterfaceClass = InterfaceClass::new(0xFF, 0x5D, 0x01);

/// Interface block for a wired XInput pad: interface descriptor, the 0x21
/// vendor descriptor, then interrupt IN 0x81 and OUT 0x01.
pub const INTERFACE_DESCRIPTOR: [u8; 39] = [
    0x09, 0x04, 0x00, 0x00, 0x02, 0xFF, 0x5D, 0x01, 0x00, //
    0x10, 0x21, 0x00, 0x01, 0x01, 0x25, 0x81, 0x14, 0x00, 0x00, 0x00, 0x00, 0x13, 0x01, 0x08,
    0x00, //
    0x07, 0x05, 0x81, 0x03, 0x20, 0x00, 0x01, //
    0x07, 0x05, 0x01, 0x03, 0x20, 0x00, 0x08,
];

/// Payload of the vendor descriptor (type 0x21), without its two-byte prefix.
pub const VENDOR_DESCRIPTOR_BODY: [u8; 14] = [
    0x00, 0x01, 0x01, 0x25, 0x81, 0x14, 0x00, 0x00, 0x00, 0x00, 0x13, 0x01, 0x08, 0x00,
];

/// First button byte.
pub mod buttons0 {
    pub const DPAD_UP: u8 = 1 << 0;
    pub const DPAD_DOWN: u8 = 1 << 1;
    pub const DPAD_LEFT: u8 = 1 << 2;
    pub const DPAD_RIGHT: u8 = 1 << 3;
    pub const START: u8 = 1 << 4;
    pub const BACK: u8 = 1 << 5;
    pub const L3: u8 = 1 << 6;
    pub const R3: u8 = 1 << 7;
}

/// Second button byte, in the wired pad's own layout: bumpers and home in
/// the low bits, face buttons in the high nibble (0x10 is A). Bit 3 is unused.
pub mod buttons1 {
    pub const LB: u8 = 1 << 0;
    pub const RB: u8 = 1 << 1;
    pub const HOME: u8 = 1 << 2;
    pub const A: u8 = 1 << 4;
    pub const B: u8 = 1 << 5;
    pub const X: u8 = 1 << 6;
    pub const Y: u8 = 1 << 7;
}

const DPAD_TABLE: [(u8, DPad); 4] = [
    (buttons0::DPAD_UP, DPad::UP),
    (buttons0::DPAD_DOWN, DPad::DOWN),
    (buttons0::DPAD_LEFT, DPad::LEFT),
    (buttons0::DPAD_RIGHT, DPad::RIGHT),
];

const BUTTONS0_TABLE: [(u8, Buttons); 4] = [
    (buttons0::START, Buttons::START),
    (buttons0::BACK, Buttons::BACK),
    (buttons0::L3, Buttons::L3),
    (buttons0::R3, Buttons::R3),
];

const BUTTONS1_TABLE: [(u8, Buttons); 7] = [
    (buttons1::LB, Buttons::LB),
    (buttons1::RB, Buttons::RB),
    (buttons1::HOME, Buttons::SYS),
    (buttons1::A, Buttons::A),
    (buttons1::B, Buttons::B),
    (buttons1::X, Buttons::X),
    (buttons1::Y, Buttons::Y),
];

/// Report ids on the OUT endpoint.
pub mod out_report_id {
    pub const RUMBLE: u8 = 0x00;
    pub const LED: u8 = 0x01;
}

/// Error type for XInput report decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XInputError {
    /// Fewer bytes than the report layout needs.
    Truncated { expected: usize, actual: usize },
    /// Report id/size pair does not describe an input report.
    UnexpectedReport { id: u8, size: u8 },
    /// Output buffer too small for the encoded report.
    BufferTooSmall,
}

impl core::fmt::Display for XInputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Truncated { expected, actual } => {
                write!(f, "report truncated: need {expected} bytes, got {actual}")
            }
            Self::UnexpectedReport { id, size } => {
                write!(f, "unexpected report id {id:#04x} size {size}")
            }
            Self::BufferTooSmall => write!(f, "output buffer too small"),
        }
    }
}

fn require(bytes: &[u8], expected: usize) -> Result<(), XInputError> {
    if bytes.len() < expected {
        Err(XInputError::Truncated {
            expected,
            actual: bytes.len(),
        })
    } else {
        Ok(())
    }
}

#[inline]
fn read_i16(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline]
fn write_i16(bytes: &mut [u8], offset: usize, value: i16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// Wired input report (device to host).
///
/// Layout: `report_id`, `report_size`, `buttons[2]`, `trigger_l`, `trigger_r`,
/// four little-endian `i16` stick axes, six reserved zero bytes.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InReport {
    pub buttons: [u8; 2],
    pub trigger_l: u8,
    pub trigger_r: u8,
    pub joystick_lx: i16,
    pub joystick_ly: i16,
    pub joystick_rx: i16,
    pub joystick_ry: i16,
}

impl InReport {
    pub const SIZE: usize = 20;
    pub const REPORT_ID: u8 = 0x00;

    // `buttons` through `joystick_ry`.
    const FIELDS_LEN: usize = 12;

    /// Serialize to the 20-byte wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = Self::REPORT_ID;
        out[1] = Self::SIZE as u8;
        self.write_fields(&mut out[2..2 + Self::FIELDS_LEN]);
        out
    }

    /// Parse a wired input report. Extra trailing bytes are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self, XInputError> {
        require(bytes, 2)?;
        let (id, size) = (bytes[0], bytes[1]);
        if id != Self::REPORT_ID || size as usize != Self::SIZE {
            return Err(XInputError::UnexpectedReport { id, size });
        }
        require(bytes, Self::SIZE)?;
        Ok(Self::read_fields(&bytes[2..]))
    }

    fn write_fields(&self, out: &mut [u8]) {
        out[0] = self.buttons[0];
        out[1] = self.buttons[1];
        out[2] = self.trigger_l;
        out[3] = self.trigger_r;
        write_i16(out, 4, self.joystick_lx);
        write_i16(out, 6, self.joystick_ly);
        write_i16(out, 8, self.joystick_rx);
        write_i16(out, 10, self.joystick_ry);
    }

    fn read_fields(b: &[u8]) -> Self {
        Self {
            buttons: [b[0], b[1]],
            trigger_l: b[2],
            trigger_r: b[3],
            joystick_lx: read_i16(b, 4),
            joystick_ly: read_i16(b, 6),
            joystick_rx: read_i16(b, 8),
            joystick_ry: read_i16(b, 10),
        }
    }

    /// Map wire bits to canonical masks. Axes and triggers are copied unscaled.
    #[must_use]
    pub fn to_pad_in(&self) -> PadIn {
        let mut pad = PadIn {
            trigger_l: self.trigger_l,
            trigger_r: self.trigger_r,
            left_stick: AnalogStick::new(self.joystick_lx, self.joystick_ly),
            right_stick: AnalogStick::new(self.joystick_rx, self.joystick_ry),
            ..PadIn::neutral()
        };
        for (bit, dir) in DPAD_TABLE {
            pad.dpad.set(dir, self.buttons[0] & bit != 0);
        }
        for (bit, button) in BUTTONS0_TABLE {
            pad.buttons.set(button, self.buttons[0] & bit != 0);
        }
        for (bit, button) in BUTTONS1_TABLE {
            pad.buttons.set(button, self.buttons[1] & bit != 0);
        }
        pad
    }
}

impl From<&PadIn> for InReport {
    fn from(pad: &PadIn) -> Self {
        let mut buttons = [0u8; 2];
        for (bit, dir) in DPAD_TABLE {
            if pad.dpad.contains(dir) {
                buttons[0] |= bit;
            }
        }
        for (bit, button) in BUTTONS0_TABLE {
            if pad.buttons.contains(button) {
                buttons[0] |= bit;
            }
        }
        for (bit, button) in BUTTONS1_TABLE {
            if pad.buttons.contains(button) {
                buttons[1] |= bit;
            }
        }
        Self {
            buttons,
            trigger_l: pad.trigger_l,
            trigger_r: pad.trigger_r,
            joystick_lx: pad.left_stick.x,
            joystick_ly: pad.left_stick.y,
            joystick_rx: pad.right_stick.x,
            joystick_ry: pad.right_stick.y,
        }
    }
}

/// Wireless receiver report: a 4-byte command prefix, the input report fields,
/// then chatpad status and three chatpad bytes.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InReportWireless {
    pub command: [u8; 4],
    pub report: InReport,
    pub chatpad_status: u8,
    pub chatpad: [u8; 3],
}

impl InReportWireless {
    pub const SIZE: usize = 28;

    const REPORT_OFFSET: usize = 4;
    const CHATPAD_OFFSET: usize = 24;

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(&self.command);
        out[Self::REPORT_OFFSET] = InReport::REPORT_ID;
        out[Self::REPORT_OFFSET + 1] = Self::SIZE as u8;
        self.report
            .write_fields(&mut out[Self::REPORT_OFFSET + 2..Self::REPORT_OFFSET + 14]);
        out[Self::CHATPAD_OFFSET] = self.chatpad_status;
        out[Self::CHATPAD_OFFSET + 1..].copy_from_slice(&self.chatpad);
        out
    }

    /// Parse without checking the embedded report id; receivers vary there.
    pub fn parse(bytes: &[u8]) -> Result<Self, XInputError> {
        require(bytes, Self::SIZE)?;
        let mut command = [0u8; 4];
        command.copy_from_slice(&bytes[..4]);
        let mut chatpad = [0u8; 3];
        chatpad.copy_from_slice(&bytes[Self::CHATPAD_OFFSET + 1..Self::SIZE]);
        Ok(Self {
            command,
            report: InReport::read_fields(&bytes[Self::REPORT_OFFSET + 2..]),
            chatpad_status: bytes[Self::CHATPAD_OFFSET],
            chatpad,
        })
    }
}

/// Chatpad keystroke report sent by wired pads with a chatpad attached.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WiredChatpadReport {
    pub report_id: u8,
    pub chatpad: [u8; 3],
}

impl WiredChatpadReport {
    pub const SIZE: usize = 4;

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        [
            self.report_id,
            self.chatpad[0],
            self.chatpad[1],
            self.chatpad[2],
        ]
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, XInputError> {
        require(bytes, Self::SIZE)?;
        Ok(Self {
            report_id: bytes[0],
            chatpad: [bytes[1], bytes[2], bytes[3]],
        })
    }
}

/// Host to device report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutReport {
    /// Rumble motor strengths, left (low frequency) then right.
    Rumble { left: u8, right: u8 },
    /// LED ring animation index.
    Led(u8),
}

impl OutReport {
    pub const RUMBLE_SIZE: usize = 8;
    pub const LED_SIZE: usize = 3;

    /// Decode a report read from the OUT endpoint.
    ///
    /// Returns `Ok(None)` for report ids this codec does not know.
    pub fn parse(bytes: &[u8]) -> Result<Option<Self>, XInputError> {
        require(bytes, 1)?;
        match bytes[0] {
            out_report_id::RUMBLE => {
                require(bytes, 5)?;
                Ok(Some(Self::Rumble {
                    left: bytes[3],
                    right: bytes[4],
                }))
            }
            out_report_id::LED => {
                require(bytes, Self::LED_SIZE)?;
                Ok(Some(Self::Led(bytes[2])))
            }
            _ => Ok(None),
        }
    }

    /// Encode into `out`, returning the number of bytes written.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, XInputError> {
        let len = match self {
            Self::Rumble { .. } => Self::RUMBLE_SIZE,
            Self::Led(_) => Self::LED_SIZE,
        };
        let out = out.get_mut(..len).ok_or(XInputError::BufferTooSmall)?;
        out.fill(0);
        match *self {
            Self::Rumble { left, right } => {
                out[0] = out_report_id::RUMBLE;
                out[1] = Self::RUMBLE_SIZE as u8;
                out[3] = left;
                out[4] = right;
            }
            Self::Led(pattern) => {
                out[0] = out_report_id::LED;
                out[1] = Self::LED_SIZE as u8;
                out[2] = pattern;
            }
        }
        Ok(len)
    }
}

impl From<PadOut> for OutReport {
    fn from(pad: PadOut) -> Self {
        Self::Rumble {
            left: pad.rumble_l,
            right: pad.rumble_r,
        }
    }
}
