//! Typed GIP payloads.
//!
//! Each type reads and writes its payload (the bytes after the header) at
//! fixed little-endian offsets, and can wrap itself in a single [`GipPacket`].

use gamepad_core::{AnalogStick, Buttons, DPad, PadIn, PadOut};

use super::chunk::GipPacket;
use super::header::GipHeader;
use super::{Command, GipError};

fn require(payload: &[u8], expected: usize) -> Result<(), GipError> {
    if payload.len() < expected {
        Err(GipError::PayloadTooShort {
            expected,
            actual: payload.len(),
        })
    } else {
        Ok(())
    }
}

#[inline]
fn read_u16(b: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([b[offset], b[offset + 1]])
}

#[inline]
fn read_i16(b: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([b[offset], b[offset + 1]])
}

/// Rolling per-direction sequence number. Wraps from 255 to 1; 0 is never
/// handed out.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GipSequence(u8);

impl GipSequence {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Number the next [`advance`](Self::advance) will return.
    #[must_use]
    pub const fn peek(self) -> u8 {
        if self.0 == u8::MAX {
            1
        } else {
            self.0 + 1
        }
    }

    /// Step and return the next sequence number.
    pub fn advance(&mut self) -> u8 {
        self.0 = self.peek();
        self.0
    }

    /// Last number handed out, 0 if none yet.
    #[must_use]
    pub const fn current(self) -> u8 {
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Input report button bits.
pub mod buttons {
    pub const A: u16 = 0x0001;
    pub const B: u16 = 0x0002;
    pub const X: u16 = 0x0004;
    pub const Y: u16 = 0x0008;
    pub const LEFT_SHOULDER: u16 = 0x0010;
    pub const RIGHT_SHOULDER: u16 = 0x0020;
    pub const LEFT_TRIGGER: u16 = 0x0040;
    pub const RIGHT_TRIGGER: u16 = 0x0080;
    pub const VIEW: u16 = 0x0100;
    pub const MENU: u16 = 0x0200;
    pub const LEFT_THUMB: u16 = 0x0400;
    pub const RIGHT_THUMB: u16 = 0x0800;
    pub const DPAD_UP: u16 = 0x1000;
    pub const DPAD_DOWN: u16 = 0x2000;
    pub const DPAD_LEFT: u16 = 0x4000;
    pub const DPAD_RIGHT: u16 = 0x8000;
}

const BUTTON_TABLE: [(u16, Buttons); 10] = [
    (buttons::A, Buttons::A),
    (buttons::B, Buttons::B),
    (buttons::X, Buttons::X),
    (buttons::Y, Buttons::Y),
    (buttons::LEFT_SHOULDER, Buttons::LB),
    (buttons::RIGHT_SHOULDER, Buttons::RB),
    (buttons::VIEW, Buttons::BACK),
    (buttons::MENU, Buttons::START),
    (buttons::LEFT_THUMB, Buttons::L3),
    (buttons::RIGHT_THUMB, Buttons::R3),
];

const DPAD_TABLE: [(u16, DPad); 4] = [
    (buttons::DPAD_UP, DPad::UP),
    (buttons::DPAD_DOWN, DPad::DOWN),
    (buttons::DPAD_LEFT, DPad::LEFT),
    (buttons::DPAD_RIGHT, DPad::RIGHT),
];

/// Mask of the significant trigger bits.
pub const TRIGGER_MAX: u16 = 0x03FF;

/// Reduce a 10-bit trigger to a byte.
#[inline]
#[must_use]
pub const fn trigger_to_u8(raw: u16) -> u8 {
    ((raw & TRIGGER_MAX) >> 2) as u8
}

/// Expand a byte trigger to 10 bits, mapping 255 to 1023.
#[inline]
#[must_use]
pub const fn trigger_from_u8(value: u8) -> u16 {
    let v = value as u16;
    (v << 2) | (v >> 6)
}

/// Gamepad state carried by the input message (`0x20`).
///
/// The guide button has no bit in the mask. It is the byte after the sticks,
/// and is also announced separately with [`VirtualKey`].
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GipInput {
    pub buttons: u16,
    /// 0..=1023, upper six bits ignored.
    pub trigger_l: u16,
    pub trigger_r: u16,
    pub joystick_lx: i16,
    pub joystick_ly: i16,
    pub joystick_rx: i16,
    pub joystick_ry: i16,
    pub guide_pressed: bool,
}

impl GipInput {
    /// Bytes of button and axis data at the start of the payload.
    pub const DATA_LEN: usize = 14;
    /// Payload offset of the guide byte.
    pub const GUIDE_OFFSET: usize = 14;
    /// Payload length of the input packet on the wire (`0x2C`).
    pub const PAYLOAD_LEN: usize = 44;
    /// Full input packet size including the header.
    pub const REPORT_SIZE: usize = 48;

    pub fn parse(payload: &[u8]) -> Result<Self, GipError> {
        require(payload, Self::DATA_LEN)?;
        Ok(Self {
            buttons: read_u16(payload, 0),
            trigger_l: read_u16(payload, 2) & TRIGGER_MAX,
            trigger_r: read_u16(payload, 4) & TRIGGER_MAX,
            joystick_lx: read_i16(payload, 6),
            joystick_ly: read_i16(payload, 8),
            joystick_rx: read_i16(payload, 10),
            joystick_ry: read_i16(payload, 12),
            guide_pressed: payload.get(Self::GUIDE_OFFSET).is_some_and(|&b| b != 0),
        })
    }

    /// Full 44-byte payload, data first and zero padded.
    #[must_use]
    pub fn payload(&self) -> [u8; Self::PAYLOAD_LEN] {
        let mut out = [0u8; Self::PAYLOAD_LEN];
        let fields = [
            self.buttons.to_le_bytes(),
            (self.trigger_l & TRIGGER_MAX).to_le_bytes(),
            (self.trigger_r & TRIGGER_MAX).to_le_bytes(),
            self.joystick_lx.to_le_bytes(),
            self.joystick_ly.to_le_bytes(),
            self.joystick_rx.to_le_bytes(),
            self.joystick_ry.to_le_bytes(),
        ];
        for (chunk, field) in out.chunks_exact_mut(2).zip(fields) {
            chunk.copy_from_slice(&field);
        }
        out[Self::GUIDE_OFFSET] = u8::from(self.guide_pressed);
        out
    }

    /// Wrap in the 48-byte input packet `20 00 seq 2C`.
    #[must_use]
    pub fn to_packet(&self, sequence: u8) -> GipPacket {
        let header = GipHeader::new(Command::Input).with_sequence(sequence);
        GipPacket::fixed(header, &self.payload())
    }

    /// Trigger button bits follow the analog values.
    #[must_use]
    pub fn from_pad_in(pad: &PadIn) -> Self {
        let mut bits = 0u16;
        for (bit, button) in BUTTON_TABLE {
            if pad.buttons.contains(button) {
                bits |= bit;
            }
        }
        for (bit, dir) in DPAD_TABLE {
            if pad.dpad.contains(dir) {
                bits |= bit;
            }
        }
        if pad.trigger_l != 0 {
            bits |= buttons::LEFT_TRIGGER;
        }
        if pad.trigger_r != 0 {
            bits |= buttons::RIGHT_TRIGGER;
        }
        Self {
            buttons: bits,
            trigger_l: trigger_from_u8(pad.trigger_l),
            trigger_r: trigger_from_u8(pad.trigger_r),
            joystick_lx: pad.left_stick.x,
            joystick_ly: pad.left_stick.y,
            joystick_rx: pad.right_stick.x,
            joystick_ry: pad.right_stick.y,
            guide_pressed: pad.buttons.contains(Buttons::SYS),
        }
    }

    /// Canonical button masks. [`Buttons::SYS`] is set from `guide` or the
    /// report's own guide byte.
    #[must_use]
    pub fn buttons_to_canonical(&self, guide: bool) -> (Buttons, DPad) {
        let mut out = Buttons::NONE;
        let mut dpad = DPad::NONE;
        for (bit, button) in BUTTON_TABLE {
            out.set(button, self.buttons & bit != 0);
        }
        for (bit, dir) in DPAD_TABLE {
            dpad.set(dir, self.buttons & bit != 0);
        }
        out.set(Buttons::SYS, guide || self.guide_pressed);
        (out, dpad)
    }

    /// Unscaled conversion to canonical state.
    #[must_use]
    pub fn to_pad_in(&self, guide: bool) -> PadIn {
        let (buttons, dpad) = self.buttons_to_canonical(guide);
        PadIn {
            dpad,
            buttons,
            trigger_l: trigger_to_u8(self.trigger_l),
            trigger_r: trigger_to_u8(self.trigger_r),
            left_stick: AnalogStick::new(self.joystick_lx, self.joystick_ly),
            right_stick: AnalogStick::new(self.joystick_rx, self.joystick_ry),
        }
    }
}

/// Guide button press/release (`0x07`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VirtualKey {
    pub pressed: bool,
}

impl VirtualKey {
    pub const KEY_GUIDE: u8 = 0x5B;
    pub const PAYLOAD_LEN: usize = 2;

    pub fn parse(payload: &[u8]) -> Result<Self, GipError> {
        require(payload, 1)?;
        Ok(Self {
            pressed: payload[0] & 0x01 != 0,
        })
    }

    #[must_use]
    pub fn payload(&self) -> [u8; Self::PAYLOAD_LEN] {
        [u8::from(self.pressed), Self::KEY_GUIDE]
    }

    #[must_use]
    pub fn to_packet(&self, sequence: u8) -> GipPacket {
        let header = GipHeader::new(Command::VirtualKey)
            .with_internal(true)
            .with_sequence(sequence);
        GipPacket::fixed(header, &self.payload())
    }
}

/// Force feedback actuator selection bits.
pub mod ff_flags {
    pub const RIGHT_MOTOR: u8 = 0x01;
    pub const LEFT_MOTOR: u8 = 0x02;
    pub const RIGHT_TRIGGER: u8 = 0x04;
    pub const LEFT_TRIGGER: u8 = 0x08;
}

/// Rumble command (`0x09`, set-device-state).
///
/// Only actuators whose flag bit is set are driven; the matching strength
/// bytes of the others are sent as zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ForceFeedback {
    pub flags: u8,
    pub trigger_l: u8,
    pub trigger_r: u8,
    pub motor_l: u8,
    pub motor_r: u8,
    /// In 10 ms units.
    pub duration: u8,
    pub delay: u8,
    pub repeat: u8,
}

impl Default for ForceFeedback {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ForceFeedback {
    pub const PAYLOAD_LEN: usize = 9;
    pub const DEFAULT_DURATION: u8 = 0xFF;
    pub const DEFAULT_DELAY: u8 = 0x00;
    pub const DEFAULT_REPEAT: u8 = 0xFF;

    /// Start a command with no actuators selected.
    #[must_use]
    pub const fn builder() -> ForceFeedbackBuilder {
        ForceFeedbackBuilder {
            ff: Self {
                flags: 0,
                trigger_l: 0,
                trigger_r: 0,
                motor_l: 0,
                motor_r: 0,
                duration: Self::DEFAULT_DURATION,
                delay: Self::DEFAULT_DELAY,
                repeat: Self::DEFAULT_REPEAT,
            },
        }
    }

    /// Drive both main motors from a canonical feedback state.
    #[must_use]
    pub fn from_pad_out(pad: PadOut) -> Self {
        Self::builder()
            .left_motor(pad.rumble_l)
            .right_motor(pad.rumble_r)
            .build()
    }

    pub fn parse(payload: &[u8]) -> Result<Self, GipError> {
        require(payload, Self::PAYLOAD_LEN)?;
        Ok(Self {
            flags: payload[1],
            trigger_l: payload[2],
            trigger_r: payload[3],
            motor_l: payload[4],
            motor_r: payload[5],
            duration: payload[6],
            delay: payload[7],
            repeat: payload[8],
        })
    }

    #[must_use]
    pub fn payload(&self) -> [u8; Self::PAYLOAD_LEN] {
        let pick = |flag: u8, value: u8| if self.flags & flag != 0 { value } else { 0 };
        [
            0x00,
            self.flags,
            pick(ff_flags::LEFT_TRIGGER, self.trigger_l),
            pick(ff_flags::RIGHT_TRIGGER, self.trigger_r),
            pick(ff_flags::LEFT_MOTOR, self.motor_l),
            pick(ff_flags::RIGHT_MOTOR, self.motor_r),
            self.duration,
            self.delay,
            self.repeat,
        ]
    }

    /// Wrap in the 13-byte packet `09 00 seq 09`.
    #[must_use]
    pub fn to_packet(&self, sequence: u8) -> GipPacket {
        let header = GipHeader::new(Command::SetDeviceState).with_sequence(sequence);
        GipPacket::fixed(header, &self.payload())
    }

    /// Main motor strengths, zero for motors not selected.
    #[must_use]
    pub fn to_pad_out(&self) -> PadOut {
        PadOut {
            rumble_l: if self.flags & ff_flags::LEFT_MOTOR != 0 {
                self.motor_l
            } else {
                0
            },
            rumble_r: if self.flags & ff_flags::RIGHT_MOTOR != 0 {
                self.motor_r
            } else {
                0
            },
        }
    }
}

/// Fluent builder for [`ForceFeedback`].
///
/// ```
/// use xbox_proto::gip::message::{ff_flags, ForceFeedback};
///
/// let ff = ForceFeedback::builder().left_motor(0x80).build();
/// assert_eq!(ff.flags, ff_flags::LEFT_MOTOR);
/// assert_eq!(ff.payload(), [0x00, 0x02, 0, 0, 0x80, 0, 0xFF, 0x00, 0xFF]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ForceFeedbackBuilder {
    ff: ForceFeedback,
}

impl ForceFeedbackBuilder {
    #[must_use]
    pub const fn left_motor(mut self, value: u8) -> Self {
        self.ff.motor_l = value;
        self.ff.flags |= ff_flags::LEFT_MOTOR;
        self
    }

    #[must_use]
    pub const fn right_motor(mut self, value: u8) -> Self {
        self.ff.motor_r = value;
        self.ff.flags |= ff_flags::RIGHT_MOTOR;
        self
    }

    #[must_use]
    pub const fn left_trigger(mut self, value: u8) -> Self {
        self.ff.trigger_l = value;
        self.ff.flags |= ff_flags::LEFT_TRIGGER;
        self
    }

    #[must_use]
    pub const fn right_trigger(mut self, value: u8) -> Self {
        self.ff.trigger_r = value;
        self.ff.flags |= ff_flags::RIGHT_TRIGGER;
        self
    }

    #[must_use]
    pub const fn duration(mut self, value: u8) -> Self {
        self.ff.duration = value;
        self
    }

    #[must_use]
    pub const fn delay(mut self, value: u8) -> Self {
        self.ff.delay = value;
        self
    }

    #[must_use]
    pub const fn repeat(mut self, value: u8) -> Self {
        self.ff.repeat = value;
        self
    }

    #[must_use]
    pub const fn build(self) -> ForceFeedback {
        self.ff
    }
}

/// Firmware version announced on arrival.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

/// Device arrival announcement (`0x02`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceArrival {
    pub device_id: u64,
    pub vendor_id: u16,
    pub product_id: u16,
    pub firmware: FirmwareVersion,
}

impl DeviceArrival {
    /// 20 bytes of fields plus 8 reserved.
    pub const PAYLOAD_LEN: usize = 28;

    pub fn parse(payload: &[u8]) -> Result<Self, GipError> {
        require(payload, 20)?;
        let mut id = [0u8; 8];
        id.copy_from_slice(&payload[..8]);
        Ok(Self {
            device_id: u64::from_le_bytes(id),
            vendor_id: read_u16(payload, 8),
            product_id: read_u16(payload, 10),
            firmware: FirmwareVersion {
                major: read_u16(payload, 12),
                minor: read_u16(payload, 14),
                build: read_u16(payload, 16),
                revision: read_u16(payload, 18),
            },
        })
    }

    #[must_use]
    pub fn payload(&self) -> [u8; Self::PAYLOAD_LEN] {
        let mut out = [0u8; Self::PAYLOAD_LEN];
        out[..8].copy_from_slice(&self.device_id.to_le_bytes());
        let words = [
            self.vendor_id,
            self.product_id,
            self.firmware.major,
            self.firmware.minor,
            self.firmware.build,
            self.firmware.revision,
        ];
        for (chunk, word) in out[8..20].chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    #[must_use]
    pub fn to_packet(&self, sequence: u8) -> GipPacket {
        let header = GipHeader::new(Command::DeviceArrival)
            .with_internal(true)
            .with_sequence(sequence);
        GipPacket::fixed(header, &self.payload())
    }
}

/// Battery charge, two bits.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryLevel {
    Low,
    Medium,
    High,
    #[default]
    Full,
}

impl BatteryLevel {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Low,
            1 => Self::Medium,
            2 => Self::High,
            _ => Self::Full,
        }
    }

    const fn bits(self) -> u8 {
        self as u8
    }
}

/// Power source, two bits. Value 3 is not assigned.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryType {
    #[default]
    Wired,
    Standard,
    ChargeKit,
    Unknown,
}

impl BatteryType {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Wired,
            1 => Self::Standard,
            2 => Self::ChargeKit,
            _ => Self::Unknown,
        }
    }

    const fn bits(self) -> u8 {
        self as u8
    }
}

/// Device status (`0x03`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus {
    pub battery_level: BatteryLevel,
    pub battery_type: BatteryType,
    pub connected: bool,
}

impl DeviceStatus {
    pub const PAYLOAD_LEN: usize = 4;
    const CONNECTED: u8 = 1 << 7;

    pub fn parse(payload: &[u8]) -> Result<Self, GipError> {
        require(payload, 1)?;
        let b = payload[0];
        Ok(Self {
            battery_level: BatteryLevel::from_bits(b),
            battery_type: BatteryType::from_bits(b >> 2),
            connected: b & Self::CONNECTED != 0,
        })
    }

    #[must_use]
    pub fn payload(&self) -> [u8; Self::PAYLOAD_LEN] {
        let mut b = self.battery_level.bits() | (self.battery_type.bits() << 2);
        if self.connected {
            b |= Self::CONNECTED;
        }
        [b, 0, 0, 0]
    }

    #[must_use]
    pub fn to_packet(&self, sequence: u8) -> GipPacket {
        let header = GipHeader::new(Command::DeviceStatus)
            .with_internal(true)
            .with_sequence(sequence);
        GipPacket::fixed(header, &self.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_skips_zero() {
        let mut seq = GipSequence::new();
        assert_eq!(seq.advance(), 1);
        for _ in 0..253 {
            seq.advance();
        }
        assert_eq!(seq.current(), 254);
        assert_eq!(seq.advance(), 255);
        assert_eq!(seq.peek(), 1);
        assert_eq!(seq.advance(), 1);
    }

    #[test]
    fn test_dpad_up_only() {
        let mut payload = [0u8; GipInput::DATA_LEN];
        payload[..2].copy_from_slice(&0x1000u16.to_le_bytes());
        let pad = GipInput::parse(&payload).unwrap().to_pad_in(false);
        assert_eq!(pad.dpad, DPad::UP);
        assert_eq!(pad.buttons, Buttons::NONE);
    }

    #[test]
    fn test_trigger_scaling() {
        assert_eq!(trigger_from_u8(0), 0);
        assert_eq!(trigger_from_u8(255), 1023);
        assert_eq!(trigger_from_u8(128), 514);
        assert_eq!(trigger_to_u8(1023), 255);
        assert_eq!(trigger_to_u8(0xFC00), 0);
        for v in 0..=255u8 {
            assert_eq!(trigger_to_u8(trigger_from_u8(v)), v);
        }
    }

    #[test]
    fn test_input_packet_layout() {
        let pad = PadIn {
            buttons: Buttons::A | Buttons::START,
            dpad: DPad::RIGHT,
            trigger_l: 255,
            trigger_r: 0,
            left_stick: AnalogStick::new(-1, 2),
            right_stick: AnalogStick::new(i16::MIN, i16::MAX),
        };
        let packet = GipInput::from_pad_in(&pad).to_packet(5);
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), GipInput::REPORT_SIZE);
        assert_eq!(&bytes[..4], &[0x20, 0x00, 0x05, 0x2C]);
        let bits = buttons::A | buttons::MENU | buttons::DPAD_RIGHT | buttons::LEFT_TRIGGER;
        assert_eq!(&bytes[4..6], &bits.to_le_bytes());
        assert_eq!(&bytes[6..8], &[0xFF, 0x03]);
        assert_eq!(&bytes[8..10], &[0x00, 0x00]);
        assert_eq!(&bytes[10..12], &[0xFF, 0xFF]);
        assert_eq!(&bytes[16..18], &[0xFF, 0x7F]);
        assert!(bytes[18..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_input_ignores_trigger_bits_and_maps_guide() {
        let input = GipInput {
            buttons: buttons::LEFT_TRIGGER | buttons::RIGHT_TRIGGER | buttons::VIEW,
            ..GipInput::default()
        };
        let pad = input.to_pad_in(true);
        assert_eq!(pad.buttons, Buttons::BACK | Buttons::SYS);
    }

    #[test]
    fn test_guide_byte() {
        let pad = PadIn {
            buttons: Buttons::Y | Buttons::SYS,
            ..PadIn::neutral()
        };
        let packet = GipInput::from_pad_in(&pad).to_packet(1);
        assert_eq!(packet.as_bytes()[18], 0x01);

        let input = GipInput::parse(&packet[4..]).unwrap();
        assert!(input.guide_pressed);
        assert_eq!(input.to_pad_in(false).buttons, Buttons::Y | Buttons::SYS);

        // Payloads that stop after the sticks have no guide byte.
        let short = GipInput::parse(&packet[4..4 + GipInput::DATA_LEN]).unwrap();
        assert!(!short.guide_pressed);
    }

    #[test]
    fn test_parse_masks_trigger_high_bits() {
        let mut payload = [0u8; GipInput::PAYLOAD_LEN];
        payload[2..4].copy_from_slice(&0xFD00u16.to_le_bytes());
        payload[4..6].copy_from_slice(&0xFC01u16.to_le_bytes());
        let input = GipInput::parse(&payload).unwrap();
        assert_eq!(input.trigger_l, 0x0100);
        assert_eq!(input.trigger_r, 0x0001);
    }

    #[test]
    fn test_parse_short_input() {
        assert_eq!(
            GipInput::parse(&[0u8; 10]),
            Err(GipError::PayloadTooShort {
                expected: 14,
                actual: 10
            })
        );
    }

    #[test]
    fn test_virtual_key() {
        let packet = VirtualKey { pressed: true }.to_packet(3);
        assert_eq!(packet.as_bytes(), &[0x07, 0x20, 0x03, 0x02, 0x01, 0x5B]);
        assert_eq!(VirtualKey::parse(&[0x00, 0x5B]), Ok(VirtualKey { pressed: false }));
        assert!(VirtualKey::parse(&[]).is_err());
    }

    #[test]
    fn test_force_feedback_selective_flags() {
        let ff = ForceFeedback::builder()
            .right_motor(0x40)
            .right_trigger(0x10)
            .build();
        assert_eq!(ff.flags, ff_flags::RIGHT_MOTOR | ff_flags::RIGHT_TRIGGER);
        assert_eq!(
            ff.to_packet(9).as_bytes(),
            &[0x09, 0x00, 0x09, 0x09, 0x00, 0x05, 0x00, 0x10, 0x00, 0x40, 0xFF, 0x00, 0xFF]
        );
    }

    #[test]
    fn test_force_feedback_unselected_bytes_are_zero() {
        let ff = ForceFeedback {
            flags: ff_flags::LEFT_MOTOR,
            motor_r: 0x77,
            motor_l: 0x22,
            ..ForceFeedback::default()
        };
        assert_eq!(ff.payload()[5], 0);
        assert_eq!(ff.to_pad_out(), PadOut::new(0x22, 0));
    }

    #[test]
    fn test_force_feedback_pad_out_round_trip() {
        let ff = ForceFeedback::from_pad_out(PadOut::new(10, 200));
        assert_eq!(ff.flags, ff_flags::LEFT_MOTOR | ff_flags::RIGHT_MOTOR);
        let parsed = ForceFeedback::parse(&ff.payload()).unwrap();
        assert_eq!(parsed, ff);
        assert_eq!(parsed.to_pad_out(), PadOut::new(10, 200));
    }

    #[test]
    fn test_arrival_layout() {
        let arrival = DeviceArrival {
            device_id: 0x0102_0304_0506_0708,
            vendor_id: 0x045E,
            product_id: 0x02D1,
            firmware: FirmwareVersion {
                major: 5,
                minor: 1,
                build: 0x1234,
                revision: 0,
            },
        };
        let packet = arrival.to_packet(1);
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..4], &[0x02, 0x20, 0x01, 0x1C]);
        assert_eq!(&bytes[4..12], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[12..16], &[0x5E, 0x04, 0xD1, 0x02]);
        assert_eq!(DeviceArrival::parse(&bytes[4..]), Ok(arrival));
    }

    #[test]
    fn test_status_bits() {
        let status = DeviceStatus::parse(&[0x86, 0, 0, 0]).unwrap();
        assert_eq!(status.battery_level, BatteryLevel::High);
        assert_eq!(status.battery_type, BatteryType::Standard);
        assert!(status.connected);
        assert_eq!(status.payload(), [0x86, 0, 0, 0]);
        assert_eq!(
            DeviceStatus::default().to_packet(2).as_bytes(),
            &[0x03, 0x20, 0x02, 0x04, 0x03, 0, 0, 0]
        );
    }
}
