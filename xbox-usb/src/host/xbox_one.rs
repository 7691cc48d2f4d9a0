use gamepad_core::{GamepadPort, PadIn};
use xbox_proto::gip::{
    self, Command, DeviceArrival, DeviceStatus, ForceFeedback, GipError, GipEvent, GipInput,
    GipMessage, GipReassembler, GipSequence, VirtualKey, MAX_MESSAGE_SIZE,
};
use xbox_proto::EndpointAddress;

use super::{scale_pad, HostConfig, HostDriver};
use crate::class::{OpenError, XboxClass};
use crate::device::BridgeError;
use crate::scheduler::{Completion, Role};
use crate::transport::{TransferError, TransferResult, UsbTransport};

/// Owned result of decoding one complete message.
enum Inbound {
    Input(GipInput),
    Guide(bool),
    Status(DeviceStatus),
    Arrival(DeviceArrival),
    Other(Command),
}

impl Inbound {
    fn decode(msg: &GipMessage<'_>) -> Result<Self, GipError> {
        Ok(match msg.command {
            Command::Input => Self::Input(GipInput::parse(msg.payload)?),
            Command::VirtualKey => Self::Guide(VirtualKey::parse(msg.payload)?.pressed),
            Command::DeviceStatus => Self::Status(DeviceStatus::parse(msg.payload)?),
            Command::DeviceArrival => Self::Arrival(DeviceArrival::parse(msg.payload)?),
            other => Self::Other(other),
        })
    }
}

/// Xbox One controller attached to our host port.
#[derive(Debug)]
pub struct XboxOneHost<const N: usize = MAX_MESSAGE_SIZE> {
    class: XboxClass<{ gip::ENDPOINT_SIZE }>,
    config: HostConfig,
    reassembler: GipReassembler<N>,
    sequence: GipSequence,
    guide: bool,
    /// Last input report, replayed when only the guide state changes.
    last_input: Option<GipInput>,
    /// Decoded state of the last push, before scaling.
    last: Option<PadIn>,
    status: Option<DeviceStatus>,
    arrival: Option<DeviceArrival>,
}

impl<const N: usize> Default for XboxOneHost<N> {
    fn default() -> Self {
        Self::new(HostConfig::DEFAULT)
    }
}

impl<const N: usize> XboxOneHost<N> {
    #[must_use]
    pub const fn new(config: HostConfig) -> Self {
        Self {
            class: XboxClass::new(gip::INTERFACE_CLASS, Role::Host),
            config,
            reassembler: GipReassembler::new(),
            sequence: GipSequence::new(),
            guide: false,
            last_input: None,
            last: None,
            status: None,
            arrival: None,
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.class.is_open()
    }

    /// Guide state from the last virtual-key message.
    #[must_use]
    pub fn guide(&self) -> bool {
        self.guide
    }

    /// Last battery report.
    #[must_use]
    pub fn status(&self) -> Option<DeviceStatus> {
        self.status
    }

    #[must_use]
    pub fn arrival(&self) -> Option<DeviceArrival> {
        self.arrival
    }

    fn clear_session(&mut self) {
        self.reassembler.reset();
        self.sequence.reset();
        self.guide = false;
        self.last_input = None;
        self.last = None;
        self.status = None;
        self.arrival = None;
    }

    fn handle<G: GamepadPort>(&mut self, gamepad: &mut G, report: &[u8]) -> Result<bool, GipError> {
        let inbound = match self.reassembler.feed(report)? {
            GipEvent::Message(msg) => Inbound::decode(&msg)?,
            GipEvent::Pending => return Ok(false),
            GipEvent::Unhandled(code) => {
                trace!("unhandled command {:#x}", code);
                return Ok(false);
            }
        };

        match inbound {
            Inbound::Input(input) => Ok(self.push(gamepad, input, self.guide)),
            Inbound::Guide(pressed) => {
                self.guide = pressed;
                Ok(match self.last_input {
                    Some(input) => self.push(gamepad, input, pressed),
                    None => false,
                })
            }
            Inbound::Status(status) => {
                if self.status != Some(status) {
                    debug!("battery {:?} {:?}", status.battery_type, status.battery_level);
                }
                self.status = Some(status);
                Ok(false)
            }
            Inbound::Arrival(arrival) => {
                info!(
                    "controller {:#x}:{:#x} arrived",
                    arrival.vendor_id, arrival.product_id
                );
                self.arrival = Some(arrival);
                Ok(false)
            }
            Inbound::Other(command) => {
                trace!("ignored command {:?}", command);
                Ok(false)
            }
        }
    }

    /// Push unless the decoded state matches the last push. Guide is held if
    /// either the virtual key or the report's guide byte says so.
    fn push<G: GamepadPort>(&mut self, gamepad: &mut G, input: GipInput, guide: bool) -> bool {
        self.last_input = Some(input);
        let decoded = input.to_pad_in(guide);
        if self.last == Some(decoded) {
            return false;
        }
        let pad = scale_pad(gamepad, decoded, self.config);
        gamepad.set_pad_in(pad);
        self.last = Some(decoded);
        true
    }

    fn rearm<T: UsbTransport>(&mut self, transport: &mut T) {
        let scheduler = self.class.scheduler_mut();
        if scheduler.rx_busy() {
            return;
        }
        if let Err(e) = scheduler.arm_receive(transport) {
            warn!("receive not re-armed: {}", e);
        }
    }
}

impl<T: UsbTransport, const N: usize> HostDriver<T> for XboxOneHost<N> {
    type Error = GipError;

    fn mount(
        &mut self,
        transport: &mut T,
        descriptors: &[u8],
        max_len: u16,
    ) -> Result<u16, OpenError> {
        self.class.init();
        self.clear_session();
        self.class.open(transport, descriptors, max_len)
    }

    fn unmount(&mut self) {
        self.class.deinit();
        self.clear_session();
    }

    fn initialize(&mut self, transport: &mut T) -> Result<(), TransferError> {
        self.class.scheduler_mut().arm_receive(transport)
    }

    fn process_report<G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &mut G,
        report: &[u8],
    ) -> Result<bool, GipError> {
        let result = self.handle(gamepad, report);
        self.rearm(transport);
        result
    }

    fn transfer_complete<G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &mut G,
        ep: EndpointAddress,
        result: TransferResult,
        data: &[u8],
    ) -> bool {
        let completion = self
            .class
            .scheduler_mut()
            .on_transfer_complete(transport, ep, result, data);
        match completion {
            Some(Completion::Received) => {
                if result == TransferResult::Success {
                    if let Err(e) = self.process_report(transport, gamepad, data) {
                        warn!("report dropped: {}", e);
                    }
                }
                true
            }
            Some(Completion::Sent) => true,
            None => false,
        }
    }

    fn send_feedback<G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &G,
    ) -> Result<(), BridgeError> {
        let packet = ForceFeedback::from_pad_out(gamepad.pad_out()).to_packet(self.sequence.peek());
        match self.class.scheduler_mut().send(transport, &packet) {
            Ok(_) => {
                self.sequence.advance();
                Ok(())
            }
            Err(e) => {
                trace!("feedback skipped: {}", e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use gamepad_core::{AnalogStick, Buttons, DPad, PadIn, PadOut};
    use xbox_proto::gip::{BatteryLevel, BatteryType, GipHeader, GipPacket};

    use super::*;
    use crate::mock::{MockGamepad, MockTransport};

    const GIP_INTERFACE: [u8; 23] = [
        0x09, 0x04, 0x00, 0x00, 0x02, 0xFF, 0x47, 0xD0, 0x00, //
        0x07, 0x05, 0x02, 0x03, 0x40, 0x00, 0x04, //
        0x07, 0x05, 0x82, 0x03, 0x40, 0x00, 0x04,
    ];
    const IN_EP: EndpointAddress = EndpointAddress(0x82);

    fn mounted(t: &mut MockTransport) -> XboxOneHost {
        let mut host = XboxOneHost::default();
        assert_eq!(host.mount(t, &GIP_INTERFACE, 512), Ok(23));
        host.initialize(t).unwrap();
        host
    }

    fn input(buttons: u16, ly: i16, seq: u8) -> GipPacket {
        GipInput {
            buttons,
            joystick_ly: ly,
            ..GipInput::default()
        }
        .to_packet(seq)
    }

    #[test]
    fn test_initialize_arms_in_endpoint() {
        let mut t = MockTransport::new();
        let host = mounted(&mut t);
        assert!(host.is_mounted());
        assert_eq!(t.reads, std::vec![(0x82, 64)]);
    }

    #[test]
    fn test_identical_reports_push_once() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();

        assert_eq!(host.process_report(&mut t, &mut pad, &input(0x0001, 0, 1)), Ok(true));
        // Same fields, new sequence number.
        assert_eq!(host.process_report(&mut t, &mut pad, &input(0x0001, 0, 2)), Ok(false));
        assert_eq!(pad.pushed.len(), 1);

        assert_eq!(host.process_report(&mut t, &mut pad, &input(0x0003, 0, 3)), Ok(true));
        assert_eq!(pad.pushed.len(), 2);
        assert_eq!(pad.pushed[1].buttons, Buttons::A | Buttons::B);
    }

    #[test]
    fn test_dpad_up_literal() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        host.process_report(&mut t, &mut pad, &input(0x1000, 0, 1)).unwrap();
        assert_eq!(pad.pushed[0].dpad, DPad::UP);
        assert_eq!(pad.pushed[0].buttons, Buttons::NONE);
    }

    #[test]
    fn test_scaling_goes_through_gamepad() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        let packet = GipInput {
            trigger_l: 0x3FF,
            trigger_r: 0x200,
            joystick_lx: 300,
            joystick_ly: 1000,
            joystick_ry: -20,
            ..GipInput::default()
        }
        .to_packet(1);
        host.process_report(&mut t, &mut pad, &packet).unwrap();

        let pushed: PadIn = pad.pushed[0];
        // 10-bit >> 2, then halved by the mock scaler
        assert_eq!(pushed.trigger_l, 0xFF / 2);
        assert_eq!(pushed.trigger_r, 0x80 / 2);
        assert_eq!(pushed.left_stick, AnalogStick::new(300, -1000));
        assert_eq!(pushed.right_stick, AnalogStick::new(0, 20));
    }

    #[test]
    fn test_guide_from_virtual_key() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();

        host.process_report(&mut t, &mut pad, &input(0x0004, 0, 1)).unwrap();
        let press = VirtualKey { pressed: true }.to_packet(2);
        assert_eq!(host.process_report(&mut t, &mut pad, &press), Ok(true));
        assert!(host.guide());
        assert_eq!(pad.pushed[1].buttons, Buttons::X | Buttons::SYS);

        // Input while guide held keeps SYS; an identical one is suppressed.
        assert_eq!(host.process_report(&mut t, &mut pad, &input(0x0004, 0, 3)), Ok(false));
        let release = VirtualKey { pressed: false }.to_packet(4);
        host.process_report(&mut t, &mut pad, &release).unwrap();
        assert_eq!(pad.pushed.len(), 3);
        assert_eq!(pad.pushed[2].buttons, Buttons::X);
    }

    #[test]
    fn test_guide_byte_in_input_report() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();

        let mut packet = input(0x0008, 0, 1).as_bytes().to_vec();
        packet[18] = 0x01;
        assert_eq!(host.process_report(&mut t, &mut pad, &packet), Ok(true));
        assert!(!host.guide());
        assert_eq!(pad.pushed[0].buttons, Buttons::Y | Buttons::SYS);

        // Released in the report itself.
        assert_eq!(host.process_report(&mut t, &mut pad, &input(0x0008, 0, 2)), Ok(true));
        assert_eq!(pad.pushed[1].buttons, Buttons::Y);
    }

    #[test]
    fn test_ignored_bits_do_not_defeat_dedupe() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        let first = GipInput {
            buttons: 0x0001 | 0x0040,
            trigger_l: 0x100,
            ..GipInput::default()
        }
        .to_packet(1);
        assert_eq!(host.process_report(&mut t, &mut pad, &first), Ok(true));

        // Upper trigger bits set and the LT button bit cleared: same state.
        let mut noisy = GipInput {
            buttons: 0x0001,
            trigger_l: 0x100,
            ..GipInput::default()
        }
        .to_packet(2)
        .as_bytes()
        .to_vec();
        noisy[7] |= 0xFC;
        assert_eq!(host.process_report(&mut t, &mut pad, &noisy), Ok(false));
        assert_eq!(pad.pushed.len(), 1);
    }

    #[test]
    fn test_status_and_arrival_recorded() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();

        let status = DeviceStatus {
            battery_level: BatteryLevel::High,
            battery_type: BatteryType::Standard,
            connected: true,
        };
        host.process_report(&mut t, &mut pad, &status.to_packet(1)).unwrap();
        assert_eq!(host.status(), Some(status));

        let arrival = DeviceArrival {
            vendor_id: 0x045E,
            product_id: 0x02EA,
            ..DeviceArrival::default()
        };
        host.process_report(&mut t, &mut pad, &arrival.to_packet(2)).unwrap();
        assert_eq!(host.arrival().map(|a| a.product_id), Some(0x02EA));
        assert!(pad.pushed.is_empty());
    }

    #[test]
    fn test_errors_do_not_stall_receive() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();

        // completion re-arms once, process_report does not arm twice
        assert!(host.transfer_complete(&mut t, &mut pad, IN_EP, TransferResult::Success, &[0x20, 0x00]));
        assert_eq!(t.reads.len(), 2);

        // truncated input
        let short = [0x20, 0x00, 0x01, 0x02, 0x00, 0x00];
        assert!(host.process_report(&mut t, &mut pad, &short).is_err());
        assert!(pad.pushed.is_empty());
    }

    #[test]
    fn test_rearms_when_idle() {
        let mut t = MockTransport::new();
        let mut host = XboxOneHost::<512>::default();
        host.mount(&mut t, &GIP_INTERFACE, 512).unwrap();
        let mut pad = MockGamepad::default();
        host.process_report(&mut t, &mut pad, &input(0, 0, 1)).unwrap();
        assert_eq!(t.reads, std::vec![(0x82, 64)]);
    }

    #[test]
    fn test_chunked_message_pending() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        let header = GipHeader::new(Command::DeviceDescriptor)
            .with_internal(true)
            .with_sequence(5);
        let blob = [0x55u8; 100];
        let packets: std::vec::Vec<_> = gip::encode(header, &blob).unwrap().collect();
        assert_eq!(host.process_report(&mut t, &mut pad, &packets[0]), Ok(false));
        assert_eq!(host.process_report(&mut t, &mut pad, &packets[1]), Ok(false));
        // restarting the same completed sequence is refused
        assert_eq!(
            host.process_report(&mut t, &mut pad, &packets[0]),
            Err(GipError::DuplicateSequence(5))
        );
    }

    #[test]
    fn test_send_feedback() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        pad.pad_out = PadOut::new(0x40, 0x80);

        host.send_feedback(&mut t, &pad).unwrap();
        assert_eq!(
            t.written_to(0x02),
            std::vec![std::vec![0x09, 0x00, 0x01, 0x09, 0x00, 0x03, 0x00, 0x00, 0x40, 0x80, 0xFF, 0x00, 0xFF]]
        );

        // busy: skipped, sequence not consumed
        let err = host.send_feedback(&mut t, &pad).unwrap_err();
        assert!(err.is_not_ready());
        host.transfer_complete(&mut t, &mut pad, EndpointAddress(0x02), TransferResult::Success, &[]);
        host.send_feedback(&mut t, &pad).unwrap();
        assert_eq!(t.written_to(0x02)[1][2], 0x02);
    }

    #[test]
    fn test_unmount_forgets_controller() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        host.process_report(&mut t, &mut pad, &input(1, 0, 1)).unwrap();
        HostDriver::<MockTransport>::unmount(&mut host);
        assert!(!host.is_mounted());
        assert!(!host.transfer_complete(&mut t, &mut pad, IN_EP, TransferResult::Success, &[]));
    }
}
