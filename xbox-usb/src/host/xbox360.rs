use gamepad_core::GamepadPort;
use xbox_proto::xinput::{self, InReport, OutReport, XInputError};
use xbox_proto::EndpointAddress;

use super::{scale_pad, HostConfig, HostDriver};
use crate::class::{OpenError, XboxClass};
use crate::device::BridgeError;
use crate::scheduler::{Completion, Role};
use crate::transport::{TransferError, TransferResult, UsbTransport};

/// Wired Xbox 360 controller attached to our host port.
#[derive(Debug)]
pub struct Xbox360Host {
    class: XboxClass<{ xinput::ENDPOINT_SIZE }>,
    config: HostConfig,
    last: Option<InReport>,
}

impl Default for Xbox360Host {
    fn default() -> Self {
        Self::new(HostConfig::DEFAULT)
    }
}

impl Xbox360Host {
    #[must_use]
    pub const fn new(config: HostConfig) -> Self {
        Self {
            class: XboxClass::new(xinput::INTERFACE_CLASS, Role::Host),
            config,
            last: None,
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.class.is_open()
    }

    /// Select an LED ring animation.
    pub fn set_led<T: UsbTransport>(
        &mut self,
        transport: &mut T,
        pattern: u8,
    ) -> Result<(), BridgeError> {
        self.send_out_report(transport, OutReport::Led(pattern))
    }

    fn send_out_report<T: UsbTransport>(
        &mut self,
        transport: &mut T,
        report: OutReport,
    ) -> Result<(), BridgeError> {
        let mut buf = [0u8; OutReport::RUMBLE_SIZE];
        let len = report.encode(&mut buf)?;
        self.class.scheduler_mut().send(transport, &buf[..len])?;
        Ok(())
    }

    fn handle<G: GamepadPort>(&mut self, gamepad: &mut G, report: &[u8]) -> Result<bool, XInputError> {
        let decoded = match InReport::parse(report) {
            Ok(decoded) => decoded,
            // LED status, rumble acks and headset reports share the pipe.
            Err(XInputError::UnexpectedReport { id, size }) => {
                trace!("ignored report {:#x} size {}", id, size);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        if self.last == Some(decoded) {
            return Ok(false);
        }
        let pad = scale_pad(gamepad, decoded.to_pad_in(), self.config);
        gamepad.set_pad_in(pad);
        self.last = Some(decoded);
        Ok(true)
    }
}

impl<T: UsbTransport> HostDriver<T> for Xbox360Host {
    type Error = XInputError;

    fn mount(
        &mut self,
        transport: &mut T,
        descriptors: &[u8],
        max_len: u16,
    ) -> Result<u16, OpenError> {
        self.class.init();
        self.last = None;
        self.class.open(transport, descriptors, max_len)
    }

    fn unmount(&mut self) {
        self.class.deinit();
        self.last = None;
    }

    fn initialize(&mut self, transport: &mut T) -> Result<(), TransferError> {
        self.class.scheduler_mut().arm_receive(transport)
    }

    fn process_report<G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &mut G,
        report: &[u8],
    ) -> Result<bool, XInputError> {
        let result = self.handle(gamepad, report);
        let scheduler = self.class.scheduler_mut();
        if !scheduler.rx_busy() {
            if let Err(e) = scheduler.arm_receive(transport) {
                warn!("receive not re-armed: {}", e);
            }
        }
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
        self.send_out_report(transport, OutReport::from(gamepad.pad_out()))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use gamepad_core::{AnalogStick, Buttons, PadOut};

    use super::*;
    use crate::mock::{MockGamepad, MockTransport};

    fn mounted(t: &mut MockTransport) -> Xbox360Host {
        let mut host = Xbox360Host::default();
        assert_eq!(host.mount(t, &xinput::INTERFACE_DESCRIPTOR, 512), Ok(39));
        host.initialize(t).unwrap();
        host
    }

    fn report(buttons1: u8, lx: i16) -> [u8; InReport::SIZE] {
        InReport {
            buttons: [0, buttons1],
            joystick_lx: lx,
            ..InReport::default()
        }
        .to_bytes()
    }

    #[test]
    fn test_host_endpoints() {
        let mut t = MockTransport::new();
        let host = mounted(&mut t);
        assert!(host.is_mounted());
        // receives on IN 0x81
        assert_eq!(t.reads, std::vec![(0x81, 32)]);
    }

    #[test]
    fn test_identical_reports_push_once() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();

        assert_eq!(host.process_report(&mut t, &mut pad, &report(0x01, 5)), Ok(true));
        assert_eq!(host.process_report(&mut t, &mut pad, &report(0x01, 5)), Ok(false));
        assert_eq!(pad.pushed.len(), 1);
        assert_eq!(pad.pushed[0].buttons, Buttons::LB);
        assert_eq!(pad.pushed[0].left_stick, AnalogStick::new(5, 0));

        assert_eq!(host.process_report(&mut t, &mut pad, &report(0x01, 6)), Ok(true));
        assert_eq!(pad.pushed.len(), 2);
    }

    #[test]
    fn test_reserved_bytes_do_not_defeat_dedupe() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        let mut noisy = report(0x10, 0);
        host.process_report(&mut t, &mut pad, &noisy).unwrap();
        noisy[19] = 0xAA;
        assert_eq!(host.process_report(&mut t, &mut pad, &noisy), Ok(false));
        assert_eq!(pad.pushed[0].buttons, Buttons::A);
    }

    #[test]
    fn test_other_reports_ignored() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        // LED status report
        assert_eq!(host.process_report(&mut t, &mut pad, &[0x01, 0x03, 0x06]), Ok(false));
        assert!(pad.pushed.is_empty());
        assert!(host.process_report(&mut t, &mut pad, &[0x00]).is_err());
    }

    #[test]
    fn test_completion_processes_and_rearms() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        let data = report(0x20, 0);
        assert!(host.transfer_complete(&mut t, &mut pad, EndpointAddress(0x81), TransferResult::Success, &data));
        assert_eq!(pad.pushed[0].buttons, Buttons::B);
        assert_eq!(t.reads.len(), 2);
    }

    #[test]
    fn test_rumble_and_led_out() {
        let mut t = MockTransport::new();
        let mut host = mounted(&mut t);
        let mut pad = MockGamepad::default();
        pad.pad_out = PadOut::new(0x11, 0x22);

        host.send_feedback(&mut t, &pad).unwrap();
        assert!(host.set_led(&mut t, 0x02).unwrap_err().is_not_ready());
        host.transfer_complete(&mut t, &mut pad, EndpointAddress(0x01), TransferResult::Success, &[]);
        host.set_led(&mut t, 0x02).unwrap();

        assert_eq!(
            t.written_to(0x01),
            std::vec![
                std::vec![0x00, 0x08, 0x00, 0x11, 0x22, 0x00, 0x00, 0x00],
                std::vec![0x01, 0x03, 0x02],
            ]
        );
    }
}
