//! Device-role bridges: present a [`GamepadPort`] to the host as an Xbox 360
//! or Xbox One controller.

use gamepad_core::{Buttons, GamepadPort, PadOut};
use xbox_proto::gip::{
    self, Command, DeviceArrival, ForceFeedback, GipError, GipEvent, GipHeader, GipInput,
    GipPacket, GipPackets, GipReassembler, GipSequence, VirtualKey, MAX_MESSAGE_SIZE,
};
use xbox_proto::xinput::{self, InReport, OutReport, XInputError};
use xbox_proto::EndpointAddress;

use crate::class::{OpenError, XboxClass};
use crate::scheduler::{Completion, Role};
use crate::transport::{
    ControlRequest, ControlStage, TransferError, TransferResult, UsbClassDriver, UsbTransport,
};

/// Error type for one bridge poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Nothing was sent this cycle. Retry on the next poll.
    Transfer(TransferError),
    /// Host feedback could not be decoded.
    XInput(XInputError),
    Gip(GipError),
}

impl From<TransferError> for BridgeError {
    fn from(e: TransferError) -> Self {
        Self::Transfer(e)
    }
}

impl From<XInputError> for BridgeError {
    fn from(e: XInputError) -> Self {
        Self::XInput(e)
    }
}

impl From<GipError> for BridgeError {
    fn from(e: GipError) -> Self {
        Self::Gip(e)
    }
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transfer(e) => write!(f, "transfer: {e}"),
            Self::XInput(e) => write!(f, "xinput: {e}"),
            Self::Gip(e) => write!(f, "gip: {e}"),
        }
    }
}

impl BridgeError {
    /// Whether the poll only has to be retried later.
    #[must_use]
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::Transfer(TransferError::NotReady))
    }
}

/// A class driver that moves gamepad state across the bus on each poll.
pub trait GamepadBridge<T: UsbTransport>: UsbClassDriver<T> {
    /// Push `gamepad` input to the host and apply host feedback to it.
    /// Never blocks.
    fn poll<G: GamepadPort>(&mut self, transport: &mut T, gamepad: &mut G)
        -> Result<(), BridgeError>;
}

fn open_or_zero(result: Result<u16, OpenError>) -> u16 {
    match result {
        Ok(len) => len,
        Err(OpenError::InterfaceMismatch(_)) => 0,
        Err(e) => {
            error!("open failed: {}", e);
            0
        }
    }
}

/// Xbox 360 wired controller (XInput).
#[derive(Debug)]
pub struct XInputDevice {
    class: XboxClass<{ xinput::ENDPOINT_SIZE }>,
    led: Option<u8>,
}

impl Default for XInputDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl XInputDevice {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            class: XboxClass::new(xinput::INTERFACE_CLASS, Role::Device),
            led: None,
        }
    }

    /// Last LED pattern the host asked for.
    #[must_use]
    pub fn led(&self) -> Option<u8> {
        self.led
    }

    #[must_use]
    pub fn class(&self) -> &XboxClass<{ xinput::ENDPOINT_SIZE }> {
        &self.class
    }

    fn apply_feedback<T: UsbTransport, G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &mut G,
    ) -> Result<(), XInputError> {
        let mut buf = [0u8; xinput::ENDPOINT_SIZE];
        let len = self.class.scheduler_mut().receive(transport, &mut buf);
        if len == 0 {
            return Ok(());
        }
        match OutReport::parse(&buf[..len])? {
            Some(OutReport::Rumble { left, right }) => gamepad.set_pad_out(PadOut::new(left, right)),
            Some(OutReport::Led(pattern)) => {
                if self.led != Some(pattern) {
                    debug!("led pattern {}", pattern);
                }
                self.led = Some(pattern);
            }
            None => trace!("ignored out report {:#x}", buf[0]),
        }
        Ok(())
    }
}

impl<T: UsbTransport> UsbClassDriver<T> for XInputDevice {
    fn init(&mut self) {
        self.class.init();
        self.led = None;
    }

    fn deinit(&mut self) {
        self.class.deinit();
    }

    fn reset(&mut self) {
        self.class.reset();
        self.led = None;
    }

    fn open(&mut self, transport: &mut T, descriptors: &[u8], max_len: u16) -> u16 {
        open_or_zero(self.class.open(transport, descriptors, max_len))
    }

    fn control_request(
        &mut self,
        _transport: &mut T,
        _stage: ControlStage,
        _request: &ControlRequest,
    ) -> bool {
        true
    }

    fn transfer_complete(
        &mut self,
        transport: &mut T,
        ep: EndpointAddress,
        result: TransferResult,
        data: &[u8],
    ) -> bool {
        self.class
            .scheduler_mut()
            .on_transfer_complete(transport, ep, result, data)
            .is_some()
    }
}

impl<T: UsbTransport> GamepadBridge<T> for XInputDevice {
    fn poll<G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &mut G,
    ) -> Result<(), BridgeError> {
        let report = InReport::from(&gamepad.pad_in()).to_bytes();
        let sent = self.class.scheduler_mut().send(transport, &report);
        let fed = self.apply_feedback(transport, gamepad);
        sent?;
        fed?;
        Ok(())
    }
}

/// Xbox One controller (GIP).
///
/// Announces itself once the pipe is open, answers descriptor requests with
/// `descriptor` and streams input with a rolling sequence. Sends at most one
/// packet per poll.
#[derive(Debug)]
pub struct XboxOneDevice<'d, const N: usize = MAX_MESSAGE_SIZE> {
    class: XboxClass<{ gip::ENDPOINT_SIZE }>,
    reassembler: GipReassembler<N>,
    sequence: GipSequence,
    arrival: DeviceArrival,
    descriptor: &'d [u8],
    announced: bool,
    guide: bool,
    descriptor_requested: bool,
    reply: Option<GipPackets<'d>>,
    unsent: Option<GipPacket>,
    feedback: Option<PadOut>,
}

impl<'d, const N: usize> XboxOneDevice<'d, N> {
    #[must_use]
    pub const fn new(arrival: DeviceArrival, descriptor: &'d [u8]) -> Self {
        Self {
            class: XboxClass::new(gip::INTERFACE_CLASS, Role::Device),
            reassembler: GipReassembler::new(),
            sequence: GipSequence::new(),
            arrival,
            descriptor,
            announced: false,
            guide: false,
            descriptor_requested: false,
            reply: None,
            unsent: None,
            feedback: None,
        }
    }

    #[must_use]
    pub fn class(&self) -> &XboxClass<{ gip::ENDPOINT_SIZE }> {
        &self.class
    }

    /// Whether the arrival message went out.
    #[must_use]
    pub fn announced(&self) -> bool {
        self.announced
    }

    fn clear_session(&mut self) {
        self.reassembler.reset();
        self.sequence.reset();
        self.announced = false;
        self.guide = false;
        self.descriptor_requested = false;
        self.reply = None;
        self.unsent = None;
        self.feedback = None;
    }

    fn handle_packet(&mut self, data: &[u8]) {
        match self.reassembler.feed(data) {
            Ok(GipEvent::Message(msg)) => match msg.command {
                Command::SetDeviceState => match ForceFeedback::parse(msg.payload) {
                    Ok(ff) => self.feedback = Some(ff.to_pad_out()),
                    Err(e) => warn!("bad force feedback: {}", e),
                },
                Command::DeviceDescriptor => {
                    debug!("descriptor requested");
                    self.descriptor_requested = true;
                }
                other => trace!("ignored command {:?}", other),
            },
            Ok(GipEvent::Pending) => {}
            Ok(GipEvent::Unhandled(code)) => trace!("unhandled command {:#x}", code),
            Err(e) => warn!("host message dropped: {}", e),
        }
    }

    /// Next chunk of the descriptor reply, starting a reply if one was asked for.
    fn next_reply_packet(&mut self) -> Result<Option<GipPacket>, GipError> {
        if self.unsent.is_some() {
            return Ok(self.unsent);
        }
        if self.reply.is_none() && self.descriptor_requested {
            self.descriptor_requested = false;
            let header = GipHeader::new(Command::DeviceDescriptor)
                .with_internal(true)
                .with_needs_ack(true)
                .with_sequence(self.sequence.advance());
            self.reply = Some(gip::encode(header, self.descriptor)?);
        }
        let next = self.reply.as_mut().and_then(Iterator::next);
        if next.is_none() {
            self.reply = None;
        }
        self.unsent = next;
        Ok(next)
    }

    fn send_sequenced<T: UsbTransport>(
        &mut self,
        transport: &mut T,
        packet: &GipPacket,
    ) -> Result<(), TransferError> {
        self.class.scheduler_mut().send(transport, packet)?;
        self.sequence.advance();
        Ok(())
    }
}

impl<T: UsbTransport, const N: usize> UsbClassDriver<T> for XboxOneDevice<'_, N> {
    fn init(&mut self) {
        self.class.init();
        self.clear_session();
    }

    fn deinit(&mut self) {
        self.class.deinit();
        self.clear_session();
    }

    fn reset(&mut self) {
        self.class.reset();
        self.clear_session();
    }

    fn open(&mut self, transport: &mut T, descriptors: &[u8], max_len: u16) -> u16 {
        open_or_zero(self.class.open(transport, descriptors, max_len))
    }

    fn control_request(
        &mut self,
        _transport: &mut T,
        _stage: ControlStage,
        _request: &ControlRequest,
    ) -> bool {
        true
    }

    fn transfer_complete(
        &mut self,
        transport: &mut T,
        ep: EndpointAddress,
        result: TransferResult,
        data: &[u8],
    ) -> bool {
        let completion = self
            .class
            .scheduler_mut()
            .on_transfer_complete(transport, ep, result, data);
        match completion {
            Some(Completion::Received) if result == TransferResult::Success => {
                self.handle_packet(data);
                true
            }
            Some(_) => true,
            None => false,
        }
    }
}

impl<T: UsbTransport, const N: usize> GamepadBridge<T> for XboxOneDevice<'_, N> {
    fn poll<G: GamepadPort>(
        &mut self,
        transport: &mut T,
        gamepad: &mut G,
    ) -> Result<(), BridgeError> {
        if let Some(pad) = self.feedback.take() {
            gamepad.set_pad_out(pad);
        }
        if !self.class.is_open() {
            return Err(TransferError::NotReady.into());
        }

        if !self.announced {
            let packet = self.arrival.to_packet(self.sequence.peek());
            self.send_sequenced(transport, &packet)?;
            info!("arrival sent");
            self.announced = true;
            return Ok(());
        }

        if let Some(packet) = self.next_reply_packet()? {
            // Chunks share the sequence taken when the reply started.
            self.class.scheduler_mut().send(transport, &packet)?;
            self.unsent = None;
            return Ok(());
        }

        let pad = gamepad.pad_in();
        let guide = pad.buttons.contains(Buttons::SYS);
        if guide != self.guide {
            let packet = VirtualKey { pressed: guide }.to_packet(self.sequence.peek());
            self.send_sequenced(transport, &packet)?;
            self.guide = guide;
            return Ok(());
        }

        let packet = GipInput::from_pad_in(&pad).to_packet(self.sequence.peek());
        self.send_sequenced(transport, &packet)?;
        Ok(())
    }
}
