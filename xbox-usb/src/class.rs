//! Interface negotiation and the class driver lifecycle.

use xbox_proto::descriptor::{
    DescriptorError, Descriptors, EndpointDescriptor, InterfaceClass, InterfaceDescriptor,
    DESC_TYPE_ENDPOINT, DESC_TYPE_INTERFACE, DESC_TYPE_VENDOR,
};

use crate::scheduler::{EndpointScheduler, Role};
use crate::transport::{TransferError, UsbTransport};

/// Why an interface was not opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenError {
    /// Interface triple is not ours. Another driver may claim it.
    InterfaceMismatch(InterfaceClass),
    /// Descriptor block is malformed.
    Descriptor(DescriptorError),
    /// The block needs more bytes than the stack allowed.
    ExceedsBudget { consumed: usize, budget: usize },
    /// The stack refused to open an endpoint.
    Endpoint(TransferError),
}

impl From<DescriptorError> for OpenError {
    fn from(e: DescriptorError) -> Self {
        Self::Descriptor(e)
    }
}

impl core::fmt::Display for OpenError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InterfaceMismatch(c) => write!(
                f,
                "interface {:02x}/{:02x}/{:02x} not handled",
                c.class, c.subclass, c.protocol
            ),
            Self::Descriptor(e) => write!(f, "bad descriptor: {e}"),
            Self::ExceedsBudget { consumed, budget } => {
                write!(f, "interface needs {consumed} bytes, only {budget} available")
            }
            Self::Endpoint(e) => write!(f, "endpoint open failed: {e}"),
        }
    }
}

/// Class driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassState {
    Uninitialized,
    /// Waiting for the stack to offer an interface.
    Negotiating,
    Open,
}

/// Shape of a matching interface block, found without side effects.
struct Layout {
    /// Offset of the first endpoint descriptor.
    endpoints_at: usize,
    consumed: usize,
}

/// Vendor class driver for one interface: validates the interface triple,
/// claims its endpoints and owns the endpoint scheduler.
#[derive(Debug)]
pub struct XboxClass<const N: usize> {
    interface: InterfaceClass,
    state: ClassState,
    scheduler: EndpointScheduler<N>,
}

impl<const N: usize> XboxClass<N> {
    #[must_use]
    pub const fn new(interface: InterfaceClass, role: Role) -> Self {
        Self {
            interface,
            state: ClassState::Uninitialized,
            scheduler: EndpointScheduler::new(role),
        }
    }

    #[must_use]
    pub const fn state(&self) -> ClassState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ClassState::Open
    }

    #[must_use]
    pub const fn interface(&self) -> InterfaceClass {
        self.interface
    }

    #[must_use]
    pub fn scheduler(&self) -> &EndpointScheduler<N> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut EndpointScheduler<N> {
        &mut self.scheduler
    }

    pub fn init(&mut self) {
        self.scheduler.reset();
        self.state = ClassState::Negotiating;
    }

    pub fn deinit(&mut self) {
        self.scheduler.reset();
        self.state = ClassState::Uninitialized;
    }

    /// Back to negotiation. Transfers in flight are not cancelled.
    pub fn reset(&mut self) {
        self.scheduler.reset();
        if self.state != ClassState::Uninitialized {
            self.state = ClassState::Negotiating;
        }
    }

    /// Open the interface that starts `descriptors`.
    ///
    /// Skips an optional vendor (0x21) descriptor after the interface, then
    /// claims up to `num_endpoints` endpoint descriptors in order; the first
    /// IN and the first OUT become the scheduler's endpoints. In the device
    /// role the receive endpoint is armed right away. Returns the number of
    /// bytes consumed.
    ///
    /// Nothing is claimed unless the interface matches and fits in `max_len`.
    pub fn open<T: UsbTransport>(
        &mut self,
        transport: &mut T,
        descriptors: &[u8],
        max_len: u16,
    ) -> Result<u16, OpenError> {
        let layout = self.measure(descriptors)?;
        let budget = usize::from(max_len).min(descriptors.len());
        if layout.consumed > budget {
            return Err(OpenError::ExceedsBudget {
                consumed: layout.consumed,
                budget,
            });
        }

        self.scheduler.reset();
        for raw in Descriptors::new(&descriptors[layout.endpoints_at..layout.consumed]) {
            let desc = EndpointDescriptor::parse(raw?.bytes())?;
            transport.open_endpoint(&desc).map_err(OpenError::Endpoint)?;
            if !self.scheduler.assign(&desc) {
                debug!("extra endpoint {:#x} opened, not used", desc.address.raw());
            }
        }

        if self.scheduler.tx_endpoint().is_none() || self.scheduler.rx_endpoint().is_none() {
            warn!("interface opened with a missing endpoint");
        }
        if self.scheduler.role() == Role::Device && self.scheduler.rx_endpoint().is_some() {
            if let Err(e) = self.scheduler.arm_receive(transport) {
                warn!("initial receive not armed: {}", e);
            }
        }

        self.state = ClassState::Open;
        info!(
            "interface {:#x}/{:#x}/{:#x} open, {} bytes",
            self.interface.class,
            self.interface.subclass,
            self.interface.protocol,
            layout.consumed
        );
        // Bounded by `max_len`.
        Ok(layout.consumed as u16)
    }

    fn measure(&self, descriptors: &[u8]) -> Result<Layout, OpenError> {
        let mut walk = Descriptors::new(descriptors);
        let first = walk.next().ok_or(DescriptorError::Truncated)??;
        if first.kind() != DESC_TYPE_INTERFACE {
            return Err(DescriptorError::UnexpectedType(first.kind()).into());
        }
        let itf = InterfaceDescriptor::parse(first.bytes())?;
        if itf.class != self.interface {
            return Err(OpenError::InterfaceMismatch(itf.class));
        }

        let mut consumed = first.len();
        if let Some(Ok(vendor)) = walk.peek() {
            if vendor.kind() == DESC_TYPE_VENDOR {
                consumed += vendor.len();
                walk.next();
            }
        }

        let endpoints_at = consumed;
        for _ in 0..itf.num_endpoints {
            match walk.next() {
                Some(Ok(desc)) if desc.kind() == DESC_TYPE_ENDPOINT => consumed += desc.len(),
                Some(Err(e)) => return Err(e.into()),
                _ => break,
            }
        }

        Ok(Layout {
            endpoints_at,
            consumed,
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use xbox_proto::{gip, xinput, EndpointAddress};

    use super::*;
    use crate::mock::MockTransport;

    fn xinput_class() -> XboxClass<32> {
        let mut class = XboxClass::new(xinput::INTERFACE_CLASS, Role::Device);
        class.init();
        class
    }

    #[test]
    fn test_open_xinput_block() {
        let mut t = MockTransport::new();
        let mut class = xinput_class();
        let consumed = class
            .open(&mut t, &xinput::INTERFACE_DESCRIPTOR, 512)
            .unwrap();

        // interface 9 + vendor 16 + two endpoints 7 each
        assert_eq!(consumed, 9 + 16 + 7 + 7);
        assert_eq!(class.state(), ClassState::Open);
        assert_eq!(t.opened.len(), 2);
        assert_eq!(class.scheduler().tx_endpoint(), Some(EndpointAddress(0x81)));
        assert_eq!(class.scheduler().rx_endpoint(), Some(EndpointAddress(0x01)));
        // OUT armed during open
        assert_eq!(t.reads, std::vec![(0x01, 32)]);
    }

    #[test]
    fn test_trailing_descriptors_not_consumed() {
        let mut block = std::vec::Vec::from(xinput::INTERFACE_DESCRIPTOR);
        block.extend_from_slice(&[0x09, 0x04, 0x01, 0x00, 0x01, 0xFF, 0x5D, 0x03, 0x00]);
        let mut t = MockTransport::new();
        let mut class = xinput_class();
        assert_eq!(class.open(&mut t, &block, 512), Ok(39));
    }

    #[test]
    fn test_subclass_mismatch_rejected() {
        let mut block = xinput::INTERFACE_DESCRIPTOR;
        block[6] = 0x5E;
        let mut t = MockTransport::new();
        let mut class = xinput_class();
        assert_eq!(
            class.open(&mut t, &block, 512),
            Err(OpenError::InterfaceMismatch(InterfaceClass::new(0xFF, 0x5E, 0x01)))
        );
        assert!(t.opened.is_empty());
        assert_eq!(class.state(), ClassState::Negotiating);
    }

    #[test]
    fn test_gip_driver_rejects_xinput_interface() {
        let mut t = MockTransport::new();
        let mut class: XboxClass<64> = XboxClass::new(gip::INTERFACE_CLASS, Role::Device);
        class.init();
        assert!(matches!(
            class.open(&mut t, &xinput::INTERFACE_DESCRIPTOR, 512),
            Err(OpenError::InterfaceMismatch(_))
        ));
    }

    #[test]
    fn test_budget_too_small() {
        let mut t = MockTransport::new();
        let mut class = xinput_class();
        assert_eq!(
            class.open(&mut t, &xinput::INTERFACE_DESCRIPTOR, 30),
            Err(OpenError::ExceedsBudget {
                consumed: 39,
                budget: 30
            })
        );
        assert!(t.opened.is_empty());
    }

    #[test]
    fn test_without_vendor_descriptor() {
        let block = [
            0x09, 0x04, 0x00, 0x00, 0x02, 0xFF, 0x47, 0xD0, 0x00, //
            0x07, 0x05, 0x02, 0x03, 0x40, 0x00, 0x04, //
            0x07, 0x05, 0x82, 0x03, 0x40, 0x00, 0x04,
        ];
        let mut t = MockTransport::new();
        let mut class: XboxClass<64> = XboxClass::new(gip::INTERFACE_CLASS, Role::Device);
        class.init();
        assert_eq!(class.open(&mut t, &block, 64), Ok(23));
        assert_eq!(class.scheduler().tx_endpoint(), Some(EndpointAddress(0x82)));
        assert_eq!(class.scheduler().rx_endpoint(), Some(EndpointAddress(0x02)));
    }

    #[test]
    fn test_missing_endpoint_still_opens() {
        let block = [
            0x09, 0x04, 0x00, 0x00, 0x02, 0xFF, 0x5D, 0x01, 0x00, //
            0x07, 0x05, 0x81, 0x03, 0x20, 0x00, 0x01,
        ];
        let mut t = MockTransport::new();
        let mut class = xinput_class();
        assert_eq!(class.open(&mut t, &block, 64), Ok(16));
        assert!(class.is_open());
        assert_eq!(class.scheduler().rx_endpoint(), None);
        assert!(t.reads.is_empty());
    }

    #[test]
    fn test_endpoint_open_failure() {
        let mut t = MockTransport::new();
        t.fail_open = true;
        let mut class = xinput_class();
        assert_eq!(
            class.open(&mut t, &xinput::INTERFACE_DESCRIPTOR, 512),
            Err(OpenError::Endpoint(TransferError::Io))
        );
        assert!(!class.is_open());
    }

    #[test]
    fn test_host_role_does_not_arm() {
        let mut t = MockTransport::new();
        let mut class: XboxClass<32> = XboxClass::new(xinput::INTERFACE_CLASS, Role::Host);
        class.init();
        class.open(&mut t, &xinput::INTERFACE_DESCRIPTOR, 512).unwrap();
        assert!(t.reads.is_empty());
        assert_eq!(class.scheduler().tx_endpoint(), Some(EndpointAddress(0x01)));
    }

    #[test]
    fn test_lifecycle() {
        let mut t = MockTransport::new();
        let mut class: XboxClass<32> = XboxClass::new(xinput::INTERFACE_CLASS, Role::Device);
        assert_eq!(class.state(), ClassState::Uninitialized);
        class.init();
        assert_eq!(class.state(), ClassState::Negotiating);
        class.open(&mut t, &xinput::INTERFACE_DESCRIPTOR, 512).unwrap();
        class.reset();
        assert_eq!(class.state(), ClassState::Negotiating);
        assert_eq!(class.scheduler().tx_endpoint(), None);
        class.deinit();
        assert_eq!(class.state(), ClassState::Uninitialized);
    }

    #[test]
    fn test_not_an_interface() {
        let mut t = MockTransport::new();
        let mut class = xinput_class();
        assert_eq!(
            class.open(&mut t, &xinput::INTERFACE_DESCRIPTOR[25..], 512),
            Err(OpenError::Descriptor(DescriptorError::UnexpectedType(0x05)))
        );
        assert_eq!(
            class.open(&mut t, &[], 512),
            Err(OpenError::Descriptor(DescriptorError::Truncated))
        );
    }
}
