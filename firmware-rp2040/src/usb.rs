//! USB identity and the XInput interface as embassy-usb builds it.

use embassy_usb::driver::Driver;
use embassy_usb::{Builder, Config, Handler};
use portable_atomic::Ordering;
use xbox_proto::descriptor::{DESC_TYPE_ENDPOINT, DESC_TYPE_VENDOR};
use xbox_proto::{xinput, EndpointAddress};

use crate::pipes::UsbPipes;

/// Microsoft.
pub const USB_VID: u16 = 0x045E;
/// Xbox 360 wired controller.
pub const USB_PID: u16 = 0x028E;

/// Interrupt IN polling interval.
const IN_INTERVAL_MS: u8 = 1;
/// Interrupt OUT polling interval.
const OUT_INTERVAL_MS: u8 = 8;

/// Device descriptor fields of a wired Xbox 360 pad.
#[must_use]
pub fn usb_config() -> Config<'static> {
    let mut config = Config::new(USB_VID, USB_PID);
    config.device_class = 0xFF;
    config.device_sub_class = 0xFF;
    config.device_protocol = 0xFF;
    config.device_release = 0x0114;
    config.composite_with_iads = false;
    config.manufacturer = Some("\u{00A9}Microsoft Corporation");
    config.product = Some("Controller");
    config.serial_number = Some("1B6F6E1");
    config.max_power = 500;
    config.max_packet_size_0 = 64;
    config
}

/// Add the XInput interface: `FF/5D/01`, the vendor 0x21 descriptor and two
/// 32-byte interrupt endpoints. Returns the IN and OUT endpoints.
pub fn configure_xinput<'d, D: Driver<'d>>(
    builder: &mut Builder<'d, D>,
) -> (D::EndpointIn, D::EndpointOut) {
    let class = xinput::INTERFACE_CLASS;
    let mut function = builder.function(class.class, class.subclass, class.protocol);
    let mut interface = function.interface();
    let mut alt = interface.alt_setting(class.class, class.subclass, class.protocol, None);
    alt.descriptor(DESC_TYPE_VENDOR, &xinput::VENDOR_DESCRIPTOR_BODY);
    let size = xinput::ENDPOINT_SIZE as u16;
    let ep_in = alt.endpoint_interrupt_in(None, size, IN_INTERVAL_MS);
    let ep_out = alt.endpoint_interrupt_out(None, size, OUT_INTERVAL_MS);
    (ep_in, ep_out)
}

/// The XInput interface block with the endpoint addresses embassy-usb
/// actually allocated, for [`UsbClassDriver::open`](xbox_usb::UsbClassDriver::open).
#[must_use]
pub fn interface_block(
    ep_in: EndpointAddress,
    ep_out: EndpointAddress,
) -> [u8; xinput::INTERFACE_DESCRIPTOR.len()] {
    let mut block = xinput::INTERFACE_DESCRIPTOR;
    let mut i = 0;
    while i + 2 < block.len() {
        let len = usize::from(block[i]);
        if len == 0 {
            break;
        }
        if block[i + 1] == DESC_TYPE_ENDPOINT {
            block[i + 2] = if EndpointAddress(block[i + 2]).is_in() {
                ep_in.raw()
            } else {
                ep_out.raw()
            };
        }
        i += len;
    }
    block
}

/// Tracks bus state for the driver task.
pub struct UsbStateHandler {
    pipes: &'static UsbPipes,
}

impl UsbStateHandler {
    #[must_use]
    pub const fn new(pipes: &'static UsbPipes) -> Self {
        Self { pipes }
    }

    fn set_configured(&self, configured: bool) {
        self.pipes.configured.store(configured, Ordering::Release);
    }
}

impl Handler for UsbStateHandler {
    fn enabled(&mut self, enabled: bool) {
        if !enabled {
            self.set_configured(false);
        }
    }

    fn reset(&mut self) {
        self.set_configured(false);
    }

    fn configured(&mut self, configured: bool) {
        defmt::info!("USB configured: {}", configured);
        self.set_configured(configured);
    }
}
