#![no_std]
#![no_main]

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler};
use embassy_time::{Duration, Ticker};
use embassy_usb::driver::Endpoint as _;
use embassy_usb::{Builder, UsbDevice};
use gamepad_core::{Buttons, DPad, Gamepad, GamepadPort, PadOut};
use static_cell::StaticCell;
use xbox_proto::EndpointAddress;
use xbox_pad_rp2040::{
    configure_xinput, interface_block, usb_config, ButtonInput, EmbassyTransport, UsbPipes,
    UsbStateHandler,
};
use xbox_usb::{GamepadBridge, UsbClassDriver, XInputDevice};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

type UsbDriver = Driver<'static, USB>;
type EpIn = <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointIn;
type EpOut = <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointOut;
type Pad = ButtonInput<'static, 6, 4>;

/// Report cadence; matches the 1 ms interrupt IN interval.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Shared between the pumps, the state handler and the driver task.
static PIPES: UsbPipes = UsbPipes::new();

/// USB device configuration buffers.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static STATE_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Xbox pad starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config(),
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );
    builder.handler(STATE_HANDLER.init(UsbStateHandler::new(&PIPES)));

    let (ep_in, ep_out) = configure_xinput(&mut builder);
    let transport = EmbassyTransport::new(
        &PIPES,
        EndpointAddress(ep_in.info().addr.into()),
        EndpointAddress(ep_out.info().addr.into()),
    );

    let usb_device = builder.build();

    // --- Buttons ---
    let buttons = ButtonInput::new(
        [
            (Input::new(p.PIN_2, Pull::Up), Buttons::A),
            (Input::new(p.PIN_3, Pull::Up), Buttons::B),
            (Input::new(p.PIN_4, Pull::Up), Buttons::X),
            (Input::new(p.PIN_5, Pull::Up), Buttons::Y),
            (Input::new(p.PIN_6, Pull::Up), Buttons::BACK),
            (Input::new(p.PIN_7, Pull::Up), Buttons::START),
        ],
        [
            (Input::new(p.PIN_10, Pull::Up), DPad::UP),
            (Input::new(p.PIN_11, Pull::Up), DPad::DOWN),
            (Input::new(p.PIN_12, Pull::Up), DPad::LEFT),
            (Input::new(p.PIN_13, Pull::Up), DPad::RIGHT),
        ],
    );

    // On-board LED shows rumble
    let led = Output::new(p.PIN_25, Level::Low);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(in_pump_task(ep_in).unwrap());
    spawner.spawn(out_pump_task(ep_out).unwrap());
    spawner.spawn(driver_task(transport, buttons, led).unwrap());

    info!("Xbox pad initialized, waiting for host...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) {
    device.run().await;
}

#[embassy_executor::task]
async fn in_pump_task(mut ep: EpIn) {
    PIPES.pump_in(&mut ep).await
}

#[embassy_executor::task]
async fn out_pump_task(mut ep: EpOut) {
    PIPES.pump_out(&mut ep).await
}

/// Driver task - polls the XInput bridge and routes completions to it.
#[embassy_executor::task]
async fn driver_task(mut transport: EmbassyTransport, buttons: Pad, mut led: Output<'static>) {
    let block = interface_block(transport.in_address(), transport.out_address());
    let mut device = XInputDevice::new();
    let mut gamepad = Gamepad::new();
    let mut ticker = Ticker::every(POLL_INTERVAL);

    loop {
        match select(ticker.next(), PIPES.completion()).await {
            Either::First(()) => {}
            Either::Second(done) => {
                device.transfer_complete(&mut transport, done.ep, done.result, &done.data);
                continue;
            }
        }

        // Follow enumeration: open on SET_CONFIGURATION, drop state on bus reset.
        let configured = PIPES.is_configured();
        if configured && !device.class().is_open() {
            UsbClassDriver::<EmbassyTransport>::init(&mut device);
            let len = block.len() as u16;
            if device.open(&mut transport, &block, len) == len {
                info!("XInput interface open");
            }
        } else if !configured && device.class().is_open() {
            UsbClassDriver::<EmbassyTransport>::reset(&mut device);
            gamepad.set_pad_out(PadOut::OFF);
            info!("XInput interface closed");
        }

        gamepad.set_pad_in(buttons.read());
        if let Err(e) = device.poll(&mut transport, &mut gamepad) {
            if !e.is_not_ready() {
                warn!("poll failed: {}", e);
            }
        }

        let rumble = gamepad.pad_out();
        led.set_level(Level::from(rumble.rumble_l.max(rumble.rumble_r) > 0));
    }
}
