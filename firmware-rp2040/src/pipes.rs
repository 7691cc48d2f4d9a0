//! Embassy endpoints behind the [`UsbTransport`] contract.
//!
//! The driver task queues a transfer and returns at once. A pump task per
//! endpoint runs the transfer to completion and posts a [`Completion`] back.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_usb::driver::{Endpoint, EndpointIn, EndpointOut};
use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};
use xbox_proto::{xinput, EndpointAddress, EndpointDescriptor};
use xbox_usb::{TransferError, TransferResult, UsbTransport};

/// One interrupt packet.
pub type Packet = Vec<u8, { xinput::ENDPOINT_SIZE }>;

/// A finished transfer, as reported to the driver task.
#[derive(Debug)]
pub struct Completion {
    pub ep: EndpointAddress,
    pub result: TransferResult,
    /// Bytes read; empty for writes.
    pub data: Packet,
}

/// State shared by the pumps, the USB state handler and the driver task.
pub struct UsbPipes {
    pub(crate) configured: AtomicBool,
    in_busy: AtomicBool,
    out_busy: AtomicBool,
    writes: Channel<CriticalSectionRawMutex, Packet, 1>,
    reads: Signal<CriticalSectionRawMutex, usize>,
    completions: Channel<CriticalSectionRawMutex, Completion, 4>,
}

impl Default for UsbPipes {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbPipes {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configured: AtomicBool::new(false),
            in_busy: AtomicBool::new(false),
            out_busy: AtomicBool::new(false),
            writes: Channel::new(),
            reads: Signal::new(),
            completions: Channel::new(),
        }
    }

    /// Whether the host has selected a configuration.
    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Acquire)
    }

    /// Next finished transfer.
    pub async fn completion(&self) -> Completion {
        self.completions.receive().await
    }

    /// Write queued packets to `ep` forever.
    pub async fn pump_in<E: EndpointIn>(&self, ep: &mut E) -> ! {
        let address = EndpointAddress(ep.info().addr.into());
        loop {
            let packet = self.writes.receive().await;
            ep.wait_enabled().await;
            let result = match ep.write(&packet).await {
                Ok(()) => TransferResult::Success,
                Err(e) => {
                    defmt::debug!("IN write failed: {:?}", e);
                    TransferResult::Failed
                }
            };
            self.in_busy.store(false, Ordering::Release);
            self.completions
                .send(Completion {
                    ep: address,
                    result,
                    data: Packet::new(),
                })
                .await;
        }
    }

    /// Read from `ep` each time a receive is armed, forever.
    pub async fn pump_out<E: EndpointOut>(&self, ep: &mut E) -> ! {
        let address = EndpointAddress(ep.info().addr.into());
        let mut buf = [0u8; xinput::ENDPOINT_SIZE];
        loop {
            let max_len = self.reads.wait().await.min(buf.len());
            ep.wait_enabled().await;
            let (result, data) = match ep.read(&mut buf[..max_len]).await {
                Ok(n) => (
                    TransferResult::Success,
                    Packet::from_slice(&buf[..n]).unwrap_or_default(),
                ),
                Err(e) => {
                    defmt::debug!("OUT read failed: {:?}", e);
                    (TransferResult::Failed, Packet::new())
                }
            };
            self.out_busy.store(false, Ordering::Release);
            self.completions
                .send(Completion {
                    ep: address,
                    result,
                    data,
                })
                .await;
        }
    }
}

/// [`UsbTransport`] over the two XInput endpoints.
pub struct EmbassyTransport {
    pipes: &'static UsbPipes,
    ep_in: EndpointAddress,
    ep_out: EndpointAddress,
}

impl EmbassyTransport {
    #[must_use]
    pub const fn new(
        pipes: &'static UsbPipes,
        ep_in: EndpointAddress,
        ep_out: EndpointAddress,
    ) -> Self {
        Self {
            pipes,
            ep_in,
            ep_out,
        }
    }

    #[must_use]
    pub fn in_address(&self) -> EndpointAddress {
        self.ep_in
    }

    #[must_use]
    pub fn out_address(&self) -> EndpointAddress {
        self.ep_out
    }
}

impl UsbTransport for EmbassyTransport {
    fn is_ready(&self) -> bool {
        self.pipes.is_configured()
    }

    // embassy-usb enables endpoints itself on SET_CONFIGURATION; only check
    // that the interface asks for the ones we built.
    fn open_endpoint(&mut self, desc: &EndpointDescriptor) -> Result<(), TransferError> {
        if desc.address == self.ep_in || desc.address == self.ep_out {
            Ok(())
        } else {
            Err(TransferError::Io)
        }
    }

    fn endpoint_busy(&self, ep: EndpointAddress) -> bool {
        if ep == self.ep_in {
            self.pipes.in_busy.load(Ordering::Acquire)
        } else if ep == self.ep_out {
            self.pipes.out_busy.load(Ordering::Acquire)
        } else {
            false
        }
    }

    fn start_write(&mut self, ep: EndpointAddress, data: &[u8]) -> Result<(), TransferError> {
        if ep != self.ep_in {
            return Err(TransferError::Io);
        }
        let packet = Packet::from_slice(data).map_err(|_| TransferError::Io)?;
        self.pipes
            .writes
            .try_send(packet)
            .map_err(|_| TransferError::NotReady)?;
        self.pipes.in_busy.store(true, Ordering::Release);
        Ok(())
    }

    fn start_read(&mut self, ep: EndpointAddress, max_len: usize) -> Result<(), TransferError> {
        if ep != self.ep_out {
            return Err(TransferError::Io);
        }
        self.pipes.out_busy.store(true, Ordering::Release);
        self.pipes.reads.signal(max_len);
        Ok(())
    }
}
