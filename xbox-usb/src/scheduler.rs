//! Per-endpoint buffer ownership and transfer flow control.

use xbox_proto::{EndpointAddress, EndpointDescriptor};

use crate::transport::{TransferError, TransferResult, UsbTransport};

/// Which end of the bus the driver sits on. Decides whether the IN or the OUT
/// endpoint is the one we transmit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Send on IN, receive on OUT.
    Device,
    /// Send on OUT, receive on IN.
    Host,
}

/// What a completion on one of our endpoints was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    Sent,
    Received,
}

#[derive(Debug)]
struct Pipe<const N: usize> {
    address: Option<EndpointAddress>,
    busy: bool,
    buffer: [u8; N],
}

impl<const N: usize> Pipe<N> {
    const fn new() -> Self {
        Self {
            address: None,
            busy: false,
            buffer: [0; N],
        }
    }

    fn idle<T: UsbTransport>(&self, transport: &T) -> Option<EndpointAddress> {
        let ep = self.address?;
        if self.busy || transport.endpoint_busy(ep) {
            None
        } else {
            Some(ep)
        }
    }
}

/// Owns one transmit and one receive buffer of `N` bytes and the busy state
/// of their endpoints.
///
/// At most one transfer is outstanding per endpoint. The receive endpoint is
/// re-armed on every completion so the pipe never stalls.
#[derive(Debug)]
pub struct EndpointScheduler<const N: usize> {
    role: Role,
    tx: Pipe<N>,
    rx: Pipe<N>,
    rx_len: usize,
}

impl<const N: usize> EndpointScheduler<N> {
    #[must_use]
    pub const fn new(role: Role) -> Self {
        Self {
            role,
            tx: Pipe::new(),
            rx: Pipe::new(),
            rx_len: 0,
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Buffer capacity per direction.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[must_use]
    pub fn tx_endpoint(&self) -> Option<EndpointAddress> {
        self.tx.address
    }

    #[must_use]
    pub fn rx_endpoint(&self) -> Option<EndpointAddress> {
        self.rx.address
    }

    #[must_use]
    pub fn tx_busy(&self) -> bool {
        self.tx.busy
    }

    #[must_use]
    pub fn rx_busy(&self) -> bool {
        self.rx.busy
    }

    /// Record an endpoint if its direction is still unassigned. Returns
    /// whether it was taken.
    pub fn assign(&mut self, desc: &EndpointDescriptor) -> bool {
        let transmits = match self.role {
            Role::Device => desc.address.is_in(),
            Role::Host => !desc.address.is_in(),
        };
        let pipe = if transmits { &mut self.tx } else { &mut self.rx };
        if pipe.address.is_some() {
            return false;
        }
        pipe.address = Some(desc.address);
        true
    }

    /// Start one transfer of `report` on the transmit endpoint.
    ///
    /// Fails with [`TransferError::NotReady`] unless the transport is ready and
    /// the endpoint is assigned and idle; the buffer of a transfer in flight is
    /// left alone. Copies at most `N` bytes and returns how many.
    pub fn send<T: UsbTransport>(
        &mut self,
        transport: &mut T,
        report: &[u8],
    ) -> Result<usize, TransferError> {
        if !transport.is_ready() {
            return Err(TransferError::NotReady);
        }
        let ep = self.tx.idle(transport).ok_or(TransferError::NotReady)?;
        let len = report.len().min(N);
        self.tx.buffer[..len].copy_from_slice(&report[..len]);
        transport.start_write(ep, &self.tx.buffer[..len])?;
        self.tx.busy = true;
        Ok(len)
    }

    /// Arm a receive on the receive endpoint if it is assigned and idle.
    pub fn arm_receive<T: UsbTransport>(&mut self, transport: &mut T) -> Result<(), TransferError> {
        let ep = self.rx.idle(transport).ok_or(TransferError::NotReady)?;
        transport.start_read(ep, N)?;
        self.rx.busy = true;
        Ok(())
    }

    /// Copy the latest received data into `buf`. Never blocks.
    ///
    /// Arms a receive first when the pipe is idle. Copies `min(buf.len(), N)`
    /// bytes of the receive buffer and returns how many of them came from the
    /// last completed transfer (0 before anything has arrived). The data may
    /// be stale; callers re-poll.
    pub fn receive<T: UsbTransport>(&mut self, transport: &mut T, buf: &mut [u8]) -> usize {
        if transport.is_ready() && !self.rx.busy {
            if let Err(e) = self.arm_receive(transport) {
                trace!("receive not armed: {}", e);
            }
        }
        let len = buf.len().min(N);
        buf[..len].copy_from_slice(&self.rx.buffer[..len]);
        len.min(self.rx_len)
    }

    /// Bytes from the last completed receive.
    #[must_use]
    pub fn last_received(&self) -> &[u8] {
        &self.rx.buffer[..self.rx_len]
    }

    /// Route a completion. Returns `None` when `ep` is not one of ours.
    ///
    /// A receive completion stores `data` (when successful) and immediately
    /// re-arms the receive endpoint, even after a failed transfer.
    pub fn on_transfer_complete<T: UsbTransport>(
        &mut self,
        transport: &mut T,
        ep: EndpointAddress,
        result: TransferResult,
        data: &[u8],
    ) -> Option<Completion> {
        if self.tx.address == Some(ep) {
            self.tx.busy = false;
            if result != TransferResult::Success {
                debug!("send on {:#x} ended {:?}", ep.raw(), result);
            }
            return Some(Completion::Sent);
        }
        if self.rx.address != Some(ep) {
            return None;
        }

        self.rx.busy = false;
        if result == TransferResult::Success {
            let len = data.len().min(N);
            self.rx.buffer[..len].copy_from_slice(&data[..len]);
            self.rx_len = len;
        } else {
            debug!("receive on {:#x} ended {:?}", ep.raw(), result);
        }
        if let Err(e) = self.arm_receive(transport) {
            warn!("re-arm on {:#x} failed: {}", ep.raw(), e);
        }
        Some(Completion::Received)
    }

    /// Zero both buffers and forget both endpoints. Safe with transfers in
    /// flight; their completions no longer match an endpoint.
    pub fn reset(&mut self) {
        self.tx = Pipe::new();
        self.rx = Pipe::new();
        self.rx_len = 0;
    }
}
