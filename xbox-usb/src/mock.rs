//! Recording transport and gamepad for unit tests.

extern crate std;

use std::vec::Vec;

use gamepad_core::{GamepadPort, PadIn, PadOut};
use xbox_proto::{EndpointAddress, EndpointDescriptor};

use crate::transport::{TransferError, UsbTransport};

#[derive(Debug)]
pub struct MockTransport {
    pub ready: bool,
    /// Raw addresses the stack reports as busy.
    pub busy: Vec<u8>,
    pub fail_transfers: bool,
    pub fail_open: bool,
    pub opened: Vec<EndpointDescriptor>,
    pub writes: Vec<(u8, Vec<u8>)>,
    pub reads: Vec<(u8, usize)>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            ready: true,
            busy: Vec::new(),
            fail_transfers: false,
            fail_open: false,
            opened: Vec::new(),
            writes: Vec::new(),
            reads: Vec::new(),
        }
    }

    /// Payloads written to `ep`, oldest first.
    pub fn written_to(&self, ep: u8) -> Vec<Vec<u8>> {
        self.writes
            .iter()
            .filter(|(addr, _)| *addr == ep)
            .map(|(_, data)| data.clone())
            .collect()
    }
}

impl UsbTransport for MockTransport {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn open_endpoint(&mut self, desc: &EndpointDescriptor) -> Result<(), TransferError> {
        if self.fail_open {
            return Err(TransferError::Io);
        }
        self.opened.push(*desc);
        Ok(())
    }

    fn endpoint_busy(&self, ep: EndpointAddress) -> bool {
        self.busy.contains(&ep.raw())
    }

    fn start_write(&mut self, ep: EndpointAddress, data: &[u8]) -> Result<(), TransferError> {
        if self.fail_transfers {
            return Err(TransferError::Io);
        }
        self.writes.push((ep.raw(), data.to_vec()));
        Ok(())
    }

    fn start_read(&mut self, ep: EndpointAddress, max_len: usize) -> Result<(), TransferError> {
        if self.fail_transfers {
            return Err(TransferError::Io);
        }
        self.reads.push((ep.raw(), max_len));
        Ok(())
    }
}

/// Gamepad that records every pushed input and halves trigger values, so
/// tests can tell scaled from unscaled data.
#[derive(Debug, Default)]
pub struct MockGamepad {
    pub pushed: Vec<PadIn>,
    pub pad_out: PadOut,
}

impl GamepadPort for MockGamepad {
    fn set_pad_in(&mut self, pad: PadIn) {
        self.pushed.push(pad);
    }

    fn pad_in(&self) -> PadIn {
        self.pushed.last().copied().unwrap_or_default()
    }

    fn set_pad_out(&mut self, pad: PadOut) {
        self.pad_out = pad;
    }

    fn pad_out(&self) -> PadOut {
        self.pad_out
    }

    fn scale_trigger_l(&self, value: u8) -> u8 {
        value / 2
    }

    fn scale_trigger_r(&self, value: u8) -> u8 {
        value / 2
    }
}

mod tests {
    use super::*;

    #[test]
    fn test_default_transport_is_ready_and_empty() {
        let t = MockTransport::default();
        assert!(t.ready);
        assert!(!t.fail_transfers && !t.fail_open);
        assert!(t.opened.is_empty() && t.writes.is_empty() && t.reads.is_empty());
    }
}
