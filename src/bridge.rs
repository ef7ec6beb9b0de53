use heapless::Deque;
use smoltcp::phy::{self, Device, DeviceCapabilities, Medium};
use smoltcp::time::Instant;

use crate::buffer::FrameBuffer;
use crate::error::{Error, Result};
use crate::transport::{UsbTransport, SEND_TIMEOUT};

const MAX_SEGMENT_SIZE: usize = 1514;

/// Owned inbound frames pending delivery to the stack. There is deliberately
/// no deeper backlog; a frame either fits here or is dropped and counted.
pub const RX_QUEUE_DEPTH: usize = 4;

/// Frame-loss and timeout counters. Dropped frames are policy, not faults, so
/// they surface here instead of as errors.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Inbound frames discarded because the interface was not yet started.
    pub rx_dropped: u32,
    /// Inbound frames dropped because the owned copy could not be allocated.
    pub rx_no_mem: u32,
    /// Inbound frames dropped because the queue was full.
    pub rx_overrun: u32,
    /// Outbound frames the transport did not accept within [`SEND_TIMEOUT`].
    pub tx_timeout: u32,
    /// Outbound frames dropped because no buffer could be allocated.
    pub tx_no_mem: u32,
}

/// Bridges frame ownership between a [`UsbTransport`] and the smoltcp stack.
///
/// The transport lends its receive buffers only for the duration of a
/// callback; [`BridgeDevice::inject`] copies each frame into owned memory and
/// queues it for the stack to collect on poll. Outbound, the stack fills an
/// owned buffer which is handed to the transport whole with a bounded wait.
/// The bridge takes no locks of its own; callers serialise access through
/// `&mut self`.
pub struct BridgeDevice<T: UsbTransport> {
    transport: T,
    rx: RxBridge,
}

struct RxBridge {
    queue: Deque<FrameBuffer, RX_QUEUE_DEPTH>,
    attached: bool,
    stats: BridgeStats,
}

impl<T: UsbTransport> BridgeDevice<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            rx: RxBridge {
                queue: Deque::new(),
                attached: false,
                stats: BridgeStats::default(),
            },
        }
    }

    /// Receive-callback entry point: copies one transport-owned frame into the
    /// stack's receive path. The slice is not retained past the call.
    pub fn inject(&mut self, frame: &[u8]) -> Result<()> {
        self.rx.inject(frame)
    }

    /// Drains the transport's pending inbound frames through [`Self::inject`].
    pub fn pump(&mut self) {
        let Self { transport, rx } = self;
        while let Some(result) = transport.receive(|frame| rx.inject(frame)) {
            if let Err(_e) = result {
                #[cfg(feature = "defmt")]
                defmt::warn!("bridge: inbound frame lost: {}", _e);
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        self.rx.stats
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.rx.attached
    }

    pub(crate) fn set_attached(&mut self, attached: bool) {
        self.rx.attached = attached;
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl RxBridge {
    fn inject(&mut self, frame: &[u8]) -> Result<()> {
        if !self.attached {
            // Startup race safety net: the interface is not up yet, so the
            // frame is discarded rather than buffered or faulted on.
            self.stats.rx_dropped = self.stats.rx_dropped.wrapping_add(1);
            return Ok(());
        }

        let copy = match FrameBuffer::copy_from(frame) {
            Ok(copy) => copy,
            Err(e) => {
                self.stats.rx_no_mem = self.stats.rx_no_mem.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("bridge: no memory for inbound frame of {} bytes", frame.len());
                return Err(e);
            }
        };

        if self.queue.push_back(copy).is_err() {
            self.stats.rx_overrun = self.stats.rx_overrun.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::debug!("bridge: rx queue full, frame dropped");
        }
        Ok(())
    }
}

impl<T: UsbTransport> Device for BridgeDevice<T> {
    type RxToken<'a>
        = FrameRxToken
    where
        Self: 'a;
    type TxToken<'a>
        = FrameTxToken<'a, T>
    where
        Self: 'a;

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        if !self.rx.attached {
            return None;
        }
        let frame = self.rx.queue.pop_front()?;
        Some((
            FrameRxToken { frame },
            FrameTxToken {
                transport: &mut self.transport,
                stats: &mut self.rx.stats,
            },
        ))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if !self.rx.attached {
            return None;
        }
        Some(FrameTxToken {
            transport: &mut self.transport,
            stats: &mut self.rx.stats,
        })
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = MAX_SEGMENT_SIZE;
        caps.max_burst_size = Some(1);
        caps.medium = Medium::Ethernet;
        caps
    }
}

/// One owned inbound frame, consumed by the stack.
pub struct FrameRxToken {
    frame: FrameBuffer,
}

impl phy::RxToken for FrameRxToken {
    fn consume<R, F>(self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        // buffer is released on drop once the stack is done with it
        f(self.frame.as_ref())
    }
}

/// Permission to transmit one frame through the transport.
pub struct FrameTxToken<'a, T: UsbTransport> {
    transport: &'a mut T,
    stats: &'a mut BridgeStats,
}

impl<T: UsbTransport> phy::TxToken for FrameTxToken<'_, T> {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        match FrameBuffer::alloc(len) {
            Ok(mut frame) => {
                let result = f(frame.as_mut());
                // ownership of the frame passes to the transport; a timeout is
                // a normal outcome and the stack is not told about it
                match self.transport.send(frame, SEND_TIMEOUT) {
                    Ok(()) => {}
                    Err(Error::Timeout) => {
                        self.stats.tx_timeout = self.stats.tx_timeout.wrapping_add(1);
                        #[cfg(feature = "defmt")]
                        defmt::warn!("bridge: transport did not accept frame in time");
                    }
                    Err(_e) => {
                        #[cfg(feature = "defmt")]
                        defmt::error!("bridge: failed to send frame to USB: {}", _e);
                    }
                }
                result
            }
            Err(_) => {
                self.stats.tx_no_mem = self.stats.tx_no_mem.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("bridge: no memory for outbound frame of {} bytes", len);
                let mut scratch = [0u8; MAX_SEGMENT_SIZE];
                let len = len.min(MAX_SEGMENT_SIZE);
                f(&mut scratch[..len])
            }
        }
    }
}
