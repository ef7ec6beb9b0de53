use smoltcp::time::Duration;
use smoltcp::wire::EthernetAddress;

use crate::buffer::FrameBuffer;
use crate::config::UsbDescriptors;
use crate::error::Result;

/// Bounded wait for the transport to accept an outbound frame.
pub const SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// The USB composite network transport underneath the bridge.
///
/// Implementations wrap the platform USB stack. The bridge never looks inside
/// the transport; it installs it, starts its network function and exchanges
/// whole frames with it.
pub trait UsbTransport {
    /// Installs the USB device with the given descriptor set. Failure here is
    /// fatal to bring-up.
    fn install(&mut self, descriptors: &UsbDescriptors) -> Result<()>;

    /// Starts the network function with the link-layer address the host will
    /// see. Failure here is fatal to bring-up.
    fn start_network(&mut self, mac: EthernetAddress) -> Result<()>;

    /// Hands one frame to the transport, blocking up to `timeout` for it to be
    /// accepted. A frame is accepted whole or not at all; ownership of the
    /// buffer passes to the transport, which releases it by dropping it once
    /// the send completes. [`Error::Timeout`](crate::Error::Timeout) is a
    /// normal outcome and the caller may retry with a fresh frame; the bridge
    /// itself never does.
    fn send(&mut self, frame: FrameBuffer, timeout: Duration) -> Result<()>;

    /// Lends the next pending inbound frame to `f`, or returns `None` when no
    /// frame is pending. The slice is only valid for the duration of the
    /// closure and must be copied before any asynchronous use.
    fn receive<R>(&mut self, f: impl FnOnce(&[u8]) -> R) -> Option<R>;
}
