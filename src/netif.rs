use smoltcp::iface::{Config, Interface, PollResult, SocketSet};
use smoltcp::time::Instant;
use smoltcp::wire::{HardwareAddress, IpCidr, Ipv4Address};

use crate::bridge::{BridgeDevice, BridgeStats};
use crate::config::NetifConfig;
use crate::error::{Error, Result};
use crate::services::{announce, AnnounceReport, Delay, Discovery, LeaseService, NameService};
use crate::transport::UsbTransport;

/// The collaborators bring-up wires the interface into. All of them are
/// consumed as black boxes and only borrowed for the duration of the call.
pub struct Services<'a> {
    pub lease: &'a mut dyn LeaseService,
    pub discovery: &'a mut dyn Discovery,
    pub names: &'a mut dyn NameService,
    pub delay: &'a mut dyn Delay,
}

/// The virtual network interface backed by a USB transport.
///
/// Created once by [`WiredNetif::bring_up`] and held for the process lifetime;
/// there is no teardown path. The handle owns both the smoltcp interface and
/// the bridge device, so the receive path can never observe a torn-down stack.
pub struct WiredNetif<T: UsbTransport> {
    iface: Interface,
    device: BridgeDevice<T>,
    if_key: &'static str,
    if_desc: &'static str,
    route_prio: u32,
    announce: AnnounceReport,
}

impl<T: UsbTransport> WiredNetif<T> {
    /// Installs the transport, creates and starts the interface and registers
    /// it with the discovery services.
    ///
    /// Transport failures abort bring-up before the interface is started or
    /// announced. Discovery failures do not: the interface stays reachable at
    /// its static address and the per-step outcomes are kept in the
    /// [`AnnounceReport`].
    pub fn bring_up(
        mut transport: T,
        cfg: &NetifConfig,
        services: &mut Services<'_>,
        now: Instant,
    ) -> Result<Self> {
        cfg.validate()?;

        transport.install(&cfg.usb)?;
        transport.start_network(cfg.link_mac)?;

        let mut device = BridgeDevice::new(transport);

        // The interface runs under its own locally administered MAC, distinct
        // from the address the transport presents on the USB link.
        let mut iface_cfg = Config::new(HardwareAddress::Ethernet(cfg.netif_mac));
        iface_cfg.random_seed = cfg.random_seed;
        let mut iface = Interface::new(iface_cfg, &mut device, now);

        let mut addr_set = false;
        iface.update_ip_addrs(|addrs| {
            addr_set = addrs.push(IpCidr::Ipv4(cfg.ip)).is_ok();
        });
        if !addr_set {
            return Err(Error::Exhausted);
        }

        // gateway 0.0.0.0 keeps this link out of default routing
        if cfg.gateway != Ipv4Address::UNSPECIFIED {
            iface
                .routes_mut()
                .add_default_ipv4_route(cfg.gateway)
                .map_err(|_| Error::Exhausted)?;
        }

        if cfg.dhcp_server {
            if let Err(_e) = services.lease.set_minimum_lease(cfg.min_lease) {
                #[cfg(feature = "defmt")]
                defmt::warn!("netif: failed to set minimum lease time: {}", _e);
            }
        }

        if cfg.auto_up {
            // the driver is already running, so no attach event will arrive;
            // start the interface explicitly
            device.set_attached(true);
        }

        // settling wait before registration, see Delay
        services.delay.delay(cfg.settle_delay);

        let report = announce(services.discovery, services.names, cfg.if_key, &cfg.discovery);
        if !report.fully_registered() {
            #[cfg(feature = "defmt")]
            defmt::warn!("netif: discovery registration incomplete");
        }

        #[cfg(feature = "defmt")]
        defmt::info!("netif: {=str} up at {}", cfg.if_key, cfg.ip);

        Ok(Self {
            iface,
            device,
            if_key: cfg.if_key,
            if_desc: cfg.if_desc,
            route_prio: cfg.route_prio,
            announce: report,
        })
    }

    /// Interface-level start action: inbound frames are accepted from here on.
    pub fn start(&mut self) {
        self.device.set_attached(true);
    }

    /// Interface-level stop action. Frames arriving while stopped are
    /// discarded and counted, never faulted on.
    pub fn stop(&mut self) {
        self.device.set_attached(false);
    }

    #[must_use]
    pub fn is_up(&self) -> bool {
        self.device.is_attached()
    }

    /// Drains the transport's pending frames and lets the stack process them.
    pub fn poll(&mut self, now: Instant, sockets: &mut SocketSet<'_>) -> PollResult {
        self.device.pump();
        self.iface.poll(now, &mut self.device, sockets)
    }

    /// Receive-callback entry for transports that push frames instead of
    /// being polled.
    pub fn handle_rx(&mut self, frame: &[u8]) -> Result<()> {
        self.device.inject(frame)
    }

    #[must_use]
    pub fn hardware_addr(&self) -> HardwareAddress {
        self.iface.hardware_addr()
    }

    #[must_use]
    pub fn ip_addrs(&self) -> &[IpCidr] {
        self.iface.ip_addrs()
    }

    #[must_use]
    pub fn if_key(&self) -> &'static str {
        self.if_key
    }

    #[must_use]
    pub fn if_desc(&self) -> &'static str {
        self.if_desc
    }

    #[must_use]
    pub fn route_prio(&self) -> u32 {
        self.route_prio
    }

    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        self.device.stats()
    }

    #[must_use]
    pub fn announce_report(&self) -> &AnnounceReport {
        &self.announce
    }

    pub fn iface_mut(&mut self) -> &mut Interface {
        &mut self.iface
    }

    pub fn device_mut(&mut self) -> &mut BridgeDevice<T> {
        &mut self.device
    }
}
