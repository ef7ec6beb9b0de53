use smoltcp::time::Duration;
use smoltcp::wire::{EthernetAddress, Ipv4Address, Ipv4Cidr};

use crate::error::{Error, Result};

/// USB-facing link-layer address of the transport itself.
const LINK_MAC: EthernetAddress = EthernetAddress([0x02, 0x02, 0x11, 0x22, 0x33, 0x01]);

/// Locally administered address of the virtual interface. This needs to be
/// different to the transport link address (== the host-visible side).
const NETIF_MAC: EthernetAddress = EthernetAddress([0x02, 0x02, 0x11, 0x22, 0x33, 0x02]);

/// Complete configuration of the bridged interface.
///
/// Behavioural settings, driver identity and discovery identity are merged
/// into a single value with explicit defaults instead of separate descriptor
/// objects, so required fields are visible at the call site.
#[derive(Debug, Clone)]
pub struct NetifConfig {
    /// Static address of the interface, with prefix.
    pub ip: Ipv4Cidr,
    /// Gateway advertised to peers. `0.0.0.0` disables default-route
    /// advertisement from this link.
    pub gateway: Ipv4Address,
    /// Key identifying this interface among others in the system.
    pub if_key: &'static str,
    /// Human readable description.
    pub if_desc: &'static str,
    /// Comparative routing preference, higher wins.
    pub route_prio: u32,
    /// Run an address-lease (DHCP server) service on this interface.
    pub dhcp_server: bool,
    /// Bring the interface up during `bring_up` rather than waiting for an
    /// explicit `start`.
    pub auto_up: bool,
    /// MAC the USB transport presents on its link.
    pub link_mac: EthernetAddress,
    /// MAC of the virtual interface. Must differ from `link_mac`.
    pub netif_mac: EthernetAddress,
    /// Minimum DHCP lease duration handed to the lease service.
    pub min_lease: Duration,
    /// Settling wait between interface start and discovery registration.
    pub settle_delay: Duration,
    /// Seed for the protocol stack's randomness.
    pub random_seed: u64,
    pub usb: UsbDescriptors,
    pub discovery: DiscoveryConfig,
}

impl Default for NetifConfig {
    fn default() -> Self {
        Self {
            ip: Ipv4Cidr::new(Ipv4Address::new(192, 168, 4, 1), 24),
            gateway: Ipv4Address::UNSPECIFIED,
            if_key: "wired",
            if_desc: "usb ncm config device",
            route_prio: 10,
            dhcp_server: true,
            auto_up: true,
            link_mac: LINK_MAC,
            netif_mac: NETIF_MAC,
            min_lease: Duration::from_secs(60 * 60),
            settle_delay: Duration::from_secs(5),
            random_seed: 0,
            usb: UsbDescriptors::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl NetifConfig {
    /// Checks the invariants bring-up relies on.
    pub fn validate(&self) -> Result<()> {
        if self.netif_mac == self.link_mac {
            return Err(Error::MacConflict);
        }
        Ok(())
    }
}

/// Descriptor set handed to the transport on install.
#[derive(Debug, Clone)]
pub struct UsbDescriptors {
    pub manufacturer: &'static str,
    pub product: &'static str,
    pub serial_number: &'static str,
    /// String describing the network function within the composite device.
    pub network_function: &'static str,
    /// Raw configuration descriptor bytes, already laid out by the caller.
    pub configuration: &'static [u8],
    pub self_powered: bool,
    pub external_phy: bool,
}

impl Default for UsbDescriptors {
    fn default() -> Self {
        Self {
            manufacturer: "usbd-netif",
            product: "USB network device",
            serial_number: "000000000000",
            network_function: "NCM network function",
            configuration: &[],
            self_powered: false,
            external_phy: false,
        }
    }
}

/// Identity advertised through the discovery and legacy name services.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Hostname peers resolve instead of a pre-known address. Also used for
    /// the legacy name-service registration.
    pub hostname: &'static str,
    pub instance_name: &'static str,
    pub service: ServiceRecord,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            hostname: "ctag-tbd",
            instance_name: "ctag web server",
            service: ServiceRecord::default(),
        }
    }
}

/// One advertised service record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub instance: &'static str,
    pub service: &'static str,
    pub protocol: &'static str,
    pub port: u16,
    pub txt: &'static [TxtItem],
}

impl Default for ServiceRecord {
    fn default() -> Self {
        Self {
            instance: "ctag-tbd",
            service: "_http",
            protocol: "_tcp",
            port: 80,
            txt: &[
                TxtItem {
                    key: "board",
                    value: "esp32",
                },
                TxtItem {
                    key: "path",
                    value: "/",
                },
            ],
        }
    }
}

/// Key/value attribute attached to a service record.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxtItem {
    pub key: &'static str,
    pub value: &'static str,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use smoltcp::wire::Ipv4Address;

    use super::NetifConfig;
    use crate::error::Error;

    #[test]
    fn default_addressing() {
        let cfg = NetifConfig::default();
        assert_eq!(cfg.ip.address(), Ipv4Address::new(192, 168, 4, 1));
        assert_eq!(cfg.ip.prefix_len(), 24);
        assert_eq!(cfg.gateway, Ipv4Address::UNSPECIFIED);
        assert_eq!(cfg.min_lease.secs(), 60 * 60);
        assert_eq!(cfg.discovery.hostname, "ctag-tbd");
        assert_eq!(cfg.discovery.service.port, 80);
        cfg.validate().unwrap();
    }

    #[test]
    fn colliding_macs_are_rejected() {
        let mut cfg = NetifConfig::default();
        cfg.netif_mac = cfg.link_mac;
        assert_matches!(cfg.validate(), Err(Error::MacConflict));
    }
}
