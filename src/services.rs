use smoltcp::time::Duration;

use crate::config::{DiscoveryConfig, ServiceRecord};
use crate::error::Result;

/// Address-lease (DHCP server) service embedded in the interface.
pub trait LeaseService {
    /// Sets the minimum duration an assigned address stays valid before the
    /// peer has to renew it.
    fn set_minimum_lease(&mut self, lease: Duration) -> Result<()>;
}

/// Per-interface actions of the discovery subsystem. Each action covers both
/// IPv4 and IPv6 presence.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceAction {
    EnableAddresses,
    AnnounceAddresses,
    EnableReverseLookup,
}

/// Service-discovery subsystem (mDNS style), consumed as a black box.
pub trait Discovery {
    fn init(&mut self) -> Result<()>;
    /// Binds the subsystem to the interface identified by `if_key`.
    fn register_interface(&mut self, if_key: &str) -> Result<()>;
    fn interface_action(&mut self, action: InterfaceAction) -> Result<()>;
    fn set_hostname(&mut self, hostname: &str) -> Result<()>;
    fn set_instance_name(&mut self, name: &str) -> Result<()>;
    fn add_service(&mut self, record: &ServiceRecord) -> Result<()>;
}

/// Legacy name-resolution subsystem (NetBIOS style).
pub trait NameService {
    fn init(&mut self) -> Result<()>;
    fn set_name(&mut self, name: &str) -> Result<()>;
}

/// Blocking wait used for the post-start settling delay.
///
/// The delay is a pragmatic wait, not a synchronization primitive; platforms
/// that expose an interface-up signal should wait on that instead and return
/// once it fires.
pub trait Delay {
    fn delay(&mut self, duration: Duration);
}

/// Outcome of each announcement step. Failures are recorded, never escalated:
/// the interface stays reachable by address even when it cannot be found by
/// name.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceReport {
    pub init: Result<()>,
    pub register: Result<()>,
    pub enable_addresses: Result<()>,
    pub announce_addresses: Result<()>,
    pub reverse_lookup: Result<()>,
    pub hostname: Result<()>,
    pub instance_name: Result<()>,
    pub service: Result<()>,
    pub legacy_name: Result<()>,
}

impl AnnounceReport {
    #[must_use]
    pub fn fully_registered(&self) -> bool {
        [
            self.init,
            self.register,
            self.enable_addresses,
            self.announce_addresses,
            self.reverse_lookup,
            self.hostname,
            self.instance_name,
            self.service,
            self.legacy_name,
        ]
        .iter()
        .all(Result::is_ok)
    }
}

fn observe(_step: &str, _result: Result<()>) {
    #[cfg(feature = "defmt")]
    defmt::info!("discovery: {=str} returned {}", _step, _result);
}

/// Registers the interface with the discovery and legacy name services so
/// peers can reach it under `cfg.hostname` rather than by a pre-known address.
///
/// Every step runs regardless of earlier failures; the report carries the
/// individual outcomes.
pub fn announce(
    discovery: &mut dyn Discovery,
    names: &mut dyn NameService,
    if_key: &str,
    cfg: &DiscoveryConfig,
) -> AnnounceReport {
    let init = discovery.init();
    observe("init", init);

    let register = discovery.register_interface(if_key);
    observe("register_interface", register);

    let enable_addresses = discovery.interface_action(InterfaceAction::EnableAddresses);
    observe("enable_addresses", enable_addresses);

    let announce_addresses = discovery.interface_action(InterfaceAction::AnnounceAddresses);
    observe("announce_addresses", announce_addresses);

    let reverse_lookup = discovery.interface_action(InterfaceAction::EnableReverseLookup);
    observe("reverse_lookup", reverse_lookup);

    let hostname = discovery.set_hostname(cfg.hostname);
    observe("set_hostname", hostname);

    let instance_name = discovery.set_instance_name(cfg.instance_name);
    observe("set_instance_name", instance_name);

    let service = discovery.add_service(&cfg.service);
    observe("add_service", service);

    let legacy_name = names.init().and_then(|()| names.set_name(cfg.hostname));
    observe("legacy_name", legacy_name);

    AnnounceReport {
        init,
        register,
        enable_addresses,
        announce_addresses,
        reverse_lookup,
        hostname,
        instance_name,
        service,
        legacy_name,
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::{announce, Discovery, InterfaceAction, NameService};
    use crate::config::{DiscoveryConfig, ServiceRecord};
    use crate::error::{Error, Result};

    #[derive(Default)]
    struct RecordingDiscovery {
        calls: Vec<String>,
        fail_all: bool,
    }

    impl RecordingDiscovery {
        fn outcome(&mut self, call: String) -> Result<()> {
            self.calls.push(call);
            if self.fail_all {
                Err(Error::Discovery)
            } else {
                Ok(())
            }
        }
    }

    impl Discovery for RecordingDiscovery {
        fn init(&mut self) -> Result<()> {
            self.outcome("init".into())
        }

        fn register_interface(&mut self, if_key: &str) -> Result<()> {
            self.outcome(format!("register {if_key}"))
        }

        fn interface_action(&mut self, action: InterfaceAction) -> Result<()> {
            self.outcome(format!("action {action:?}"))
        }

        fn set_hostname(&mut self, hostname: &str) -> Result<()> {
            self.outcome(format!("hostname {hostname}"))
        }

        fn set_instance_name(&mut self, name: &str) -> Result<()> {
            self.outcome(format!("instance {name}"))
        }

        fn add_service(&mut self, record: &ServiceRecord) -> Result<()> {
            self.outcome(format!(
                "service {}.{} port {}",
                record.service, record.protocol, record.port
            ))
        }
    }

    #[derive(Default)]
    struct RecordingNames {
        calls: Vec<String>,
    }

    impl NameService for RecordingNames {
        fn init(&mut self) -> Result<()> {
            self.calls.push("init".into());
            Ok(())
        }

        fn set_name(&mut self, name: &str) -> Result<()> {
            self.calls.push(format!("name {name}"));
            Ok(())
        }
    }

    #[test]
    fn announce_runs_the_full_sequence_in_order() {
        let mut discovery = RecordingDiscovery::default();
        let mut names = RecordingNames::default();
        let cfg = DiscoveryConfig::default();

        let report = announce(&mut discovery, &mut names, "wired", &cfg);

        assert!(report.fully_registered());
        assert_eq!(
            discovery.calls,
            [
                "init",
                "register wired",
                "action EnableAddresses",
                "action AnnounceAddresses",
                "action EnableReverseLookup",
                "hostname ctag-tbd",
                "instance ctag web server",
                "service _http._tcp port 80",
            ]
        );
        assert_eq!(names.calls, ["init", "name ctag-tbd"]);
    }

    #[test]
    fn failures_do_not_stop_later_steps() {
        let mut discovery = RecordingDiscovery {
            fail_all: true,
            ..RecordingDiscovery::default()
        };
        let mut names = RecordingNames::default();
        let cfg = DiscoveryConfig::default();

        let report = announce(&mut discovery, &mut names, "wired", &cfg);

        assert!(!report.fully_registered());
        assert_eq!(discovery.calls.len(), 8);
        assert_eq!(report.service, Err(Error::Discovery));
        // the legacy name service is still reached
        assert_eq!(report.legacy_name, Ok(()));
        assert_eq!(names.calls, ["init", "name ctag-tbd"]);
    }
}
