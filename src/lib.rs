//! Bridge between a CDC-NCM style USB network transport and a [smoltcp](https://crates.io/crates/smoltcp)
//! virtual Ethernet interface.
//!
//! The transport hands over frames from a context it owns; this crate copies them
//! into adapter-owned buffers and feeds them to the IP stack, and forwards the
//! stack's outbound frames to the transport with a bounded wait. On top of the
//! bridged device it brings up a statically addressed interface with a DHCP
//! lease-policy hook and registers it with mDNS/NetBIOS style discovery services.

#![no_std]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![warn(clippy::use_self)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod bridge;
mod buffer;
mod config;
mod error;
mod netif;
mod services;
mod transport;

pub use bridge::{BridgeDevice, BridgeStats, FrameRxToken, FrameTxToken, RX_QUEUE_DEPTH};
pub use buffer::FrameBuffer;
pub use config::{DiscoveryConfig, NetifConfig, ServiceRecord, TxtItem, UsbDescriptors};
pub use error::{Error, Result};
pub use netif::{Services, WiredNetif};
pub use services::{
    announce, AnnounceReport, Delay, Discovery, InterfaceAction, LeaseService, NameService,
};
pub use transport::{UsbTransport, SEND_TIMEOUT};
