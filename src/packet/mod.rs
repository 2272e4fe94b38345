//! Wire formats: Ethernet frames, ARP messages, IPv4 datagrams, and the
//! internet checksum. Parsing is strict; the protocol layers above turn any
//! parse failure into a silent drop.

mod arp;
mod checksum;
mod error;
mod ethernet;
mod ipv4;

pub use arp::{ArpMessage, ArpOpcode};
pub use checksum::{compute_ip_checksum, verify_ip_checksum};
pub use error::PacketError;
pub use ethernet::{EtherType, EthernetFrame, MacAddr};
pub use ipv4::{Ipv4Datagram, Ipv4Header};
