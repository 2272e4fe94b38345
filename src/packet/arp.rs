//! ARP messages for Ethernet/IPv4: fixed 28-byte request/reply bodies.

use super::{MacAddr, PacketError};
use std::fmt;
use std::net::Ipv4Addr;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;
const HLEN_ETHERNET: u8 = 6;
const PLEN_IPV4: u8 = 4;

/// ARP operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    Request,
    Reply,
}

impl ArpOpcode {
    pub const fn value(self) -> u16 {
        match self {
            ArpOpcode::Request => 1,
            ArpOpcode::Reply => 2,
        }
    }

    pub fn from_value(opcode: u16) -> Result<Self, PacketError> {
        match opcode {
            1 => Ok(ArpOpcode::Request),
            2 => Ok(ArpOpcode::Reply),
            _ => Err(PacketError::UnknownArpOpcode { opcode }),
        }
    }
}

/// An ARP message mapping between IPv4 and Ethernet addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: ArpOpcode,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpMessage {
    /// Message length for Ethernet/IPv4 ARP.
    pub const LEN: usize = 28;

    /// A broadcast request asking who owns `target_ip`.
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            opcode: ArpOpcode::Request,
            sender_mac,
            sender_ip,
            target_mac: MacAddr::new([0; 6]),
            target_ip,
        }
    }

    /// A reply answering a request from `target_mac`/`target_ip`.
    pub fn reply(
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self {
            opcode: ArpOpcode::Reply,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        }
    }

    /// Serialize the message into its 28-byte wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LEN);
        bytes.extend_from_slice(&HTYPE_ETHERNET.to_be_bytes());
        bytes.extend_from_slice(&PTYPE_IPV4.to_be_bytes());
        bytes.push(HLEN_ETHERNET);
        bytes.push(PLEN_IPV4);
        bytes.extend_from_slice(&self.opcode.value().to_be_bytes());
        bytes.extend_from_slice(&self.sender_mac.octets());
        bytes.extend_from_slice(&self.sender_ip.octets());
        bytes.extend_from_slice(&self.target_mac.octets());
        bytes.extend_from_slice(&self.target_ip.octets());
        bytes
    }

    /// Parse an ARP message, validating the hardware/protocol format.
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::LEN {
            return Err(PacketError::TooShort {
                expected: Self::LEN,
                actual: data.len(),
            });
        }

        let htype = u16::from_be_bytes([data[0], data[1]]);
        let ptype = u16::from_be_bytes([data[2], data[3]]);
        if htype != HTYPE_ETHERNET
            || ptype != PTYPE_IPV4
            || data[4] != HLEN_ETHERNET
            || data[5] != PLEN_IPV4
        {
            return Err(PacketError::UnsupportedArpFormat { htype, ptype });
        }

        let opcode = ArpOpcode::from_value(u16::from_be_bytes([data[6], data[7]]))?;

        let mut sender_mac = [0u8; 6];
        let mut target_mac = [0u8; 6];
        sender_mac.copy_from_slice(&data[8..14]);
        target_mac.copy_from_slice(&data[18..24]);

        Ok(Self {
            opcode,
            sender_mac: MacAddr::new(sender_mac),
            sender_ip: Ipv4Addr::new(data[14], data[15], data[16], data[17]),
            target_mac: MacAddr::new(target_mac),
            target_ip: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
        })
    }
}

impl fmt::Display for ArpMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            ArpOpcode::Request => write!(
                f,
                "who has {}? tell {} ({})",
                self.target_ip, self.sender_ip, self.sender_mac
            ),
            ArpOpcode::Reply => write!(
                f,
                "{} is at {} (to {})",
                self.sender_ip, self.sender_mac, self.target_ip
            ),
        }
    }
}
