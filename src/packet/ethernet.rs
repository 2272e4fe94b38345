//! Ethernet framing: hardware addresses, type field, and the 14-byte
//! header wrapping an opaque payload.

use super::PacketError;
use bytes::Bytes;
use std::fmt;

/// A 6-byte Ethernet hardware address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    /// The all-ones broadcast address.
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);

    #[inline]
    pub const fn new(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }

    #[inline]
    pub const fn octets(self) -> [u8; 6] {
        self.0
    }

    #[inline]
    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({})", self)
    }
}

impl From<[u8; 6]> for MacAddr {
    #[inline]
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

/// Payload type carried by an Ethernet frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Arp,
}

impl EtherType {
    pub const fn value(self) -> u16 {
        match self {
            EtherType::Ipv4 => 0x0800,
            EtherType::Arp => 0x0806,
        }
    }

    pub fn from_value(value: u16) -> Result<Self, PacketError> {
        match value {
            0x0800 => Ok(EtherType::Ipv4),
            0x0806 => Ok(EtherType::Arp),
            _ => Err(PacketError::UnknownEtherType { value }),
        }
    }
}

/// An Ethernet frame: destination, source, type, and an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub ethertype: EtherType,
    pub payload: Bytes,
}

impl EthernetFrame {
    /// Header length: two addresses plus the type field.
    pub const HEADER_LEN: usize = 14;

    /// Serialize the frame (header followed by payload).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::HEADER_LEN + self.payload.len());
        bytes.extend_from_slice(&self.dst.octets());
        bytes.extend_from_slice(&self.src.octets());
        bytes.extend_from_slice(&self.ethertype.value().to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parse a frame from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::HEADER_LEN {
            return Err(PacketError::TooShort {
                expected: Self::HEADER_LEN,
                actual: data.len(),
            });
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&data[0..6]);
        src.copy_from_slice(&data[6..12]);
        let ethertype = EtherType::from_value(u16::from_be_bytes([data[12], data[13]]))?;

        Ok(Self {
            dst: MacAddr::new(dst),
            src: MacAddr::new(src),
            ethertype,
            payload: Bytes::copy_from_slice(&data[Self::HEADER_LEN..]),
        })
    }
}
