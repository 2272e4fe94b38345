//! IPv4 datagrams: header parsing/serialization and checksum maintenance.

use super::checksum::{compute_ip_checksum, verify_ip_checksum};
use super::PacketError;
use bytes::Bytes;
use std::net::Ipv4Addr;

/// IPv4 header (options are carried through opaquely; locally built headers
/// never generate any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    /// IP version (always 4)
    pub version: u8,
    /// Header length in 4-byte words
    pub ihl: u8,
    /// Differentiated services code point
    pub dscp: u8,
    /// Explicit congestion notification
    pub ecn: u8,
    /// Total datagram length (header + payload)
    pub total_length: u16,
    pub identification: u16,
    pub flags: u8,
    pub fragment_offset: u16,
    /// Time to live; forwarding decrements this and recomputes the checksum
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    /// Raw option bytes, `(ihl - 5) * 4` of them. Carried through untouched
    /// so a forwarded header serializes back to what was received.
    pub options: Bytes,
}

impl Ipv4Header {
    /// Minimum header length (no options).
    pub const MIN_LEN: usize = 20;

    /// Default TTL for newly built datagrams.
    pub const DEFAULT_TTL: u8 = 64;

    /// Parse and validate an IPv4 header; the checksum must verify.
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_LEN {
            return Err(PacketError::TooShort {
                expected: Self::MIN_LEN,
                actual: data.len(),
            });
        }

        let version = data[0] >> 4;
        if version != 4 {
            return Err(PacketError::InvalidIpVersion { version });
        }

        let ihl = data[0] & 0x0F;
        if ihl < 5 {
            return Err(PacketError::InvalidIpHeaderLength { ihl });
        }
        let header_len = (ihl as usize) * 4;
        if data.len() < header_len {
            return Err(PacketError::TooShort {
                expected: header_len,
                actual: data.len(),
            });
        }
        if !verify_ip_checksum(&data[..header_len]) {
            return Err(PacketError::InvalidIpChecksum);
        }

        Ok(Self {
            version,
            ihl,
            dscp: data[1] >> 2,
            ecn: data[1] & 0x03,
            total_length: u16::from_be_bytes([data[2], data[3]]),
            identification: u16::from_be_bytes([data[4], data[5]]),
            flags: data[6] >> 5,
            fragment_offset: u16::from_be_bytes([data[6] & 0x1F, data[7]]),
            ttl: data[8],
            protocol: data[9],
            checksum: u16::from_be_bytes([data[10], data[11]]),
            src_ip: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            dst_ip: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            options: Bytes::copy_from_slice(&data[Self::MIN_LEN..header_len]),
        })
    }

    /// Serialize the header with the stored checksum field.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.header_len());
        bytes.push((self.version << 4) | (self.ihl & 0x0F));
        bytes.push((self.dscp << 2) | (self.ecn & 0x03));
        bytes.extend_from_slice(&self.total_length.to_be_bytes());
        bytes.extend_from_slice(&self.identification.to_be_bytes());
        bytes.push((self.flags << 5) | ((self.fragment_offset >> 8) as u8 & 0x1F));
        bytes.push(self.fragment_offset as u8);
        bytes.push(self.ttl);
        bytes.push(self.protocol);
        bytes.extend_from_slice(&self.checksum.to_be_bytes());
        bytes.extend_from_slice(&self.src_ip.octets());
        bytes.extend_from_slice(&self.dst_ip.octets());
        bytes.extend_from_slice(&self.options);
        bytes
    }

    /// Header length in bytes.
    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }

    /// Recompute and store the header checksum. Must be called whenever a
    /// header field (notably the TTL) changes.
    pub fn compute_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = compute_ip_checksum(&self.to_bytes());
    }
}

/// An IPv4 datagram: header plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Bytes,
}

impl Ipv4Datagram {
    /// Build a datagram with a freshly computed header around `payload`.
    pub fn new(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, protocol: u8, payload: Bytes) -> Self {
        let mut header = Ipv4Header {
            version: 4,
            ihl: 5,
            dscp: 0,
            ecn: 0,
            total_length: (Ipv4Header::MIN_LEN + payload.len()) as u16,
            identification: 0,
            flags: 0,
            fragment_offset: 0,
            ttl: Ipv4Header::DEFAULT_TTL,
            protocol,
            checksum: 0,
            src_ip,
            dst_ip,
            options: Bytes::new(),
        };
        header.compute_checksum();
        Self { header, payload }
    }

    /// Parse a datagram; the payload length must match the header's
    /// `total_length`.
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        let header = Ipv4Header::parse(data)?;
        let total_length = header.total_length as usize;
        if total_length < header.header_len() || total_length > data.len() {
            return Err(PacketError::InvalidTotalLength {
                total_length: header.total_length,
                actual: data.len(),
            });
        }
        let payload = Bytes::copy_from_slice(&data[header.header_len()..total_length]);
        Ok(Self { header, payload })
    }

    /// Serialize the datagram (header followed by payload).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header.to_bytes();
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}
