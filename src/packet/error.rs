use thiserror::Error;

/// Errors raised while parsing wire formats.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Unknown EtherType: {value:#06x}")]
    UnknownEtherType { value: u16 },

    #[error("Invalid IP version: {version}")]
    InvalidIpVersion { version: u8 },

    #[error("Invalid IP header length: {ihl}")]
    InvalidIpHeaderLength { ihl: u8 },

    #[error("Invalid IP total length: {total_length} (payload has {actual} bytes)")]
    InvalidTotalLength { total_length: u16, actual: usize },

    #[error("Invalid IP checksum")]
    InvalidIpChecksum,

    #[error("Unsupported ARP format: htype {htype}, ptype {ptype:#06x}")]
    UnsupportedArpFormat { htype: u16, ptype: u16 },

    #[error("Unknown ARP opcode: {opcode}")]
    UnknownArpOpcode { opcode: u16 },
}
