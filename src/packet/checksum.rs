//! Internet checksum (RFC 1071) for IPv4 headers.

/// One's-complement sum over 16-bit words, folded and inverted.
fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut i = 0;

    while i + 1 < data.len() {
        sum += u16::from_be_bytes([data[i], data[i + 1]]) as u32;
        i += 2;
    }

    // Odd trailing byte is padded with zero on the right.
    if i < data.len() {
        sum += (data[i] as u32) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// Compute the checksum of an IP header whose checksum field is zeroed.
pub fn compute_ip_checksum(ip_header: &[u8]) -> u16 {
    internet_checksum(ip_header)
}

/// Verify a full IP header including its checksum field: the sum over the
/// whole header must come out to zero.
pub fn verify_ip_checksum(ip_header: &[u8]) -> bool {
    internet_checksum(ip_header) == 0
}
