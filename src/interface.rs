//! Network interface: turns IPv4 datagrams into Ethernet frames, resolving
//! next-hop addresses with ARP. Datagrams whose next hop is unresolved are
//! queued until a reply arrives; the ARP cache and outstanding requests
//! expire on a simulated millisecond clock driven by `tick`.

use crate::packet::{
    ArpMessage, ArpOpcode, EtherType, EthernetFrame, Ipv4Datagram, MacAddr,
};
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

/// How long a learned IP-to-MAC mapping stays valid.
const CACHE_TTL_MS: u64 = 30_000;

/// How long before an unanswered ARP request may be resent.
const REQUEST_TTL_MS: u64 = 5_000;

struct CacheEntry {
    mac: MacAddr,
    learned_at: u64,
}

/// A single Ethernet interface with ARP-based next-hop resolution.
pub struct NetworkInterface {
    mac: MacAddr,
    ip: Ipv4Addr,
    clock_ms: u64,
    cache: HashMap<Ipv4Addr, CacheEntry>,
    /// Next hops with an ARP request in flight, keyed to the send time.
    pending_requests: HashMap<Ipv4Addr, u64>,
    /// Datagrams parked until their next hop resolves.
    waiting: HashMap<Ipv4Addr, VecDeque<Ipv4Datagram>>,
    outbound: VecDeque<EthernetFrame>,
}

impl NetworkInterface {
    pub fn new(mac: MacAddr, ip: Ipv4Addr) -> Self {
        Self {
            mac,
            ip,
            clock_ms: 0,
            cache: HashMap::new(),
            pending_requests: HashMap::new(),
            waiting: HashMap::new(),
            outbound: VecDeque::new(),
        }
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Send `datagram` toward `next_hop`. If the next hop's MAC is cached the
    /// frame goes out immediately; otherwise the datagram is queued and at
    /// most one ARP request per `REQUEST_TTL_MS` is broadcast for it.
    pub fn send_datagram(&mut self, datagram: Ipv4Datagram, next_hop: Ipv4Addr) {
        if let Some(entry) = self.cache.get(&next_hop) {
            let frame = EthernetFrame {
                dst: entry.mac,
                src: self.mac,
                ethertype: EtherType::Ipv4,
                payload: Bytes::from(datagram.to_bytes()),
            };
            self.outbound.push_back(frame);
            return;
        }

        self.waiting.entry(next_hop).or_default().push_back(datagram);

        if self.pending_requests.contains_key(&next_hop) {
            return;
        }
        log::debug!("{}: sending ARP request for {}", self.ip, next_hop);
        self.pending_requests.insert(next_hop, self.clock_ms);
        let request = ArpMessage::request(self.mac, self.ip, next_hop);
        self.outbound.push_back(EthernetFrame {
            dst: MacAddr::BROADCAST,
            src: self.mac,
            ethertype: EtherType::Arp,
            payload: Bytes::from(request.to_bytes()),
        });
    }

    /// Process an inbound frame. Returns the contained IPv4 datagram when the
    /// frame carries one addressed to this interface; ARP traffic is handled
    /// internally (cache learning, reply generation, flushing parked
    /// datagrams). Frames for other hosts and unparsable payloads are
    /// dropped.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) -> Option<Ipv4Datagram> {
        if frame.dst != self.mac && !frame.dst.is_broadcast() {
            return None;
        }

        match frame.ethertype {
            EtherType::Ipv4 => match Ipv4Datagram::parse(&frame.payload) {
                Ok(datagram) => Some(datagram),
                Err(err) => {
                    log::debug!("{}: dropping bad IPv4 datagram: {}", self.ip, err);
                    None
                }
            },
            EtherType::Arp => {
                let message = match ArpMessage::parse(&frame.payload) {
                    Ok(message) => message,
                    Err(err) => {
                        log::debug!("{}: dropping bad ARP message: {}", self.ip, err);
                        return None;
                    }
                };

                // Any valid ARP message teaches us the sender's mapping.
                self.cache.insert(
                    message.sender_ip,
                    CacheEntry {
                        mac: message.sender_mac,
                        learned_at: self.clock_ms,
                    },
                );
                self.pending_requests.remove(&message.sender_ip);

                if let Some(parked) = self.waiting.remove(&message.sender_ip) {
                    for datagram in parked {
                        self.send_datagram(datagram, message.sender_ip);
                    }
                }

                if message.opcode == ArpOpcode::Request && message.target_ip == self.ip {
                    let reply = ArpMessage::reply(
                        self.mac,
                        self.ip,
                        message.sender_mac,
                        message.sender_ip,
                    );
                    self.outbound.push_back(EthernetFrame {
                        dst: message.sender_mac,
                        src: self.mac,
                        ethertype: EtherType::Arp,
                        payload: Bytes::from(reply.to_bytes()),
                    });
                }
                None
            }
        }
    }

    /// Advance the interface clock by `ms`, expiring stale cache entries and
    /// letting unanswered ARP requests be retried.
    pub fn tick(&mut self, ms: u64) {
        self.clock_ms += ms;
        let now = self.clock_ms;
        self.cache
            .retain(|_, entry| now - entry.learned_at < CACHE_TTL_MS);
        self.pending_requests
            .retain(|_, sent_at| now - *sent_at < REQUEST_TTL_MS);
    }

    /// Next frame ready to go on the wire, if any.
    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.outbound.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL_MAC: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);
    const PEER_MAC: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x02]);

    fn local_ip() -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, 1)
    }

    fn peer_ip() -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, 2)
    }

    fn interface() -> NetworkInterface {
        NetworkInterface::new(LOCAL_MAC, local_ip())
    }

    fn datagram(dst: Ipv4Addr) -> Ipv4Datagram {
        Ipv4Datagram::new(local_ip(), dst, 17, Bytes::from_static(b"payload"))
    }

    fn arp_reply_frame() -> EthernetFrame {
        let reply = ArpMessage::reply(PEER_MAC, peer_ip(), LOCAL_MAC, local_ip());
        EthernetFrame {
            dst: LOCAL_MAC,
            src: PEER_MAC,
            ethertype: EtherType::Arp,
            payload: Bytes::from(reply.to_bytes()),
        }
    }

    #[test]
    fn test_unresolved_next_hop_sends_one_arp_request() {
        let mut iface = interface();
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        iface.send_datagram(datagram(peer_ip()), peer_ip());

        let frame = iface.maybe_send().unwrap();
        assert_eq!(frame.ethertype, EtherType::Arp);
        assert_eq!(frame.dst, MacAddr::BROADCAST);
        let request = ArpMessage::parse(&frame.payload).unwrap();
        assert_eq!(request.opcode, ArpOpcode::Request);
        assert_eq!(request.target_ip, peer_ip());

        // The second datagram must not trigger a duplicate request.
        assert!(iface.maybe_send().is_none());
    }

    #[test]
    fn test_reply_flushes_waiting_datagrams() {
        let mut iface = interface();
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        let _arp_request = iface.maybe_send().unwrap();

        assert!(iface.recv_frame(&arp_reply_frame()).is_none());

        for _ in 0..2 {
            let frame = iface.maybe_send().unwrap();
            assert_eq!(frame.ethertype, EtherType::Ipv4);
            assert_eq!(frame.dst, PEER_MAC);
            assert!(Ipv4Datagram::parse(&frame.payload).is_ok());
        }
        assert!(iface.maybe_send().is_none());
    }

    #[test]
    fn test_cached_mapping_sends_immediately() {
        let mut iface = interface();
        iface.recv_frame(&arp_reply_frame());

        iface.send_datagram(datagram(peer_ip()), peer_ip());
        let frame = iface.maybe_send().unwrap();
        assert_eq!(frame.ethertype, EtherType::Ipv4);
        assert_eq!(frame.dst, PEER_MAC);
    }

    #[test]
    fn test_cache_expires_after_thirty_seconds() {
        let mut iface = interface();
        iface.recv_frame(&arp_reply_frame());

        iface.tick(29_999);
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        assert_eq!(iface.maybe_send().unwrap().ethertype, EtherType::Ipv4);

        iface.tick(1);
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        assert_eq!(iface.maybe_send().unwrap().ethertype, EtherType::Arp);
    }

    #[test]
    fn test_request_retried_after_five_seconds() {
        let mut iface = interface();
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        assert_eq!(iface.maybe_send().unwrap().ethertype, EtherType::Arp);

        iface.tick(4_999);
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        assert!(iface.maybe_send().is_none());

        iface.tick(1);
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        assert_eq!(iface.maybe_send().unwrap().ethertype, EtherType::Arp);
    }

    #[test]
    fn test_ignores_frames_for_other_hosts() {
        let mut iface = interface();
        let dgram = datagram(local_ip());
        let frame = EthernetFrame {
            dst: PEER_MAC,
            src: PEER_MAC,
            ethertype: EtherType::Ipv4,
            payload: Bytes::from(dgram.to_bytes()),
        };
        assert!(iface.recv_frame(&frame).is_none());
    }

    #[test]
    fn test_delivers_ipv4_addressed_to_us() {
        let mut iface = interface();
        let dgram = datagram(local_ip());
        let frame = EthernetFrame {
            dst: LOCAL_MAC,
            src: PEER_MAC,
            ethertype: EtherType::Ipv4,
            payload: Bytes::from(dgram.to_bytes()),
        };
        assert_eq!(iface.recv_frame(&frame), Some(dgram));
    }

    #[test]
    fn test_drops_malformed_ipv4_payload() {
        let mut iface = interface();
        let mut bytes = datagram(local_ip()).to_bytes();
        bytes[8] = bytes[8].wrapping_add(1); // break the header checksum
        let frame = EthernetFrame {
            dst: LOCAL_MAC,
            src: PEER_MAC,
            ethertype: EtherType::Ipv4,
            payload: Bytes::from(bytes),
        };
        assert!(iface.recv_frame(&frame).is_none());
    }

    #[test]
    fn test_replies_to_arp_request_for_own_ip() {
        let mut iface = interface();
        let request = ArpMessage::request(PEER_MAC, peer_ip(), local_ip());
        let frame = EthernetFrame {
            dst: MacAddr::BROADCAST,
            src: PEER_MAC,
            ethertype: EtherType::Arp,
            payload: Bytes::from(request.to_bytes()),
        };
        assert!(iface.recv_frame(&frame).is_none());

        let reply_frame = iface.maybe_send().unwrap();
        assert_eq!(reply_frame.dst, PEER_MAC);
        let reply = ArpMessage::parse(&reply_frame.payload).unwrap();
        assert_eq!(reply.opcode, ArpOpcode::Reply);
        assert_eq!(reply.sender_mac, LOCAL_MAC);
        assert_eq!(reply.sender_ip, local_ip());
    }

    #[test]
    fn test_request_for_other_ip_learns_but_does_not_reply() {
        let mut iface = interface();
        let request = ArpMessage::request(PEER_MAC, peer_ip(), Ipv4Addr::new(10, 0, 0, 3));
        let frame = EthernetFrame {
            dst: MacAddr::BROADCAST,
            src: PEER_MAC,
            ethertype: EtherType::Arp,
            payload: Bytes::from(request.to_bytes()),
        };
        iface.recv_frame(&frame);
        assert!(iface.maybe_send().is_none());

        // The sender's mapping was still learned.
        iface.send_datagram(datagram(peer_ip()), peer_ip());
        assert_eq!(iface.maybe_send().unwrap().ethertype, EtherType::Ipv4);
    }
}
