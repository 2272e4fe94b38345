//! IPv4 router: owns a set of network interfaces and forwards datagrams
//! between them using longest-prefix-match over a binary trie keyed on the
//! destination address, most significant bit first.

use crate::interface::NetworkInterface;
use crate::packet::{EthernetFrame, Ipv4Datagram};
use std::collections::VecDeque;
use std::net::Ipv4Addr;

/// Where a matched route sends the datagram next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextHop {
    /// Forward to a gateway on the attached network.
    Gateway(Ipv4Addr),
    /// The destination is directly attached; deliver to it.
    Direct,
}

#[derive(Clone)]
struct RouteEntry {
    next_hop: NextHop,
    interface_index: usize,
}

/// One trie node per prefix bit; `entry` is set where a route terminates.
struct TrieNode {
    children: [Option<usize>; 2],
    entry: Option<RouteEntry>,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: [None, None],
            entry: None,
        }
    }
}

struct Port {
    interface: NetworkInterface,
    inbound: VecDeque<Ipv4Datagram>,
}

/// A router over any number of interfaces.
pub struct Router {
    ports: Vec<Port>,
    /// Trie arena; index 0 is the root.
    nodes: Vec<TrieNode>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            ports: Vec::new(),
            nodes: vec![TrieNode::new()],
        }
    }

    /// Attach an interface and return its index for use in `add_route`.
    pub fn add_interface(&mut self, interface: NetworkInterface) -> usize {
        self.ports.push(Port {
            interface,
            inbound: VecDeque::new(),
        });
        self.ports.len() - 1
    }

    pub fn interface(&self, index: usize) -> &NetworkInterface {
        &self.ports[index].interface
    }

    pub fn interface_mut(&mut self, index: usize) -> &mut NetworkInterface {
        &mut self.ports[index].interface
    }

    /// Install a route: datagrams whose destination's top `prefix_len` bits
    /// equal those of `prefix` may be forwarded out `interface_index` toward
    /// `next_hop`. Prefix lengths over 32 are rejected.
    pub fn add_route(
        &mut self,
        prefix: Ipv4Addr,
        prefix_len: u8,
        next_hop: NextHop,
        interface_index: usize,
    ) {
        if prefix_len > 32 {
            log::warn!("ignoring route {}/{}: bad prefix length", prefix, prefix_len);
            return;
        }
        log::debug!(
            "route {}/{} via {:?} on interface {}",
            prefix,
            prefix_len,
            next_hop,
            interface_index
        );

        let bits = u32::from(prefix);
        let mut node = 0usize;
        for shift in (32 - prefix_len as u32..32).rev() {
            let bit = ((bits >> shift) & 1) as usize;
            node = match self.nodes[node].children[bit] {
                Some(child) => child,
                None => {
                    self.nodes.push(TrieNode::new());
                    let child = self.nodes.len() - 1;
                    self.nodes[node].children[bit] = Some(child);
                    child
                }
            };
        }
        self.nodes[node].entry = Some(RouteEntry {
            next_hop,
            interface_index,
        });
    }

    /// Hand a received frame to the interface at `index`; any IPv4 datagram
    /// it yields is queued for the next `route` call.
    pub fn receive_frame(&mut self, index: usize, frame: &EthernetFrame) {
        let port = &mut self.ports[index];
        if let Some(datagram) = port.interface.recv_frame(frame) {
            port.inbound.push_back(datagram);
        }
    }

    /// Forward every queued datagram: look up the longest matching prefix,
    /// decrement the TTL, and send out the matched interface. Datagrams with
    /// no matching route or an expired TTL are dropped.
    pub fn route(&mut self) {
        for index in 0..self.ports.len() {
            while let Some(mut datagram) = self.ports[index].inbound.pop_front() {
                let dst = datagram.header.dst_ip;
                let entry = match self.lookup(dst) {
                    Some(entry) => entry,
                    None => {
                        log::debug!("no route to {}, dropping", dst);
                        continue;
                    }
                };

                if datagram.header.ttl <= 1 {
                    log::debug!("TTL expired for datagram to {}, dropping", dst);
                    continue;
                }
                datagram.header.ttl -= 1;
                datagram.header.compute_checksum();

                let next_hop = match entry.next_hop {
                    NextHop::Gateway(gateway) => gateway,
                    NextHop::Direct => dst,
                };
                self.ports[entry.interface_index]
                    .interface
                    .send_datagram(datagram, next_hop);
            }
        }
    }

    /// Longest-prefix-match: walk the destination's bits from the top,
    /// remembering the deepest route entry seen (the root holds any /0
    /// default route).
    fn lookup(&self, dst: Ipv4Addr) -> Option<RouteEntry> {
        let bits = u32::from(dst);
        let mut node = 0usize;
        let mut best = self.nodes[0].entry.clone();
        for shift in (0..32).rev() {
            let bit = ((bits >> shift) & 1) as usize;
            match self.nodes[node].children[bit] {
                Some(child) => {
                    node = child;
                    if let Some(entry) = &self.nodes[node].entry {
                        best = Some(entry.clone());
                    }
                }
                None => break,
            }
        }
        best
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::MacAddr;

    fn router_with_two_interfaces() -> Router {
        let mut router = Router::new();
        router.add_interface(NetworkInterface::new(
            MacAddr::new([0x02, 0, 0, 0, 0, 0x01]),
            Ipv4Addr::new(192, 168, 0, 1),
        ));
        router.add_interface(NetworkInterface::new(
            MacAddr::new([0x02, 0, 0, 0, 0, 0x02]),
            Ipv4Addr::new(10, 0, 0, 1),
        ));
        router
    }

    fn lookup_interface(router: &Router, dst: Ipv4Addr) -> Option<usize> {
        router.lookup(dst).map(|entry| entry.interface_index)
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut router = router_with_two_interfaces();
        router.add_route(Ipv4Addr::new(0, 0, 0, 0), 0, NextHop::Direct, 0);
        router.add_route(Ipv4Addr::new(10, 0, 0, 0), 8, NextHop::Direct, 1);

        assert_eq!(lookup_interface(&router, Ipv4Addr::new(10, 1, 2, 3)), Some(1));
        assert_eq!(lookup_interface(&router, Ipv4Addr::new(8, 8, 8, 8)), Some(0));
    }

    #[test]
    fn test_host_route_beats_default() {
        let mut router = router_with_two_interfaces();
        router.add_route(Ipv4Addr::new(0, 0, 0, 0), 0, NextHop::Direct, 0);
        router.add_route(Ipv4Addr::new(10, 0, 0, 5), 32, NextHop::Direct, 1);

        assert_eq!(lookup_interface(&router, Ipv4Addr::new(10, 0, 0, 5)), Some(1));
        assert_eq!(lookup_interface(&router, Ipv4Addr::new(10, 0, 0, 6)), Some(0));
    }

    #[test]
    fn test_no_route_drops() {
        let mut router = router_with_two_interfaces();
        router.add_route(Ipv4Addr::new(10, 0, 0, 0), 8, NextHop::Direct, 1);
        assert_eq!(lookup_interface(&router, Ipv4Addr::new(192, 168, 5, 5)), None);
    }

    #[test]
    fn test_overlong_prefix_rejected() {
        let mut router = router_with_two_interfaces();
        router.add_route(Ipv4Addr::new(10, 0, 0, 0), 33, NextHop::Direct, 1);
        assert_eq!(lookup_interface(&router, Ipv4Addr::new(10, 0, 0, 1)), None);
    }

    #[test]
    fn test_route_forwards_via_matched_interface() {
        use crate::packet::EtherType;
        let mut router = router_with_two_interfaces();
        router.add_route(Ipv4Addr::new(10, 0, 0, 0), 8, NextHop::Direct, 1);

        let dgram = Ipv4Datagram::new(
            Ipv4Addr::new(192, 168, 0, 9),
            Ipv4Addr::new(10, 0, 0, 7),
            17,
            bytes::Bytes::from_static(b"x"),
        );
        router.ports[0].inbound.push_back(dgram);
        router.route();

        // The next hop is unresolved, so interface 1 starts with an ARP
        // request for 10.0.0.7.
        let frame = router.interface_mut(1).maybe_send().unwrap();
        assert_eq!(frame.ethertype, EtherType::Arp);
        assert!(router.interface_mut(0).maybe_send().is_none());
    }

    #[test]
    fn test_ttl_one_is_dropped() {
        let mut router = router_with_two_interfaces();
        router.add_route(Ipv4Addr::new(10, 0, 0, 0), 8, NextHop::Direct, 1);

        let mut dgram = Ipv4Datagram::new(
            Ipv4Addr::new(192, 168, 0, 9),
            Ipv4Addr::new(10, 0, 0, 7),
            17,
            bytes::Bytes::from_static(b"x"),
        );
        dgram.header.ttl = 1;
        dgram.header.compute_checksum();
        router.ports[0].inbound.push_back(dgram);
        router.route();

        assert!(router.interface_mut(1).maybe_send().is_none());
    }

    #[test]
    fn test_gateway_route_resolves_gateway_not_destination() {
        use crate::packet::{ArpMessage, EtherType};
        let gateway = Ipv4Addr::new(192, 168, 0, 254);
        let mut router = router_with_two_interfaces();
        router.add_route(Ipv4Addr::new(0, 0, 0, 0), 0, NextHop::Gateway(gateway), 0);

        let dgram = Ipv4Datagram::new(
            Ipv4Addr::new(10, 0, 0, 9),
            Ipv4Addr::new(1, 2, 3, 4),
            17,
            bytes::Bytes::from_static(b"x"),
        );
        router.ports[1].inbound.push_back(dgram);
        router.route();

        let frame = router.interface_mut(0).maybe_send().unwrap();
        assert_eq!(frame.ethertype, EtherType::Arp);
        let request = ArpMessage::parse(&frame.payload).unwrap();
        assert_eq!(request.target_ip, gateway);
    }
}
