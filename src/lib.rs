//! A minimal user-space TCP/IP stack.
//!
//! The crate is organized bottom-up:
//! - [`stream`]: a capacity-bounded byte stream and the reassembler that
//!   rebuilds it from out-of-order segments
//! - [`transport`]: wraparound sequence numbers and the TCP sender/receiver
//!   state machines with timer-driven retransmission
//! - [`packet`]: Ethernet, ARP and IPv4 wire formats
//! - [`interface`]: a link-layer interface that resolves next hops via ARP
//! - [`router`]: longest-prefix-match forwarding over a binary trie
//!
//! There is no real I/O or wall clock anywhere: all time-dependent behavior
//! advances through explicit `tick(ms)` calls, which keeps every component
//! deterministic and testable.

pub mod interface;
pub mod packet;
pub mod router;
pub mod stream;
pub mod transport;

pub use interface::NetworkInterface;
pub use packet::{
    ArpMessage, ArpOpcode, EtherType, EthernetFrame, Ipv4Datagram, Ipv4Header, MacAddr,
    PacketError,
};
pub use router::{NextHop, Router};
pub use stream::{ByteStream, Reassembler};
pub use transport::{
    AckMessage, RetransmissionTimer, Segment, SeqNum, TcpReceiver, TcpSender, TcpSenderConfig,
};
