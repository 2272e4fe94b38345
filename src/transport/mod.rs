//! TCP transport: sequence numbers, segments, and the sender/receiver
//! state machines.

mod receiver;
mod segment;
mod sender;
mod sequence;
mod timer;

pub use receiver::TcpReceiver;
pub use segment::{AckMessage, Segment};
pub use sender::{TcpSender, TcpSenderConfig};
pub use sequence::SeqNum;
pub use timer::RetransmissionTimer;
