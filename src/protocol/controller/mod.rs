//! Software full-CAN controller: mailboxes with acceptance filters, bounded
//! FIFOs and the per-channel port driving a serial link.
pub mod fifo;
pub mod mailbox;
pub mod port;
pub mod shared;
pub mod types;

pub use fifo::FifoQueue;
pub use mailbox::{Mailbox, MailboxTable};
pub use port::{ChannelPort, RxOutcome, RxReject};
pub use shared::{EventForwarder, PortEvent, SharedPort};
pub use types::{
    Bitrate, BusState, CanState, Direction, DriverState, ErrorKind, HardwareDescription, Mode,
    Statistics,
};
