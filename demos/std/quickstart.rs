//! # Quickstart Example
//!
//! Two emulated controllers connected by an in-memory "serial cable":
//! - Configure transmit and receive mailboxes
//! - Queue frames while the link is busy
//! - Filter traffic into a FIFO and into the receive handler
//!
//! This example uses `std` for a quick trial run.
//!
//! ```bash
//! cargo run --example quickstart
//! ```

use std::collections::VecDeque;

use korri_fullcan::protocol::{
    controller::{Bitrate, CanState, ChannelPort, Direction, FifoQueue, Mode},
    frame::{ByteOrder, CanFrame, FrameFormat},
    transport::{CanHandler, LinkDirection, SerialLink},
};

/// One end of the cable: blocks written here wait until `pump` moves them.
#[derive(Default)]
struct Cable {
    baudrate: u32,
    pending: VecDeque<Vec<u8>>,
}

impl SerialLink for Cable {
    type Error = ();

    fn init(&mut self, baudrate: u32) -> Result<(), ()> {
        self.baudrate = baudrate;
        Ok(())
    }

    fn release(&mut self) {
        self.pending.clear();
    }

    fn set_direction(&mut self, _direction: LinkDirection) {}

    fn write(&mut self, block: &[u8]) -> Result<(), ()> {
        self.pending.push_back(block.to_vec());
        Ok(())
    }
}

/// Prints every event it sees.
struct Console(&'static str);

impl CanHandler for Console {
    fn on_receive(&mut self, frame: &CanFrame, index: usize) {
        println!(
            "   [{}] rx mailbox {} id 0x{:03X} data {:02X?}",
            self.0,
            index,
            frame.identifier(),
            frame.payload()
        );
    }

    fn on_transmit_complete(&mut self, frame: &CanFrame, index: usize) {
        println!(
            "   [{}] tx mailbox {} id 0x{:03X} done",
            self.0,
            index,
            frame.identifier()
        );
    }

    fn on_error(&mut self, state: &CanState) {
        println!("   [{}] error: {:?}", self.0, state);
    }
}

type Node = ChannelPort<Cable, Console, 8, 4>;

fn start(channel: u8, name: &'static str) -> Node {
    let mut node = Node::new(Cable::default());
    node.driver_init(channel, Console(name))
        .expect("fresh port");
    node.set_bitrate(Bitrate::Rate250K, Bitrate::None)
        .expect("valid bitrate");
    node.set_mode(Mode::Operation).expect("operation mode");
    node
}

/// Deliver everything `from` wrote, completing each write in turn.
fn pump(from: &mut Node, to: &mut Node) {
    while let Some(block) = from.link_mut().pending.pop_front() {
        let outcome = to.on_bytes_received(&block);
        println!("   link -> {:?}", outcome);
        from.on_transmit_complete();
    }
}

fn main() {
    println!("=== korri-fullcan Quickstart ===\n");

    // ======================================================================
    // 1. Bring up two channels
    // ======================================================================
    println!("1. Starting two channels at 250 kbit/s");
    let mut engine = start(1, "engine");
    let mut display = start(2, "display");
    println!("   Serial link: {} Bd\n", engine.link().baudrate);

    // ======================================================================
    // 2. Configure mailboxes
    // ======================================================================
    println!("2. Configuring mailboxes");
    engine
        .buffer_config(0, 0x100, 0x7FF, FrameFormat::ClassicStd, Direction::Transmit)
        .expect("tx mailbox");
    engine
        .buffer_config(1, 0x200, 0x7FF, FrameFormat::ClassicStd, Direction::Transmit)
        .expect("tx mailbox");
    // 0x100..=0x1FF land in a FIFO, 0x200 goes to the handler
    display
        .buffer_config(0, 0x100, 0x700, FrameFormat::ClassicStd, Direction::Receive)
        .expect("rx mailbox");
    display
        .fifo_config(0, FifoQueue::new())
        .expect("rx fifo");
    display
        .buffer_config(1, 0x200, 0x7FF, FrameFormat::ClassicStd, Direction::Receive)
        .expect("rx mailbox");
    println!("   done\n");

    // ======================================================================
    // 3. Send while the link is busy
    // ======================================================================
    println!("3. Sending two frames back to back");
    engine
        .buffer_set_data(0, &1500u16.to_be_bytes(), 0)
        .expect("rpm payload");
    engine.buffer_set_dlc(0, 2).expect("dlc");
    engine.buffer_set_data(1, &[0x5A], 0).expect("status payload");
    engine.buffer_set_dlc(1, 1).expect("dlc");

    engine.buffer_send(0).expect("send rpm");
    engine.buffer_send(1).expect("send status");
    println!(
        "   mailbox 1 pending behind mailbox 0: {}",
        engine.mailbox(1).map(|mb| mb.is_pending()).unwrap_or(false)
    );
    pump(&mut engine, &mut display);
    println!();

    // ======================================================================
    // 4. Drain the receive FIFO
    // ======================================================================
    println!("4. Reading the receive FIFO");
    while let Ok(frame) = display.fifo_read(0) {
        println!(
            "   id 0x{:03X} rpm {}",
            frame.identifier(),
            frame.data_u16(0, ByteOrder::MsbFirst)
        );
    }
    println!();

    // ======================================================================
    // 5. Statistics
    // ======================================================================
    println!("5. Statistics");
    println!("   engine:  {:?}", engine.statistics());
    println!("   display: {:?}", display.statistics());
    println!("   hardware: {:?}\n", display.hardware_description());

    println!("Quickstart complete.");
}
