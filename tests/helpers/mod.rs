// Test doubles simulating the serial link and collecting controller events
// during integration tests.
use korri_fullcan::{
    config::WIRE_FRAME_SIZE,
    protocol::{
        controller::{CanState, ChannelPort},
        frame::CanFrame,
        transport::{CanHandler, LinkDirection, SerialLink},
    },
};

#[derive(Debug, Default)]
#[allow(dead_code)]
/// In-memory serial link recording every block and configuration call.
pub struct MockLink {
    pub baudrate: Option<u32>,
    pub direction: Option<LinkDirection>,
    pub inits: usize,
    pub releases: usize,
    /// Blocks written and not yet delivered to the peer.
    pub outbox: Vec<Vec<u8>>,
    pub refuse_writes: bool,
}

impl SerialLink for MockLink {
    type Error = &'static str;

    fn init(&mut self, baudrate: u32) -> Result<(), Self::Error> {
        self.inits += 1;
        self.baudrate = Some(baudrate);
        Ok(())
    }

    fn release(&mut self) {
        self.releases += 1;
        self.baudrate = None;
    }

    fn set_direction(&mut self, direction: LinkDirection) {
        self.direction = Some(direction);
    }

    fn write(&mut self, block: &[u8]) -> Result<(), Self::Error> {
        if self.refuse_writes {
            return Err("link refused write");
        }
        assert_eq!(block.len(), WIRE_FRAME_SIZE);
        self.outbox.push(block.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
/// Event observed by [`RecordingHandler`].
pub enum Event {
    Received(usize, CanFrame),
    Transmitted(usize, CanFrame),
    Error(CanState),
}

#[derive(Debug, Default)]
#[allow(dead_code)]
/// Handler keeping every event in arrival order.
pub struct RecordingHandler {
    pub events: Vec<Event>,
}

#[allow(dead_code)]
impl RecordingHandler {
    pub fn received(&self) -> Vec<(usize, u32)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Received(index, frame) => Some((*index, frame.identifier())),
                _ => None,
            })
            .collect()
    }

    pub fn transmitted(&self) -> Vec<(usize, u32)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Transmitted(index, frame) => Some((*index, frame.identifier())),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<CanState> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Error(state) => Some(*state),
                _ => None,
            })
            .collect()
    }
}

impl CanHandler for RecordingHandler {
    fn on_receive(&mut self, frame: &CanFrame, index: usize) {
        self.events.push(Event::Received(index, *frame));
    }

    fn on_transmit_complete(&mut self, frame: &CanFrame, index: usize) {
        self.events.push(Event::Transmitted(index, *frame));
    }

    fn on_error(&mut self, state: &CanState) {
        self.events.push(Event::Error(*state));
    }
}

#[allow(dead_code)]
/// Move the oldest block written by `from` to `to`, then report completion
/// back to `from`. Returns `false` when `from` had nothing to send.
pub fn deliver_one<H1, H2, const B1: usize, const D1: usize, const B2: usize, const D2: usize>(
    from: &mut ChannelPort<MockLink, H1, B1, D1>,
    to: &mut ChannelPort<MockLink, H2, B2, D2>,
) -> bool
where
    H1: CanHandler,
    H2: CanHandler,
{
    if from.link().outbox.is_empty() {
        return false;
    }
    let block = from.link_mut().outbox.remove(0);
    to.on_bytes_received(&block);
    from.on_transmit_complete();
    true
}

#[allow(dead_code)]
/// Deliver blocks until `from` stops producing them; returns the count.
pub fn deliver_all<H1, H2, const B1: usize, const D1: usize, const B2: usize, const D2: usize>(
    from: &mut ChannelPort<MockLink, H1, B1, D1>,
    to: &mut ChannelPort<MockLink, H2, B2, D2>,
) -> usize
where
    H1: CanHandler,
    H2: CanHandler,
{
    let mut count = 0;
    while deliver_one(from, to) {
        count += 1;
    }
    count
}
