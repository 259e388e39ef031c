//! Sharing a [`ChannelPort`] between the application and the transport.
//!
//! Both sides call into the port synchronously, often from different contexts
//! (a task and an interrupt handler). [`SharedPort`] serialises them behind an
//! [`embassy_sync`] blocking mutex; the raw mutex is chosen by the firmware
//! (`CriticalSectionRawMutex` on a bare-metal target, `NoopRawMutex` when
//! everything runs in one context).
//!
//! [`EventForwarder`] is a [`CanHandler`] moving port events into a
//! pre-allocated [`Channel`] so async tasks can await them. Handlers run under
//! the port lock, so the forwarder never waits: a full channel drops the event
//! and counts it. No allocation is performed.
use core::cell::RefCell;

use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex},
    channel::Channel,
};

use crate::protocol::{
    controller::{port::ChannelPort, types::CanState},
    frame::CanFrame,
    transport::{CanHandler, SerialLink},
};

//==================================================================================SHARED_PORT
/// A port guarded by a blocking mutex.
pub struct SharedPort<M, L, H, const BUFFERS: usize, const DEPTH: usize>
where
    M: RawMutex,
    L: SerialLink,
    H: CanHandler,
{
    inner: Mutex<M, RefCell<ChannelPort<L, H, BUFFERS, DEPTH>>>,
}

impl<M, L, H, const BUFFERS: usize, const DEPTH: usize> SharedPort<M, L, H, BUFFERS, DEPTH>
where
    M: RawMutex,
    L: SerialLink,
    H: CanHandler,
{
    pub const fn new(port: ChannelPort<L, H, BUFFERS, DEPTH>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(port)),
        }
    }

    /// Run `f` with exclusive access to the port.
    ///
    /// Must not be re-entered from `f` (a handler calling back into the same
    /// `SharedPort` would hit the `RefCell` borrow).
    pub fn with<R>(&self, f: impl FnOnce(&mut ChannelPort<L, H, BUFFERS, DEPTH>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn into_inner(self) -> ChannelPort<L, H, BUFFERS, DEPTH> {
        self.inner.into_inner().into_inner()
    }
}

//==================================================================================EVENT_FORWARDER
/// Event emitted by a port and forwarded through a [`Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortEvent {
    Received { index: usize, frame: CanFrame },
    Transmitted { index: usize, frame: CanFrame },
    Error(CanState),
}

/// [`CanHandler`] pushing every event into a channel without waiting.
pub struct EventForwarder<'a, M: RawMutex, const CAP: usize> {
    channel: &'a Channel<M, PortEvent, CAP>,
    dropped: u32,
}

impl<'a, M: RawMutex, const CAP: usize> EventForwarder<'a, M, CAP> {
    pub fn new(channel: &'a Channel<M, PortEvent, CAP>) -> Self {
        Self { channel, dropped: 0 }
    }

    /// Events lost because the channel was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn forward(&mut self, event: PortEvent) {
        if self.channel.try_send(event).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("Event channel full, {} events dropped", self.dropped);
        }
    }
}

impl<M: RawMutex, const CAP: usize> CanHandler for EventForwarder<'_, M, CAP> {
    fn on_receive(&mut self, frame: &CanFrame, index: usize) {
        self.forward(PortEvent::Received {
            index,
            frame: *frame,
        });
    }

    fn on_transmit_complete(&mut self, frame: &CanFrame, index: usize) {
        self.forward(PortEvent::Transmitted {
            index,
            frame: *frame,
        });
    }

    fn on_error(&mut self, state: &CanState) {
        self.forward(PortEvent::Error(*state));
    }
}
