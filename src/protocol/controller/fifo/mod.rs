//! Bounded circular queue of frames, mirroring a hardware message FIFO.
//!
//! Capacity is fixed at compile time and a full queue rejects new frames:
//! nothing is ever overwritten or dropped silently.
use crate::{error::FifoError, protocol::frame::CanFrame};

/// Fixed-capacity FIFO of [`CanFrame`]s.
///
/// Cursor invariant: `count == (head_in - head_out) mod N`, with `count`
/// disambiguating the full and empty cases.
#[derive(Debug, Clone)]
pub struct FifoQueue<const N: usize> {
    frames: [CanFrame; N],
    index_in: usize,
    index_out: usize,
    count: usize,
}

impl<const N: usize> Default for FifoQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FifoQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            frames: [CanFrame::EMPTY; N],
            index_in: 0,
            index_out: 0,
            count: 0,
        }
    }

    /// Number of slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued frames.
    pub const fn len(&self) -> usize {
        self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub const fn is_full(&self) -> bool {
        self.count == N
    }

    /// Append a frame; rejected with [`FifoError::Full`] when no slot is free.
    pub fn push(&mut self, frame: CanFrame) -> Result<(), FifoError> {
        if self.is_full() {
            return Err(FifoError::Full);
        }
        self.frames[self.index_in] = frame;
        self.index_in = (self.index_in + 1) % N;
        self.count += 1;
        Ok(())
    }

    /// Remove the oldest frame.
    pub fn pop(&mut self) -> Result<CanFrame, FifoError> {
        if self.is_empty() {
            return Err(FifoError::Empty);
        }
        let frame = self.frames[self.index_out];
        self.index_out = (self.index_out + 1) % N;
        self.count -= 1;
        Ok(frame)
    }

    /// Oldest frame without removing it.
    pub fn peek(&self) -> Option<&CanFrame> {
        if self.is_empty() {
            None
        } else {
            Some(&self.frames[self.index_out])
        }
    }

    /// Drop every queued frame.
    pub fn clear(&mut self) {
        self.index_in = 0;
        self.index_out = 0;
        self.count = 0;
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
