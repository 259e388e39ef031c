//! Per-channel table of mailboxes (message buffers).
//!
//! Each mailbox emulates one hardware message object: a direction, an
//! identifier/acceptance-mask filter, a frame format, a resident frame (the
//! transmit slot or the last received frame) and an optional bound FIFO.
//! Mailbox order is the priority order for matching and deferred sends.
use crate::{
    error::CoreError,
    protocol::{
        controller::{fifo::FifoQueue, types::Direction},
        frame::{mask_identifier, CanFrame, FrameFormat},
    },
};

//==================================================================================MAILBOX
/// One configurable buffer slot.
#[derive(Debug, Clone)]
pub struct Mailbox<const DEPTH: usize> {
    index: usize,
    valid: bool,
    direction: Direction,
    identifier: u32,
    accept_mask: u32,
    format: FrameFormat,
    frame: CanFrame,
    fifo: Option<FifoQueue<DEPTH>>,
    pending: bool,
}

impl<const DEPTH: usize> Mailbox<DEPTH> {
    const fn new(index: usize) -> Self {
        Self {
            index,
            valid: false,
            direction: Direction::Receive,
            identifier: 0,
            accept_mask: 0,
            format: FrameFormat::ClassicStd,
            frame: CanFrame::EMPTY,
            fifo: None,
            pending: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Configured and not released?
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    pub fn accept_mask(&self) -> u32 {
        self.accept_mask
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Resident frame: the transmit slot or the last received frame.
    pub fn frame(&self) -> &CanFrame {
        &self.frame
    }

    pub(crate) fn frame_mut(&mut self) -> &mut CanFrame {
        &mut self.frame
    }

    /// A transmit is queued behind a busy transport.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    pub fn fifo(&self) -> Option<&FifoQueue<DEPTH>> {
        self.fifo.as_ref()
    }

    pub(crate) fn fifo_mut(&mut self) -> Option<&mut FifoQueue<DEPTH>> {
        self.fifo.as_mut()
    }

    /// Acceptance test for an incoming identifier of the given format.
    ///
    /// Identifier widths are never cross-matched; FD and classic frames of the
    /// same width share the filter.
    pub fn accepts(&self, identifier: u32, format: FrameFormat) -> bool {
        format.is_extended() == self.format.is_extended()
            && (identifier & self.accept_mask) == (self.identifier & self.accept_mask)
    }
}

//==================================================================================MAILBOX_TABLE
/// Fixed array of `BUFFERS` mailboxes, each able to own a FIFO of `DEPTH` frames.
#[derive(Debug, Clone)]
pub struct MailboxTable<const BUFFERS: usize, const DEPTH: usize> {
    mailboxes: [Mailbox<DEPTH>; BUFFERS],
}

impl<const BUFFERS: usize, const DEPTH: usize> Default for MailboxTable<BUFFERS, DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BUFFERS: usize, const DEPTH: usize> MailboxTable<BUFFERS, DEPTH> {
    /// Create a table of unconfigured mailboxes.
    pub fn new() -> Self {
        Self {
            mailboxes: core::array::from_fn(Mailbox::new),
        }
    }

    /// Number of mailboxes.
    pub const fn capacity(&self) -> usize {
        BUFFERS
    }

    /// Unconfigure every mailbox and drop every bound FIFO.
    pub fn reset(&mut self) {
        for (index, mailbox) in self.mailboxes.iter_mut().enumerate() {
            *mailbox = Mailbox::new(index);
        }
    }

    pub fn get(&self, index: usize) -> Result<&Mailbox<DEPTH>, CoreError> {
        self.mailboxes.get(index).ok_or(CoreError::Buffer {
            index,
            max: BUFFERS,
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Mailbox<DEPTH>, CoreError> {
        self.mailboxes.get_mut(index).ok_or(CoreError::Buffer {
            index,
            max: BUFFERS,
        })
    }

    /// Iterate over all mailboxes in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Mailbox<DEPTH>> {
        self.mailboxes.iter()
    }

    /// Configure a mailbox.
    ///
    /// Identifier and mask are masked to the width of `format`. The resident
    /// frame takes the new format and identifier; the bound FIFO, the payload
    /// and the pending flag are preserved.
    pub fn configure(
        &mut self,
        index: usize,
        direction: Direction,
        identifier: u32,
        accept_mask: u32,
        format: FrameFormat,
    ) -> Result<(), CoreError> {
        let mailbox = self.get_mut(index)?;
        mailbox.valid = true;
        mailbox.direction = direction;
        mailbox.identifier = mask_identifier(identifier, format);
        mailbox.accept_mask = mask_identifier(accept_mask, format);
        mailbox.format = format;
        mailbox.frame.set_format(format);
        mailbox.frame.set_identifier(identifier);
        Ok(())
    }

    /// Invalidate a mailbox: it no longer matches nor transmits.
    pub fn release(&mut self, index: usize) -> Result<(), CoreError> {
        let mailbox = self.get_mut(index)?;
        mailbox.valid = false;
        mailbox.pending = false;
        Ok(())
    }

    /// Bind `fifo` to a mailbox, returning the previously bound one.
    pub fn bind_fifo(
        &mut self,
        index: usize,
        fifo: FifoQueue<DEPTH>,
    ) -> Result<Option<FifoQueue<DEPTH>>, CoreError> {
        let mailbox = self.get_mut(index)?;
        Ok(mailbox.fifo.replace(fifo))
    }

    /// Unbind and return the FIFO of a mailbox.
    pub fn release_fifo(&mut self, index: usize) -> Result<Option<FifoQueue<DEPTH>>, CoreError> {
        let mailbox = self.get_mut(index)?;
        Ok(mailbox.fifo.take())
    }

    /// First valid mailbox of `direction` accepting the identifier/format pair.
    pub fn match_incoming(
        &self,
        identifier: u32,
        format: FrameFormat,
        direction: Direction,
    ) -> Option<usize> {
        self.mailboxes
            .iter()
            .position(|mb| mb.valid && mb.direction == direction && mb.accepts(identifier, format))
    }

    /// Lowest-index mailbox with a deferred transmit.
    pub fn first_pending(&self) -> Option<usize> {
        self.mailboxes.iter().position(|mb| mb.valid && mb.pending)
    }

    /// Abandon every deferred transmit and empty the transmit FIFOs.
    ///
    /// Receive FIFOs keep their frames.
    pub fn flush_transmit(&mut self) {
        for mailbox in self.mailboxes.iter_mut() {
            mailbox.pending = false;
            if mailbox.direction != Direction::Transmit {
                continue;
            }
            if let Some(fifo) = mailbox.fifo.as_mut() {
                fifo.clear();
            }
        }
    }
}
