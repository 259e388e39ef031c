//! Event sink of a port: receive, transmit-complete and error notifications.
use crate::protocol::{controller::types::CanState, frame::CanFrame};

/// Callbacks invoked synchronously by the controller.
///
/// Every method defaults to a no-op so implementors only override the events
/// they care about.
pub trait CanHandler {
    /// A frame matched a receive mailbox that has no FIFO bound.
    fn on_receive(&mut self, _frame: &CanFrame, _index: usize) {}
    /// The transport finished sending the frame of mailbox `index`.
    fn on_transmit_complete(&mut self, _frame: &CanFrame, _index: usize) {}
    /// A decode, match, FIFO or bus error occurred.
    fn on_error(&mut self, _state: &CanState) {}
}

/// Handler discarding every event.
impl CanHandler for () {}

impl<H: CanHandler + ?Sized> CanHandler for &mut H {
    fn on_receive(&mut self, frame: &CanFrame, index: usize) {
        (**self).on_receive(frame, index)
    }

    fn on_transmit_complete(&mut self, frame: &CanFrame, index: usize) {
        (**self).on_transmit_complete(frame, index)
    }

    fn on_error(&mut self, state: &CanState) {
        (**self).on_error(state)
    }
}
