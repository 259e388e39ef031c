//! `embedded-can` interoperability: lets classic frames flow through any HAL
//! driver built on the `embedded_can::Frame` trait.
use embedded_can::{ExtendedId, Frame, Id, StandardId};

use super::{CanFrame, FrameFormat};

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let (format, raw) = split_id(id.into());
        Some(CanFrame::with_data(format, raw, data))
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > 8 {
            return None;
        }
        let (format, raw) = split_id(id.into());
        let mut frame = CanFrame::new(format, raw);
        frame.set_remote(true);
        frame.set_data_size(dlc);
        Some(frame)
    }

    fn is_extended(&self) -> bool {
        CanFrame::is_extended(self)
    }

    fn is_remote_frame(&self) -> bool {
        self.is_remote()
    }

    fn id(&self) -> Id {
        // The stored identifier is always masked, so the constructors cannot fail.
        if CanFrame::is_extended(self) {
            Id::Extended(ExtendedId::new(self.identifier()).unwrap_or(ExtendedId::ZERO))
        } else {
            Id::Standard(StandardId::new(self.identifier() as u16).unwrap_or(StandardId::ZERO))
        }
    }

    fn dlc(&self) -> usize {
        CanFrame::dlc(self) as usize
    }

    fn data(&self) -> &[u8] {
        if self.is_remote() {
            &[]
        } else {
            self.payload()
        }
    }
}

fn split_id(id: Id) -> (FrameFormat, u32) {
    match id {
        Id::Standard(id) => (FrameFormat::ClassicStd, id.as_raw() as u32),
        Id::Extended(id) => (FrameFormat::ClassicExt, id.as_raw()),
    }
}
