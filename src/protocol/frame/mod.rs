//! Canonical in-memory representation of a classic CAN / ISO CAN FD frame.
//!
//! The control flags are bit-packed in a single byte using the same layout as
//! the wire format (see [`crate::infra::codec::wire`]):
//!
//! | Bit | Meaning |
//! |-----|---------|
//! | 0 | extended identifier |
//! | 1 | FD format (FDF) |
//! | 2 | remote frame (classic only) |
//! | 3 | overrun |
//! | 6 | bit-rate switch (FD only) |
//! | 7 | error state indicator (FD only) |
//!
//! Flags that are meaningless for the current format are never stored: setting
//! them is a no-op and switching format clears them.
use crate::config::{CLASSIC_DATA_SIZE_MAX, DATA_SIZE_MAX};

pub mod dlc;
pub mod embedded;

pub use dlc::{dlc_to_size, mask_identifier, size_to_dlc, EXT_ID_MASK, STD_ID_MASK};

//==================================================================================CONTROL_BITS
pub const CTRL_EXT: u8 = 0x01;
pub const CTRL_FDF: u8 = 0x02;
pub const CTRL_RTR: u8 = 0x04;
pub const CTRL_OVR: u8 = 0x08;
pub const CTRL_BRS: u8 = 0x40;
pub const CTRL_ESI: u8 = 0x80;

const CTRL_FORMAT: u8 = CTRL_EXT | CTRL_FDF;

//==================================================================================FRAME_FORMAT
/// Frame format: identifier width and payload-length semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameFormat {
    /// Classic CAN, 11-bit identifier (CBFF).
    #[default]
    ClassicStd,
    /// Classic CAN, 29-bit identifier (CEFF).
    ClassicExt,
    /// ISO CAN FD, 11-bit identifier (FBFF).
    FdStd,
    /// ISO CAN FD, 29-bit identifier (FEFF).
    FdExt,
}

impl FrameFormat {
    /// Build a format from its two defining properties.
    pub const fn from_parts(extended: bool, fd: bool) -> Self {
        match (extended, fd) {
            (false, false) => FrameFormat::ClassicStd,
            (true, false) => FrameFormat::ClassicExt,
            (false, true) => FrameFormat::FdStd,
            (true, true) => FrameFormat::FdExt,
        }
    }

    /// Decode the format from a packed control byte (bits 0 and 1).
    pub const fn from_control(control: u8) -> Self {
        Self::from_parts(control & CTRL_EXT != 0, control & CTRL_FDF != 0)
    }

    /// 29-bit identifier?
    pub const fn is_extended(self) -> bool {
        matches!(self, FrameFormat::ClassicExt | FrameFormat::FdExt)
    }

    /// ISO CAN FD frame?
    pub const fn is_fd(self) -> bool {
        matches!(self, FrameFormat::FdStd | FrameFormat::FdExt)
    }

    /// Identifier mask matching the declared width.
    pub const fn id_mask(self) -> u32 {
        if self.is_extended() {
            EXT_ID_MASK
        } else {
            STD_ID_MASK
        }
    }

    /// Largest DLC accepted for this format.
    pub const fn dlc_max(self) -> u8 {
        if self.is_fd() {
            15
        } else {
            8
        }
    }

    /// Largest payload in bytes for this format.
    pub const fn data_size_max(self) -> usize {
        if self.is_fd() {
            DATA_SIZE_MAX
        } else {
            CLASSIC_DATA_SIZE_MAX
        }
    }

    const fn control_bits(self) -> u8 {
        let mut bits = 0;
        if self.is_extended() {
            bits |= CTRL_EXT;
        }
        if self.is_fd() {
            bits |= CTRL_FDF;
        }
        bits
    }
}

//==================================================================================BYTE_ORDER
/// Byte order used by the multi-byte payload accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    /// Most significant byte first (big-endian, Motorola).
    MsbFirst,
    /// Least significant byte first (little-endian, Intel).
    LsbFirst,
}

//==================================================================================TIMESTAMP
/// Reception/transmission time stamp attached to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub seconds: u32,
    /// Nanoseconds within the current second.
    pub nanos: u32,
}

//==================================================================================CAN_FRAME
/// A CAN or CAN FD frame.
///
/// The identifier is masked to the width of the declared format on every
/// write; reads return the stored value as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFrame {
    identifier: u32,
    dlc: u8,
    control: u8,
    data: [u8; DATA_SIZE_MAX],
    timestamp: Timestamp,
    user: u32,
    marker: u32,
}

impl Default for CanFrame {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl CanFrame {
    /// Classic standard frame, identifier 0, no payload.
    pub const EMPTY: CanFrame = CanFrame {
        identifier: 0,
        dlc: 0,
        control: 0,
        data: [0; DATA_SIZE_MAX],
        timestamp: Timestamp {
            seconds: 0,
            nanos: 0,
        },
        user: 0,
        marker: 0,
    };

    /// Create an empty frame of the given format; `identifier` is masked.
    pub const fn new(format: FrameFormat, identifier: u32) -> Self {
        let mut frame = Self::EMPTY;
        frame.control = format.control_bits();
        frame.identifier = mask_identifier(identifier, format);
        frame
    }

    /// Create a frame carrying `payload`.
    ///
    /// The DLC is the smallest one able to carry the payload; bytes beyond the
    /// format capacity are dropped and padding bytes (FD) stay zero.
    pub fn with_data(format: FrameFormat, identifier: u32, payload: &[u8]) -> Self {
        let mut frame = Self::new(format, identifier);
        frame.set_data_size(payload.len());
        let len = payload.len().min(frame.data_size());
        frame.data[..len].copy_from_slice(&payload[..len]);
        frame
    }

    /// Reset every field to the [`CanFrame::EMPTY`] state.
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    //==============================================================================FORMAT
    /// Current frame format.
    pub const fn format(&self) -> FrameFormat {
        FrameFormat::from_control(self.control)
    }

    /// Switch to another format.
    ///
    /// Going classic clears BRS/ESI and clamps the DLC to 8; going FD clears the
    /// remote flag. The identifier is re-masked to the new width.
    pub fn set_format(&mut self, format: FrameFormat) {
        self.control = (self.control & !CTRL_FORMAT) | format.control_bits();
        if format.is_fd() {
            self.control &= !CTRL_RTR;
        } else {
            self.control &= !(CTRL_BRS | CTRL_ESI);
            self.dlc = self.dlc.min(8);
        }
        self.identifier = mask_identifier(self.identifier, format);
    }

    /// 29-bit identifier?
    pub const fn is_extended(&self) -> bool {
        self.control & CTRL_EXT != 0
    }

    /// ISO CAN FD frame?
    pub const fn is_fd(&self) -> bool {
        self.control & CTRL_FDF != 0
    }

    //==============================================================================IDENTIFIER
    /// Stored identifier (already masked).
    pub const fn identifier(&self) -> u32 {
        self.identifier
    }

    /// Store `identifier`, masked to the width of the current format.
    pub fn set_identifier(&mut self, identifier: u32) {
        self.identifier = mask_identifier(identifier, self.format());
    }

    //==============================================================================DLC
    /// Raw Data Length Code.
    pub const fn dlc(&self) -> u8 {
        self.dlc
    }

    /// Store a DLC: masked to 4 bits, classic frames clamp to 8.
    pub fn set_dlc(&mut self, dlc: u8) {
        let dlc = dlc & 0x0F;
        self.dlc = if self.is_fd() { dlc } else { dlc.min(8) };
    }

    /// Payload size in bytes derived from the DLC.
    pub fn data_size(&self) -> usize {
        dlc_to_size(self.dlc, self.is_fd())
    }

    /// Set the DLC from a payload size (rounded up for FD).
    pub fn set_data_size(&mut self, size: usize) {
        self.dlc = size_to_dlc(size, self.is_fd());
    }

    //==============================================================================PAYLOAD
    /// Byte at `pos`, or 0 beyond the current payload size.
    pub fn data(&self, pos: usize) -> u8 {
        if pos < self.data_size() {
            self.data[pos]
        } else {
            0
        }
    }

    /// Write the byte at `pos`; ignored beyond the current payload size.
    pub fn set_data(&mut self, pos: usize, value: u8) {
        if pos < self.data_size() {
            self.data[pos] = value;
        }
    }

    /// Payload bytes covered by the DLC.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.data_size()]
    }

    /// Mutable payload bytes covered by the DLC.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let size = self.data_size();
        &mut self.data[..size]
    }

    /// The full 64-byte data area, including bytes past the DLC.
    pub fn raw_data(&self) -> &[u8; DATA_SIZE_MAX] {
        &self.data
    }

    pub(crate) fn raw_data_mut(&mut self) -> &mut [u8; DATA_SIZE_MAX] {
        &mut self.data
    }

    /// Read a 16-bit value at `pos`; 0 when it does not fit in the payload.
    pub fn data_u16(&self, pos: usize, order: ByteOrder) -> u16 {
        let Some(bytes) = self.window::<2>(pos) else {
            return 0;
        };
        match order {
            ByteOrder::MsbFirst => u16::from_be_bytes(bytes),
            ByteOrder::LsbFirst => u16::from_le_bytes(bytes),
        }
    }

    /// Read a 32-bit value at `pos`; 0 when it does not fit in the payload.
    pub fn data_u32(&self, pos: usize, order: ByteOrder) -> u32 {
        let Some(bytes) = self.window::<4>(pos) else {
            return 0;
        };
        match order {
            ByteOrder::MsbFirst => u32::from_be_bytes(bytes),
            ByteOrder::LsbFirst => u32::from_le_bytes(bytes),
        }
    }

    /// Write a 16-bit value at `pos`; ignored when it does not fit.
    pub fn set_data_u16(&mut self, pos: usize, value: u16, order: ByteOrder) {
        let bytes = match order {
            ByteOrder::MsbFirst => value.to_be_bytes(),
            ByteOrder::LsbFirst => value.to_le_bytes(),
        };
        self.write_window(pos, &bytes);
    }

    /// Write a 32-bit value at `pos`; ignored when it does not fit.
    pub fn set_data_u32(&mut self, pos: usize, value: u32, order: ByteOrder) {
        let bytes = match order {
            ByteOrder::MsbFirst => value.to_be_bytes(),
            ByteOrder::LsbFirst => value.to_le_bytes(),
        };
        self.write_window(pos, &bytes);
    }

    fn window<const N: usize>(&self, pos: usize) -> Option<[u8; N]> {
        let end = pos.checked_add(N)?;
        if end > self.data_size() {
            return None;
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[pos..end]);
        Some(bytes)
    }

    fn write_window(&mut self, pos: usize, bytes: &[u8]) {
        match pos.checked_add(bytes.len()) {
            Some(end) if end <= self.data_size() => self.data[pos..end].copy_from_slice(bytes),
            _ => {}
        }
    }

    //==============================================================================FLAGS
    /// Packed control byte (wire layout).
    pub const fn control(&self) -> u8 {
        self.control
    }

    /// Remote transmission request (classic frames only).
    pub const fn is_remote(&self) -> bool {
        self.control & CTRL_RTR != 0
    }

    /// Set or clear the remote flag; no-op on FD frames.
    pub fn set_remote(&mut self, remote: bool) {
        if !self.is_fd() {
            self.put_flag(CTRL_RTR, remote);
        }
    }

    /// Overrun marker: frames were lost before this one.
    pub const fn is_overrun(&self) -> bool {
        self.control & CTRL_OVR != 0
    }

    /// Set or clear the overrun marker.
    pub fn set_overrun(&mut self, overrun: bool) {
        self.put_flag(CTRL_OVR, overrun);
    }

    /// Bit-rate switch (FD frames only).
    pub const fn bitrate_switch(&self) -> bool {
        self.control & CTRL_BRS != 0
    }

    /// Set or clear BRS; no-op on classic frames.
    pub fn set_bitrate_switch(&mut self, brs: bool) {
        if self.is_fd() {
            self.put_flag(CTRL_BRS, brs);
        }
    }

    /// Error state indicator (FD frames only).
    pub const fn error_state_indicator(&self) -> bool {
        self.control & CTRL_ESI != 0
    }

    /// Set or clear ESI; no-op on classic frames.
    pub fn set_error_state_indicator(&mut self, esi: bool) {
        if self.is_fd() {
            self.put_flag(CTRL_ESI, esi);
        }
    }

    fn put_flag(&mut self, bit: u8, value: bool) {
        if value {
            self.control |= bit;
        } else {
            self.control &= !bit;
        }
    }

    //==============================================================================OPTIONAL_FIELDS
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Opaque application tag.
    pub const fn user(&self) -> u32 {
        self.user
    }

    pub fn set_user(&mut self, user: u32) {
        self.user = user;
    }

    /// Application-defined marker.
    pub const fn marker(&self) -> u32 {
        self.marker
    }

    pub fn set_marker(&mut self, marker: u32) {
        self.marker = marker;
    }
}
