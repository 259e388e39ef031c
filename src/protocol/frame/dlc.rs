//! Data Length Code tables and identifier masking.
//!
//! Classic CAN maps DLC 0..8 one-to-one onto the payload size. ISO CAN FD keeps
//! that mapping up to 8 and then steps through 12, 16, 20, 24, 32, 48 and 64
//! bytes for DLC 9..15.
use super::FrameFormat;

/// Identifier mask of an 11-bit (standard) identifier.
pub const STD_ID_MASK: u32 = 0x0000_07FF;
/// Identifier mask of a 29-bit (extended) identifier.
pub const EXT_ID_MASK: u32 = 0x1FFF_FFFF;

/// Payload sizes of the CAN FD DLC values 0..15.
const FD_SIZES: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Convert a raw DLC into a payload size in bytes.
///
/// Classic frames treat DLC 9..15 as 8 bytes (ISO 11898-1). Any DLC above 15
/// is invalid and yields 0.
pub fn dlc_to_size(dlc: u8, is_fd: bool) -> usize {
    match dlc {
        0..=8 => dlc as usize,
        9..=15 if is_fd => FD_SIZES[dlc as usize],
        9..=15 => 8,
        _ => 0,
    }
}

/// Convert a payload size into the smallest DLC able to carry it.
///
/// Boundaries are inclusive on the lower side: 12 bytes encode as DLC 9, 13
/// bytes as DLC 10. Classic sizes are clamped to 8, FD sizes above 64 to 15.
pub fn size_to_dlc(size: usize, is_fd: bool) -> u8 {
    if !is_fd {
        return size.min(8) as u8;
    }

    FD_SIZES
        .iter()
        .position(|&table_size| table_size >= size)
        .unwrap_or(15) as u8
}

/// Mask an identifier to the width declared by `format`.
pub const fn mask_identifier(identifier: u32, format: FrameFormat) -> u32 {
    if format.is_extended() {
        identifier & EXT_ID_MASK
    } else {
        identifier & STD_ID_MASK
    }
}
