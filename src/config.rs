//! Build-time limits of the emulated controller.
//!
//! Everything here is a compile-time constant: per-port capacities (mailboxes,
//! FIFO depth) are const generics of [`ChannelPort`](crate::protocol::controller::port::ChannelPort)
//! and never live in process-wide state.
use crate::protocol::controller::types::Bitrate;

/// Highest physical channel index accepted by `driver_init` (channels are 1-based).
pub const MAX_CHANNELS: u8 = 2;

/// Payload capacity of a frame: 8 bytes for classic CAN, 64 for ISO CAN FD.
pub const DATA_SIZE_MAX: usize = 64;

/// Payload capacity of a classic CAN frame.
pub const CLASSIC_DATA_SIZE_MAX: usize = 8;

/// Size of a serialized frame on the wire.
pub const WIRE_FRAME_SIZE: usize = 96;

/// Trailer closing every serialized frame.
pub const WIRE_MAGIC: [u8; 2] = [0xCA, 0x01];

/// Driver version reported by the hardware description.
pub const VERSION_MAJOR: u8 = 3;
/// Driver version reported by the hardware description.
pub const VERSION_MINOR: u8 = 8;

/// The serial emulation has no bit-timing clock; reported as zero.
pub const CONTROLLER_CLOCK_HZ: u32 = 0;

/// Timestamp resolution in nanoseconds (timestamps are carried, not generated).
pub const TIMESTAMP_RESOLUTION_NS: u32 = 1_000;

/// Whether CAN FD frames are handled by the controller.
pub const FD_SUPPORT: bool = cfg!(feature = "fd");

/// Slowest nominal bit-rate accepted by `set_bitrate`.
pub const BITRATE_MIN: Bitrate = Bitrate::Rate10K;
/// Fastest nominal bit-rate accepted by `set_bitrate`.
pub const BITRATE_MAX: Bitrate = Bitrate::Rate1M;
