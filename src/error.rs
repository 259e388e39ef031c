//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (wire decoding, FIFO access,
//! controller ordering and parameter violations).
use thiserror_no_std::Error;

//================================================================================CODEC_ERROR

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while turning a serialized block back into a frame.
pub enum DecodeError {
    /// The block is not exactly one wire frame long.
    #[error("Bad wire frame length: {len}")]
    BadLength { len: usize },
    /// The trailing marker bytes are not the expected magic value.
    #[error("Bad wire frame trailer: {found:?}")]
    BadMagic { found: [u8; 2] },
}

//================================================================================FIFO_ERROR

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised by a bounded frame queue.
pub enum FifoError {
    /// Every slot is occupied; the frame was rejected.
    #[error("FIFO full")]
    Full,
    /// Nothing to dequeue.
    #[error("FIFO empty")]
    Empty,
}

//================================================================================CORE_ERROR

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Result values of the controller operations.
pub enum CoreError {
    /// Physical channel index outside `1..=MAX_CHANNELS`.
    #[error("Invalid channel")]
    Channel,
    /// The port has not been initialised (or a FIFO is not bound).
    #[error("Initialisation missing")]
    InitMissing,
    /// The port is already initialised.
    #[error("Initialisation failed")]
    InitFail,
    /// Mailbox index is out of range.
    #[error("Buffer index {index} out of range (max {max})")]
    Buffer { index: usize, max: usize },
    /// Bad start/size or DLC for data access.
    #[error("Invalid parameter")]
    Param,
    /// The bound FIFO holds no frame.
    #[error("FIFO empty")]
    FifoEmpty,
    /// The bound FIFO cannot take another frame.
    #[error("FIFO full")]
    FifoFull,
    /// The supplied FIFO cannot be used (zero capacity).
    #[error("Invalid FIFO parameter")]
    FifoParam,
    /// Bit-rate combination rejected.
    #[error("Invalid bitrate")]
    Bitrate,
    /// Mode or frame format not supported by this controller.
    #[error("Not supported")]
    NotSupported,
    /// The serial link refused a write or configuration request.
    #[error("Serial link failure")]
    Hardware,
}

impl From<FifoError> for CoreError {
    fn from(err: FifoError) -> Self {
        match err {
            FifoError::Full => CoreError::FifoFull,
            FifoError::Empty => CoreError::FifoEmpty,
        }
    }
}
