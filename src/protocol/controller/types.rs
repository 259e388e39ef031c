//! Value types exchanged with the controller: directions, modes, bit-rates,
//! bus state, statistics and the hardware description.

/// Direction of a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    #[default]
    Receive,
    Transmit,
}

/// Operating mode requested through `set_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Transport disabled; pending sends are abandoned.
    Stop,
    /// Full duplex operation.
    Operation,
    /// Receive only.
    ListenOnly,
    /// Low-power mode (not available on a serial link).
    Sleep,
    /// Self test.
    SelfTest,
}

/// Software driver state of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    Uninit,
    /// Initialised; `Init(None)` until a mode has been applied.
    Init(Option<Mode>),
}

/// Bus health reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    #[default]
    Init,
    Sleeping,
    Active,
    Warn,
    Passive,
    /// Requires a mode reset by the host.
    Off,
}

/// Last error seen on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    #[default]
    None,
    /// A received block could not be decoded.
    Decode,
    /// No receive mailbox accepted the frame.
    NoMatch,
    /// The mailbox FIFO was full; the frame was rejected.
    FifoOverflow,
    /// The serial link refused a write.
    Transport,
    /// The transport reported a bus-level fault.
    Bus,
    /// The frame uses a format the controller does not handle.
    Unsupported,
}

/// Snapshot delivered to the error handler and returned by `can_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanState {
    pub bus_state: BusState,
    pub last_error: ErrorKind,
    pub rx_error_count: u8,
    pub tx_error_count: u8,
}

/// Frame counters of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    pub received: u32,
    pub transmitted: u32,
    pub errors: u32,
}

//==================================================================================BITRATE
/// Enumerated bit-rates, ordered by their numeric code.
///
/// The code ordering is what the validation uses; `Auto` sits between `1M`
/// and the FD data-phase rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bitrate {
    None = -1,
    Rate10K = 0,
    Rate20K = 1,
    Rate50K = 2,
    Rate100K = 3,
    Rate125K = 4,
    Rate250K = 5,
    Rate500K = 6,
    Rate800K = 7,
    Rate1M = 8,
    Auto = 9,
    Rate2M = 10,
    Rate4M = 11,
    Rate5M = 12,
}

impl Bitrate {
    /// Numeric code of the bit-rate.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Serial baud rate used to emulate this nominal bit-rate.
    pub const fn serial_baudrate(self) -> u32 {
        match self {
            Bitrate::Rate20K => 19_200,
            Bitrate::Rate50K => 57_600,
            Bitrate::Rate125K => 115_200,
            Bitrate::Rate250K => 256_000,
            _ => 115_200,
        }
    }
}

/// Static description of the emulated controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareDescription {
    pub version_major: u8,
    pub version_minor: u8,
    /// Bit 0: ISO CAN FD support.
    pub can_features: u8,
    pub driver_features: u8,
    pub max_buffers: usize,
    pub timestamp_resolution_ns: u32,
    pub clock_hz: u32,
    pub bitrate_min: Bitrate,
    pub bitrate_max: Bitrate,
    pub nominal_bitrate: Bitrate,
    pub data_bitrate: Bitrate,
}

/// `can_features` bit set when CAN FD frames are supported.
pub const CAN_FEATURE_FD: u8 = 0x01;
