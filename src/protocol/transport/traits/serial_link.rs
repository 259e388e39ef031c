//! Minimal abstraction for the byte-oriented link carrying serialized frames
//! (a UART, a pipe, a socket). Lets the controller plug into any HAL or host
//! driver without owning the I/O itself.

/// Directions enabled on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkDirection {
    None,
    Rx,
    RxTx,
}

/// Contract of the serial transport driving a [`ChannelPort`](crate::protocol::controller::port::ChannelPort).
///
/// Every method must return immediately. Completion of a [`write`](SerialLink::write)
/// is reported back through `ChannelPort::on_transmit_complete`, received blocks
/// through `ChannelPort::on_bytes_received`.
pub trait SerialLink {
    type Error: core::fmt::Debug;

    /// (Re)open the link at `baudrate`.
    fn init(&mut self, baudrate: u32) -> Result<(), Self::Error>;
    /// Close the link; an in-flight write is abandoned.
    fn release(&mut self);
    /// Enable or disable the receive/transmit directions.
    fn set_direction(&mut self, direction: LinkDirection);
    /// Start writing one block. The buffer may be reused once this returns.
    fn write(&mut self, block: &[u8]) -> Result<(), Self::Error>;
}
