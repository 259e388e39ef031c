//! `korri-fullcan` library: a software "full-CAN" controller for `no_std`
//! targets. Classic CAN and ISO CAN FD frames are filtered into mailboxes and
//! FIFOs, and carried over a byte-oriented serial link as fixed 96-byte blocks.
//!
//! Nothing is allocated: mailbox count and FIFO depth are const generics of
//! [`ChannelPort`](protocol::controller::ChannelPort).
#![no_std]
//==================================================================================
/// Compile-time limits and identification of the emulated controller.
pub mod config;
/// Error types of the codec, the FIFOs and the controller operations.
pub mod error;
/// Wire codec moving frames across the serial link.
pub mod infra;
/// Frame model, controller (mailboxes, FIFOs, ports) and transport traits.
pub mod protocol;
//==================================================================================
