//! CAN side of the crate: the frame model, the emulated controller, and the
//! transport boundary it drives.
pub mod controller;
pub mod frame;
pub mod transport;
