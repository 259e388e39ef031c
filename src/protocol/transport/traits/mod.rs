//! Abstraction traits at the transport boundary (serial link and event handler).
pub mod can_handler;
pub mod serial_link;
