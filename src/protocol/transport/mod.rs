//! Transport boundary: the serial link carrying serialized frames and the
//! handler receiving controller events.
pub mod traits;

pub use traits::{
    can_handler::CanHandler,
    serial_link::{LinkDirection, SerialLink},
};
