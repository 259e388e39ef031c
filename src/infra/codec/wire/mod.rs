//! Fixed 96-byte serialization of a [`CanFrame`], used to move frames across a
//! process or transport boundary.
//!
//! All multi-byte integers are big-endian:
//!
//! ```text
//!  0..4   identifier (masked)      70..74  timestamp seconds
//!  4      DLC                      74..78  timestamp nanoseconds
//!  5      control byte             78..82  user field
//!  6..70  payload (64 bytes)       82..86  marker field
//!                                  86..94  reserved (zero)
//!                                  94..96  magic trailer 0xCA 0x01
//! ```
//!
//! The trailer is the only integrity check available: it is verified before
//! any other field is trusted.
use crate::{
    config::{DATA_SIZE_MAX, WIRE_FRAME_SIZE, WIRE_MAGIC},
    error::DecodeError,
    protocol::frame::{CanFrame, FrameFormat, Timestamp, CTRL_BRS, CTRL_ESI, CTRL_OVR, CTRL_RTR},
};

//==================================================================================OFFSETS
const ID_OFFSET: usize = 0;
const DLC_OFFSET: usize = 4;
const CTRL_OFFSET: usize = 5;
const DATA_OFFSET: usize = 6;
const SECONDS_OFFSET: usize = 70;
const NANOS_OFFSET: usize = 74;
const USER_OFFSET: usize = 78;
const MARKER_OFFSET: usize = 82;
const MAGIC_OFFSET: usize = 94;

/// A serialized frame.
pub type WireFrame = [u8; WIRE_FRAME_SIZE];

//==================================================================================SERIALIZE
/// Serialize `frame` into its wire representation.
pub fn serialize(frame: &CanFrame) -> WireFrame {
    let mut out = [0u8; WIRE_FRAME_SIZE];

    put_u32(&mut out, ID_OFFSET, frame.identifier());
    out[DLC_OFFSET] = frame.dlc();
    out[CTRL_OFFSET] = frame.control();
    out[DATA_OFFSET..DATA_OFFSET + DATA_SIZE_MAX].copy_from_slice(frame.raw_data());

    let timestamp = frame.timestamp();
    put_u32(&mut out, SECONDS_OFFSET, timestamp.seconds);
    put_u32(&mut out, NANOS_OFFSET, timestamp.nanos);
    put_u32(&mut out, USER_OFFSET, frame.user());
    put_u32(&mut out, MARKER_OFFSET, frame.marker());
    // Reserved bytes 86..94 stay zero.
    out[MAGIC_OFFSET..].copy_from_slice(&WIRE_MAGIC);

    out
}

//==================================================================================DESERIALIZE
/// Rebuild a frame from its wire representation.
///
/// Fails with [`DecodeError::BadLength`] unless `bytes` is exactly one wire
/// frame long, and with [`DecodeError::BadMagic`] when the trailer is wrong.
/// Reserved bytes and reserved control bits are ignored; control flags that are
/// invalid for the decoded format are dropped.
pub fn deserialize(bytes: &[u8]) -> Result<CanFrame, DecodeError> {
    if bytes.len() != WIRE_FRAME_SIZE {
        return Err(DecodeError::BadLength { len: bytes.len() });
    }

    let found = [bytes[MAGIC_OFFSET], bytes[MAGIC_OFFSET + 1]];
    if found != WIRE_MAGIC {
        return Err(DecodeError::BadMagic { found });
    }

    let control = bytes[CTRL_OFFSET];
    let mut frame = CanFrame::new(
        FrameFormat::from_control(control),
        get_u32(bytes, ID_OFFSET),
    );
    frame.set_dlc(bytes[DLC_OFFSET]);
    frame
        .raw_data_mut()
        .copy_from_slice(&bytes[DATA_OFFSET..DATA_OFFSET + DATA_SIZE_MAX]);

    frame.set_remote(control & CTRL_RTR != 0);
    frame.set_overrun(control & CTRL_OVR != 0);
    frame.set_bitrate_switch(control & CTRL_BRS != 0);
    frame.set_error_state_indicator(control & CTRL_ESI != 0);

    frame.set_timestamp(Timestamp {
        seconds: get_u32(bytes, SECONDS_OFFSET),
        nanos: get_u32(bytes, NANOS_OFFSET),
    });
    frame.set_user(get_u32(bytes, USER_OFFSET));
    frame.set_marker(get_u32(bytes, MARKER_OFFSET));

    Ok(frame)
}

fn put_u32(out: &mut [u8], offset: usize, value: u32) {
    out[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

fn get_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(word)
}
