//! # CRSF Frame Encoder
//!
//! Wraps payloads in the CRSF frame envelope: sync, size, type, payload, CRC.

use super::crc::crc8_dvb_s2;
use super::payload::{encode_rc_channels, Packet};
use super::protocol::*;
use crate::error::{LinkError, Result};

/// Encode a frame of any type
///
/// # Arguments
///
/// * `frame_type` - Frame type byte
/// * `payload` - Payload bytes (max 60)
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Complete frame: sync + size + type + payload + crc
///
/// # Errors
///
/// Returns `PayloadTooLarge` if the payload exceeds 60 bytes
///
/// # Examples
///
/// ```
/// use crsf_link::crsf::encoder::encode_frame;
///
/// let frame = encode_frame(0x16, &[0u8; 22]).unwrap();
/// assert_eq!(&frame[..3], &[0xC8, 24, 0x16]);
/// assert_eq!(frame[25], 239);
/// ```
pub fn encode_frame(frame_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > CRSF_MAX_PAYLOAD_SIZE {
        return Err(LinkError::PayloadTooLarge {
            len: payload.len(),
            max: CRSF_MAX_PAYLOAD_SIZE,
        });
    }

    let frame_size = (1 + payload.len() + 1) as u8;

    let mut frame = Vec::with_capacity(CRSF_HEADER_LEN + frame_size as usize);
    frame.push(CRSF_SYNC_BYTE); // Sync byte
    frame.push(frame_size); // Type + Payload + CRC
    frame.push(frame_type); // Type
    frame.extend_from_slice(payload); // Payload

    // CRC covers Type + Payload
    let crc = crc8_dvb_s2(&frame[CRSF_HEADER_LEN..]);
    frame.push(crc);

    Ok(frame)
}

/// Encode a raw frame
pub fn encode_raw_frame(frame: &RawFrame) -> Result<Vec<u8>> {
    encode_frame(frame.frame_type, &frame.payload)
}

/// Encode a typed packet into a complete frame
pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>> {
    encode_frame(packet.frame_type(), &packet.encode_payload()?)
}

/// Encode RC channels into a complete CRSF frame
///
/// # Arguments
///
/// * `channels` - Array of 16 channel values (11-bit: 0-2047)
///
/// # Returns
///
/// * `Vec<u8>` - Complete CRSF frame (26 bytes: sync + length + type + 22-byte payload + crc)
///
/// # Examples
///
/// ```
/// use crsf_link::crsf::encoder::encode_rc_channels_frame;
///
/// let channels = [992u16; 16]; // All channels at center
/// let frame = encode_rc_channels_frame(&channels);
/// assert_eq!(frame.len(), 26);
/// ```
pub fn encode_rc_channels_frame(channels: &RcChannels) -> Vec<u8> {
    let payload = encode_rc_channels(channels);

    let mut frame = Vec::with_capacity(CRSF_HEADER_LEN + CRSF_RC_CHANNELS_FRAME_LENGTH as usize);
    frame.push(CRSF_SYNC_BYTE);
    frame.push(CRSF_RC_CHANNELS_FRAME_LENGTH);
    frame.push(FrameType::RcChannelsPacked as u8);
    frame.extend_from_slice(&payload);

    let crc = crc8_dvb_s2(&frame[CRSF_HEADER_LEN..]);
    frame.push(crc);

    frame
}

/// Clamp a channel value to valid CRSF range (0-2047)
///
/// # Arguments
///
/// * `value` - Channel value to clamp
///
/// # Returns
///
/// * `u16` - Clamped value
pub fn clamp_channel_value(value: u16) -> u16 {
    value.min(CRSF_CHANNEL_RAW_MAX)
}
