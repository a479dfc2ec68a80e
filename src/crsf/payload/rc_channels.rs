//! # RC Channels Codec
//!
//! 16 channels × 11 bits packed into 22 bytes as one continuous bitstream.
//! Channel `n` starts at bit `11 * n`, LSB first within each byte:
//!
//! ```text
//! Byte 0: Ch0[0:7]
//! Byte 1: Ch0[8:10] | Ch1[0:4]
//! Byte 2: Ch1[5:10] | Ch2[0:1]
//! ...
//! ```

use super::fixed_payload;
use crate::crsf::protocol::{
    FrameType, RcChannels, CRSF_CHANNEL_BITS, CRSF_CHANNEL_RAW_MAX, CRSF_NUM_CHANNELS,
    CRSF_RC_CHANNELS_PAYLOAD_SIZE,
};
use crate::error::Result;

/// Decode a packed RC channels payload
///
/// # Arguments
///
/// * `payload` - RC channels payload (exactly 22 bytes)
///
/// # Returns
///
/// * `Result<RcChannels>` - 16 raw 11-bit channel values
///
/// # Errors
///
/// Returns `PayloadLength` if the payload is not 22 bytes long
pub fn decode_rc_channels(payload: &[u8]) -> Result<RcChannels> {
    let payload: &[u8; CRSF_RC_CHANNELS_PAYLOAD_SIZE] =
        fixed_payload(FrameType::RcChannelsPacked, payload)?;

    let mut channels = [0u16; CRSF_NUM_CHANNELS];
    let mut bit_index = 0;

    for channel in channels.iter_mut() {
        for bit in 0..CRSF_CHANNEL_BITS {
            let byte_index = bit_index / 8;
            let bit_offset = bit_index % 8;
            if (payload[byte_index] >> bit_offset) & 1 == 1 {
                *channel |= 1 << bit;
            }
            bit_index += 1;
        }
    }

    Ok(channels)
}

/// Encode RC channels into payload (22 bytes)
///
/// Values above 2047 are clamped to 2047 before packing.
///
/// # Examples
///
/// ```
/// use crsf_link::crsf::payload::{decode_rc_channels, encode_rc_channels};
///
/// let channels = [992u16; 16];
/// let payload = encode_rc_channels(&channels);
/// assert_eq!(decode_rc_channels(&payload).unwrap(), channels);
/// ```
pub fn encode_rc_channels(channels: &RcChannels) -> [u8; CRSF_RC_CHANNELS_PAYLOAD_SIZE] {
    let mut payload = [0u8; CRSF_RC_CHANNELS_PAYLOAD_SIZE];
    let mut bit_index = 0;

    for &channel in channels.iter() {
        let value = channel.min(CRSF_CHANNEL_RAW_MAX);

        for bit in 0..CRSF_CHANNEL_BITS {
            if (value >> bit) & 1 == 1 {
                let byte_index = bit_index / 8;
                let bit_offset = bit_index % 8;
                payload[byte_index] |= 1 << bit_offset;
            }
            bit_index += 1;
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::protocol::CRSF_CHANNEL_VALUE_MID;
    use crate::error::LinkError;

    #[test]
    fn test_encode_all_zeros() {
        let payload = encode_rc_channels(&[0u16; CRSF_NUM_CHANNELS]);
        assert_eq!(payload, [0u8; 22]);
    }

    #[test]
    fn test_encode_all_max() {
        // 16 channels × 11 bits = 176 bits = 22 bytes, all ones
        let payload = encode_rc_channels(&[CRSF_CHANNEL_RAW_MAX; CRSF_NUM_CHANNELS]);
        assert_eq!(payload, [0xFFu8; 22]);
    }

    #[test]
    fn test_mid_point_bit_pattern() {
        let channels = [CRSF_CHANNEL_VALUE_MID; CRSF_NUM_CHANNELS];
        let payload = encode_rc_channels(&channels);

        // 992 = 0b011_1110_0000; 8 channels repeat every 11 bytes
        let half = [
            0xE0, 0x03, 0x1F, 0xF8, 0xC0, 0x07, 0x3E, 0xF0, 0x81, 0x0F, 0x7C,
        ];
        assert_eq!(&payload[..11], &half);
        assert_eq!(&payload[11..], &half);

        assert_eq!(decode_rc_channels(&payload).unwrap(), channels);
    }

    #[test]
    fn test_channel_straddling_bytes() {
        // Channel 7 occupies bits 77..=87: top 3 bits of byte 9 and all of byte 10
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        channels[7] = CRSF_CHANNEL_RAW_MAX;

        let payload = encode_rc_channels(&channels);
        assert_eq!(payload[9], 0xE0);
        assert_eq!(payload[10], 0xFF);
        assert_eq!(payload[11], 0x00);

        // Channel 8 starts on a byte boundary
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        channels[8] = 0x7FF;
        let payload = encode_rc_channels(&channels);
        assert_eq!(payload[10], 0x00);
        assert_eq!(payload[11], 0xFF);
        assert_eq!(payload[12], 0x07);
    }

    #[test]
    fn test_decode_known_payload() {
        // Channel n holds n * 100
        let payload = [
            0, 32, 3, 50, 88, 2, 25, 250, 96, 137, 87, 32, 35, 28, 250, 152, 8, 75, 138, 226,
            149, 187,
        ];
        let channels = decode_rc_channels(&payload).unwrap();
        for (i, &value) in channels.iter().enumerate() {
            assert_eq!(value, i as u16 * 100, "channel {}", i);
        }
    }

    #[test]
    fn test_round_trip_distinct_values() {
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        for (i, channel) in channels.iter_mut().enumerate() {
            *channel = (i as u16 * 131 + 7) & CRSF_CHANNEL_RAW_MAX;
        }
        channels[15] = CRSF_CHANNEL_RAW_MAX;

        let payload = encode_rc_channels(&channels);
        assert_eq!(decode_rc_channels(&payload).unwrap(), channels);
    }

    #[test]
    fn test_encode_clamping() {
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        channels[0] = 5000; // Over max

        let payload = encode_rc_channels(&channels);

        // Should clamp to 2047 (0x7FF)
        assert_eq!(payload[0], 0xFF);
        assert_eq!(payload[1], 0x07);
        assert_eq!(decode_rc_channels(&payload).unwrap()[0], 2047);
    }

    #[test]
    fn test_decode_wrong_length() {
        for len in [0, 21, 23] {
            let result = decode_rc_channels(&vec![0u8; len]);
            assert!(matches!(
                result,
                Err(LinkError::PayloadLength {
                    frame_type: 0x16,
                    expected: 22,
                    actual
                }) if actual == len
            ));
        }
    }
}
