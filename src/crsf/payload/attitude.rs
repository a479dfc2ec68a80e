//! Attitude (0x1E): pitch, roll and yaw as big-endian i16 in 100 µrad.

use serde::{Deserialize, Serialize};

use super::fixed_payload;
use crate::crsf::protocol::{FrameType, CRSF_ATTITUDE_PAYLOAD_SIZE};
use crate::error::Result;

/// Wire units per radian
pub const ATTITUDE_UNITS_PER_RAD: f32 = 10_000.0;

/// Attitude telemetry data, in wire units (rad × 10000)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attitude {
    pub pitch: i16,
    pub roll: i16,
    pub yaw: i16,
}

impl Attitude {
    pub fn pitch_deg(&self) -> f32 {
        to_degrees(self.pitch)
    }

    pub fn roll_deg(&self) -> f32 {
        to_degrees(self.roll)
    }

    pub fn yaw_deg(&self) -> f32 {
        to_degrees(self.yaw)
    }
}

fn to_degrees(raw: i16) -> f32 {
    (f32::from(raw) / ATTITUDE_UNITS_PER_RAD).to_degrees()
}

/// Decode Attitude telemetry packet (6 bytes)
pub fn decode_attitude(payload: &[u8]) -> Result<Attitude> {
    let payload: &[u8; CRSF_ATTITUDE_PAYLOAD_SIZE] = fixed_payload(FrameType::Attitude, payload)?;

    Ok(Attitude {
        pitch: i16::from_be_bytes([payload[0], payload[1]]),
        roll: i16::from_be_bytes([payload[2], payload[3]]),
        yaw: i16::from_be_bytes([payload[4], payload[5]]),
    })
}

/// Encode Attitude into its 6-byte payload
pub fn encode_attitude(attitude: &Attitude) -> [u8; CRSF_ATTITUDE_PAYLOAD_SIZE] {
    let mut payload = [0u8; CRSF_ATTITUDE_PAYLOAD_SIZE];
    payload[0..2].copy_from_slice(&attitude.pitch.to_be_bytes());
    payload[2..4].copy_from_slice(&attitude.roll.to_be_bytes());
    payload[4..6].copy_from_slice(&attitude.yaw.to_be_bytes());
    payload
}
