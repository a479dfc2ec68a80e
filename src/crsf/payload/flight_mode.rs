//! Flight mode (0x21): NUL-terminated ASCII text, e.g. `"ACRO\0"`.

use serde::{Deserialize, Serialize};

use crate::crsf::protocol::{FrameType, CRSF_FLIGHT_MODE_MAX_PAYLOAD_SIZE};
use crate::error::{LinkError, Result};

/// Flight mode name reported by the flight controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightMode(pub String);

impl FlightMode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Decode a flight mode payload
///
/// The payload must end with its only NUL byte.
pub fn decode_flight_mode(payload: &[u8]) -> Result<FlightMode> {
    if payload.len() > CRSF_FLIGHT_MODE_MAX_PAYLOAD_SIZE {
        return Err(LinkError::PayloadLength {
            frame_type: FrameType::FlightMode as u8,
            expected: CRSF_FLIGHT_MODE_MAX_PAYLOAD_SIZE,
            actual: payload.len(),
        });
    }

    let Some((&0, text)) = payload.split_last() else {
        return Err(LinkError::InvalidPayload(
            "flight mode is not NUL-terminated".to_string(),
        ));
    };

    if text.contains(&0) || !text.is_ascii() {
        return Err(LinkError::InvalidPayload(format!(
            "flight mode contains invalid bytes: {:02X?}",
            text
        )));
    }

    let text = String::from_utf8(text.to_vec())
        .map_err(|e| LinkError::InvalidPayload(format!("flight mode: {}", e)))?;

    Ok(FlightMode(text))
}

/// Encode a flight mode into its NUL-terminated payload
///
/// # Errors
///
/// Returns `FieldOutOfRange` if the name is longer than 15 bytes and
/// `InvalidPayload` if it is not plain ASCII without NUL bytes
pub fn encode_flight_mode(mode: &FlightMode) -> Result<Vec<u8>> {
    let text = mode.0.as_bytes();

    if text.len() >= CRSF_FLIGHT_MODE_MAX_PAYLOAD_SIZE {
        return Err(LinkError::FieldOutOfRange {
            field: "flight_mode",
            value: text.len() as u64,
        });
    }

    if text.contains(&0) || !text.is_ascii() {
        return Err(LinkError::InvalidPayload(format!(
            "flight mode {:?} is not plain ASCII",
            mode.0
        )));
    }

    let mut payload = Vec::with_capacity(text.len() + 1);
    payload.extend_from_slice(text);
    payload.push(0);
    Ok(payload)
}
