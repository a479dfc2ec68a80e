//! Battery sensor (0x08). All multi-byte fields are big-endian.
//!
//! | Offset | Size | Field         | Unit     |
//! |--------|------|---------------|----------|
//! | 0      | 2    | voltage       | 0.1 V    |
//! | 2      | 2    | current       | 0.1 A    |
//! | 4      | 3    | capacity used | mAh      |
//! | 7      | 1    | remaining     | %        |

use serde::{Deserialize, Serialize};

use super::fixed_payload;
use crate::crsf::protocol::{FrameType, CRSF_BATTERY_SENSOR_PAYLOAD_SIZE};
use crate::error::{LinkError, Result};

/// Largest capacity representable in the 24-bit field
pub const BATTERY_CAPACITY_MAX: u32 = 0x00FF_FFFF;

/// Battery sensor telemetry data, in wire units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterySensor {
    /// Voltage in decivolts (V × 10)
    pub voltage: u16,

    /// Current in deciamperes (A × 10)
    pub current: u16,

    /// Capacity used in mAh (24 bits)
    pub capacity_used: u32,

    /// Battery remaining percentage (0-100%)
    pub remaining_percent: u8,
}

impl BatterySensor {
    /// Battery voltage in volts
    pub fn voltage_volts(&self) -> f32 {
        f32::from(self.voltage) / 10.0
    }

    /// Current draw in amperes
    pub fn current_amps(&self) -> f32 {
        f32::from(self.current) / 10.0
    }
}

/// Decode Battery Sensor telemetry packet
///
/// # Arguments
///
/// * `payload` - Battery Sensor payload (8 bytes)
///
/// # Returns
///
/// * `Result<BatterySensor>` - Decoded battery sensor data
pub fn decode_battery_sensor(payload: &[u8]) -> Result<BatterySensor> {
    let payload: &[u8; CRSF_BATTERY_SENSOR_PAYLOAD_SIZE] =
        fixed_payload(FrameType::BatterySensor, payload)?;

    Ok(BatterySensor {
        voltage: u16::from_be_bytes([payload[0], payload[1]]),
        current: u16::from_be_bytes([payload[2], payload[3]]),
        capacity_used: u32::from_be_bytes([0, payload[4], payload[5], payload[6]]),
        remaining_percent: payload[7],
    })
}

/// Encode Battery Sensor into its 8-byte payload
///
/// # Errors
///
/// Returns `FieldOutOfRange` if `capacity_used` does not fit in 24 bits
pub fn encode_battery_sensor(
    battery: &BatterySensor,
) -> Result<[u8; CRSF_BATTERY_SENSOR_PAYLOAD_SIZE]> {
    if battery.capacity_used > BATTERY_CAPACITY_MAX {
        return Err(LinkError::FieldOutOfRange {
            field: "capacity_used",
            value: u64::from(battery.capacity_used),
        });
    }

    let mut payload = [0u8; CRSF_BATTERY_SENSOR_PAYLOAD_SIZE];
    payload[0..2].copy_from_slice(&battery.voltage.to_be_bytes());
    payload[2..4].copy_from_slice(&battery.current.to_be_bytes());
    payload[4..7].copy_from_slice(&battery.capacity_used.to_be_bytes()[1..]);
    payload[7] = battery.remaining_percent;

    Ok(payload)
}
