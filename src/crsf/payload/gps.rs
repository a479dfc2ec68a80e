//! GPS (0x02), 15 bytes, big-endian.

use serde::{Deserialize, Serialize};

use super::fixed_payload;
use crate::crsf::protocol::{FrameType, CRSF_GPS_PAYLOAD_SIZE};
use crate::error::Result;

/// Offset added to altitude on the wire so that it stays unsigned
pub const GPS_ALTITUDE_OFFSET_M: i32 = 1000;

/// GPS telemetry data, in wire units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsData {
    /// Latitude in degrees × 10^7
    pub latitude: i32,

    /// Longitude in degrees × 10^7
    pub longitude: i32,

    /// Ground speed in km/h × 10
    pub ground_speed: u16,

    /// Heading in degrees × 100
    pub heading: u16,

    /// Altitude in meters + 1000
    pub altitude: u16,

    /// Number of satellites
    pub satellites: u8,
}

impl GpsData {
    /// Latitude in degrees
    pub fn latitude_deg(&self) -> f64 {
        f64::from(self.latitude) / 10_000_000.0
    }

    /// Longitude in degrees
    pub fn longitude_deg(&self) -> f64 {
        f64::from(self.longitude) / 10_000_000.0
    }

    /// Ground speed in km/h
    pub fn ground_speed_kmh(&self) -> f32 {
        f32::from(self.ground_speed) / 10.0
    }

    /// Heading in degrees
    pub fn heading_deg(&self) -> f32 {
        f32::from(self.heading) / 100.0
    }

    /// Altitude in meters
    pub fn altitude_m(&self) -> i32 {
        i32::from(self.altitude) - GPS_ALTITUDE_OFFSET_M
    }
}

/// Decode GPS telemetry packet
///
/// # Arguments
///
/// * `payload` - GPS payload (15 bytes)
///
/// # Returns
///
/// * `Result<GpsData>` - Decoded GPS data
pub fn decode_gps(payload: &[u8]) -> Result<GpsData> {
    let payload: &[u8; CRSF_GPS_PAYLOAD_SIZE] = fixed_payload(FrameType::Gps, payload)?;

    Ok(GpsData {
        latitude: i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]),
        longitude: i32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]),
        ground_speed: u16::from_be_bytes([payload[8], payload[9]]),
        heading: u16::from_be_bytes([payload[10], payload[11]]),
        altitude: u16::from_be_bytes([payload[12], payload[13]]),
        satellites: payload[14],
    })
}

/// Encode GPS data into its 15-byte payload
pub fn encode_gps(gps: &GpsData) -> [u8; CRSF_GPS_PAYLOAD_SIZE] {
    let mut payload = [0u8; CRSF_GPS_PAYLOAD_SIZE];
    payload[0..4].copy_from_slice(&gps.latitude.to_be_bytes());
    payload[4..8].copy_from_slice(&gps.longitude.to_be_bytes());
    payload[8..10].copy_from_slice(&gps.ground_speed.to_be_bytes());
    payload[10..12].copy_from_slice(&gps.heading.to_be_bytes());
    payload[12..14].copy_from_slice(&gps.altitude.to_be_bytes());
    payload[14] = gps.satellites;
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_gps() {
        // Latitude: 37.7749° N (San Francisco)
        // Longitude: -122.4194° W
        let lat_raw: i32 = 377_749_000; // 37.7749 × 10^7
        let lon_raw: i32 = -1_224_194_000; // -122.4194 × 10^7

        let payload = vec![
            // Latitude (4 bytes, big-endian)
            (lat_raw >> 24) as u8,
            (lat_raw >> 16) as u8,
            (lat_raw >> 8) as u8,
            lat_raw as u8,
            // Longitude (4 bytes, big-endian)
            (lon_raw >> 24) as u8,
            (lon_raw >> 16) as u8,
            (lon_raw >> 8) as u8,
            lon_raw as u8,
            // Ground speed: 25.5 km/h = 255 (× 10)
            0x00,
            0xFF,
            // Heading: 90.0° = 9000 (× 100)
            0x23,
            0x28,
            // Altitude: 100m = 1100 (+ 1000)
            0x04,
            0x4C,
            // Satellites: 12
            12,
        ];

        let gps = decode_gps(&payload).unwrap();
        assert_eq!(gps.latitude, lat_raw);
        assert_eq!(gps.longitude, lon_raw);
        assert!((gps.latitude_deg() - 37.7749).abs() < 0.0001);
        assert!((gps.longitude_deg() - (-122.4194)).abs() < 0.0001);
        assert!((gps.ground_speed_kmh() - 25.5).abs() < 0.01);
        assert!((gps.heading_deg() - 90.0).abs() < 0.01);
        assert_eq!(gps.altitude_m(), 100);
        assert_eq!(gps.satellites, 12);
    }

    #[test]
    fn test_altitude_below_offset() {
        let gps = GpsData {
            latitude: 0,
            longitude: 0,
            ground_speed: 0,
            heading: 0,
            altitude: 900,
            satellites: 0,
        };
        assert_eq!(gps.altitude_m(), -100);
    }

    #[test]
    fn test_encode_round_trip() {
        let gps = GpsData {
            latitude: -338_688_000,
            longitude: 1_512_093_000,
            ground_speed: 1234,
            heading: 35_999,
            altitude: 65_535,
            satellites: 31,
        };

        let payload = encode_gps(&gps);
        assert_eq!(&payload[0..4], &(-338_688_000i32).to_be_bytes());
        assert_eq!(decode_gps(&payload).unwrap(), gps);
    }

    #[test]
    fn test_decode_gps_wrong_length() {
        assert!(decode_gps(&[0u8; 10]).is_err());
        assert!(decode_gps(&[0u8; 16]).is_err());
    }
}
