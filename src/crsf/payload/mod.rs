//! # Payload Codecs
//!
//! Translate raw frame payloads into typed readings and back.
//!
//! Each frame-type family has its own module with a `decode_*` function
//! (exact payload length required) and an `encode_*` function that is its
//! exact inverse. [`Packet`] ties them together as a closed sum type.

use serde::{Deserialize, Serialize};

use super::protocol::{FrameType, RawFrame, RcChannels};
use crate::error::{LinkError, Result};

pub mod attitude;
pub mod battery;
pub mod flight_mode;
pub mod gps;
pub mod link_statistics;
pub mod rc_channels;

pub use attitude::{decode_attitude, encode_attitude, Attitude};
pub use battery::{decode_battery_sensor, encode_battery_sensor, BatterySensor};
pub use flight_mode::{decode_flight_mode, encode_flight_mode, FlightMode};
pub use gps::{decode_gps, encode_gps, GpsData};
pub use link_statistics::{decode_link_statistics, encode_link_statistics, LinkStatistics};
pub use rc_channels::{decode_rc_channels, encode_rc_channels};

/// Borrow `payload` as a fixed-size array, or report the length mismatch
pub(crate) fn fixed_payload<const N: usize>(
    frame_type: FrameType,
    payload: &[u8],
) -> Result<&[u8; N]> {
    payload.try_into().map_err(|_| LinkError::PayloadLength {
        frame_type: frame_type as u8,
        expected: N,
        actual: payload.len(),
    })
}

/// A decoded CRSF frame
///
/// Frame types without a codec, including extended frames, are kept as
/// [`Packet::Unrecognized`] so newer transmitters do not break decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Packet {
    RcChannels(RcChannels),
    LinkStatistics(LinkStatistics),
    BatterySensor(BatterySensor),
    Gps(GpsData),
    Attitude(Attitude),
    FlightMode(FlightMode),
    Unrecognized { frame_type: u8, payload: Vec<u8> },
}

impl Packet {
    /// Decode a CRC-validated payload according to its frame type
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the layout of a known
    /// frame type. Unknown frame types never fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use crsf_link::crsf::payload::Packet;
    ///
    /// let packet = Packet::decode(0x08, &[0x00, 0xA8, 0x00, 0x7D, 0x00, 0x03, 0xE8, 0x4B]).unwrap();
    /// match packet {
    ///     Packet::BatterySensor(battery) => assert_eq!(battery.remaining_percent, 75),
    ///     other => panic!("unexpected packet: {:?}", other),
    /// }
    /// ```
    pub fn decode(frame_type: u8, payload: &[u8]) -> Result<Self> {
        match FrameType::try_from(frame_type).ok() {
            Some(FrameType::RcChannelsPacked) => decode_rc_channels(payload).map(Packet::RcChannels),
            Some(FrameType::LinkStatistics) => {
                decode_link_statistics(payload).map(Packet::LinkStatistics)
            }
            Some(FrameType::BatterySensor) => {
                decode_battery_sensor(payload).map(Packet::BatterySensor)
            }
            Some(FrameType::Gps) => decode_gps(payload).map(Packet::Gps),
            Some(FrameType::Attitude) => decode_attitude(payload).map(Packet::Attitude),
            Some(FrameType::FlightMode) => decode_flight_mode(payload).map(Packet::FlightMode),
            _ => Ok(Packet::Unrecognized {
                frame_type,
                payload: payload.to_vec(),
            }),
        }
    }

    /// Decode a raw frame handed out by the frame decoder
    pub fn from_raw(frame: &RawFrame) -> Result<Self> {
        Self::decode(frame.frame_type, &frame.payload)
    }

    /// Frame type byte this packet is sent with
    pub fn frame_type(&self) -> u8 {
        match self {
            Packet::RcChannels(_) => FrameType::RcChannelsPacked as u8,
            Packet::LinkStatistics(_) => FrameType::LinkStatistics as u8,
            Packet::BatterySensor(_) => FrameType::BatterySensor as u8,
            Packet::Gps(_) => FrameType::Gps as u8,
            Packet::Attitude(_) => FrameType::Attitude as u8,
            Packet::FlightMode(_) => FrameType::FlightMode as u8,
            Packet::Unrecognized { frame_type, .. } => *frame_type,
        }
    }

    /// Encode the payload bytes of this packet
    pub fn encode_payload(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Packet::RcChannels(channels) => encode_rc_channels(channels).to_vec(),
            Packet::LinkStatistics(stats) => encode_link_statistics(stats).to_vec(),
            Packet::BatterySensor(battery) => encode_battery_sensor(battery)?.to_vec(),
            Packet::Gps(gps) => encode_gps(gps).to_vec(),
            Packet::Attitude(attitude) => encode_attitude(attitude).to_vec(),
            Packet::FlightMode(mode) => encode_flight_mode(mode)?,
            Packet::Unrecognized { payload, .. } => payload.clone(),
        })
    }

    /// Build the raw frame for this packet
    pub fn to_frame(&self) -> Result<RawFrame> {
        RawFrame::new(self.frame_type(), self.encode_payload()?)
    }
}
