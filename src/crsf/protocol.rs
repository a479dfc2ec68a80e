//! # CRSF Protocol Constants and Types
//!
//! Core protocol definitions for CRSF (Crossfire) communication.
//!
//! Wire format of a broadcast frame:
//!
//! ```text
//! [sync:1][frame_size:1][frame_type:1][payload:0..60][crc8:1]
//! ```
//!
//! `frame_size` counts every byte from `frame_type` through `crc8`.

use std::time::Duration;

use num_enum::TryFromPrimitive;

use crate::error::{LinkError, Result};

/// CRSF frame sync byte (always 0xC8)
pub const CRSF_SYNC_BYTE: u8 = 0xC8;

/// CRSF baud rate between receiver and flight controller
pub const CRSF_BAUD_RATE: u32 = 420_000;

/// Maximum size of a whole frame on the wire, sync byte included
pub const CRSF_MAX_PACKET_SIZE: usize = 64;

/// Sync and frame size bytes preceding the frame type
pub const CRSF_HEADER_LEN: usize = 2;

/// Smallest valid `frame_size` (type + crc, empty payload)
pub const CRSF_MIN_FRAME_SIZE: u8 = 2;

/// Largest valid `frame_size`
pub const CRSF_MAX_FRAME_SIZE: u8 = (CRSF_MAX_PACKET_SIZE - CRSF_HEADER_LEN) as u8;

/// Maximum CRSF payload size
/// Frame structure: sync(1) + length(1) + type(1) + payload(N) + crc(1)
/// Maximum frame size is 64 bytes, so max payload = 64 - 4 = 60 bytes
pub const CRSF_MAX_PAYLOAD_SIZE: usize = CRSF_MAX_PACKET_SIZE - 4;

/// Number of RC channels
pub const CRSF_NUM_CHANNELS: usize = 16;

/// Bits per packed channel value
pub const CRSF_CHANNEL_BITS: usize = 11;

/// Largest raw channel value (11 bits)
pub const CRSF_CHANNEL_RAW_MAX: u16 = (1 << CRSF_CHANNEL_BITS) - 1;

/// Nominal channel range. 172 is 987us, 1811 is 2012us.
pub const CRSF_CHANNEL_VALUE_MIN: u16 = 172;
/// Channel value for a 1000us pulse
pub const CRSF_CHANNEL_VALUE_1000: u16 = 191;
pub const CRSF_CHANNEL_VALUE_MID: u16 = 992;
/// Channel value for a 2000us pulse
pub const CRSF_CHANNEL_VALUE_2000: u16 = 1792;
pub const CRSF_CHANNEL_VALUE_MAX: u16 = 1811;

/// RC channels payload size (22 bytes for 16 channels × 11 bits)
pub const CRSF_RC_CHANNELS_PAYLOAD_SIZE: usize = 22;

/// RC channels frame length (type + payload + crc)
pub const CRSF_RC_CHANNELS_FRAME_LENGTH: u8 = 0x18; // 24 bytes

/// Link Statistics payload size
pub const CRSF_LINK_STATS_PAYLOAD_SIZE: usize = 10;

/// Battery Sensor payload size
pub const CRSF_BATTERY_SENSOR_PAYLOAD_SIZE: usize = 8;

/// GPS payload size
pub const CRSF_GPS_PAYLOAD_SIZE: usize = 15;

/// Attitude payload size
pub const CRSF_ATTITUDE_PAYLOAD_SIZE: usize = 6;

/// Flight mode payload limit, NUL terminator included
pub const CRSF_FLIGHT_MODE_MAX_PAYLOAD_SIZE: usize = 16;

/// Frame types at or above this code carry destination/origin addresses
pub const CRSF_EXTENDED_FRAME_TYPE_MIN: u8 = 0x28;

/// UART frame: 8 data bits plus start and stop bits
pub const UART_BITS_PER_BYTE: u64 = 10;

/// RC channels array type (16 channels, 11-bit values)
pub type RcChannels = [u16; CRSF_NUM_CHANNELS];

/// Frame type codes
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum FrameType {
    Gps = 0x02,
    GpsTime = 0x03,
    GpsExtended = 0x06,
    VariometerSensor = 0x07,
    BatterySensor = 0x08,
    AltitudeVerticalSpeed = 0x09,
    Airspeed = 0x0A,
    Heartbeat = 0x0B,
    Rpm = 0x0C,
    Temperature = 0x0D,
    CellsSensor = 0x0E,
    VtxTelemetry = 0x10,
    LinkStatistics = 0x14,
    RcChannelsPacked = 0x16,
    SubsetRcChannelsPacked = 0x17,
    RcChannels11Bits = 0x18,
    LinkStatisticsRx = 0x1C,
    LinkStatisticsTx = 0x1D,
    Attitude = 0x1E,
    MavlinkFc = 0x1F,
    FlightMode = 0x21,
    EspNowMessages = 0x22,
    DevicePing = 0x28,
    DeviceInfo = 0x29,
    ParameterSettingsEntry = 0x2B,
    ParameterRead = 0x2C,
    ParameterWrite = 0x2D,
    Command = 0x32,
    Logging = 0x34,
    RemoteRelated = 0x3A,
    Game = 0x3C,
    MspRequest = 0x7A,
    MspResponse = 0x7B,
    ArdupilotPassthrough = 0x80,
    MavlinkEnvelope = 0xAA,
    MavlinkSystemStatus = 0xAC,
}

impl FrameType {
    /// Whether frames of this type use the extended header
    pub fn is_extended(self) -> bool {
        self as u8 >= CRSF_EXTENDED_FRAME_TYPE_MIN
    }
}

/// Device address codes used by extended frames
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum DeviceAddress {
    Broadcast = 0x00,
    Cloud = 0x0E,
    Usb = 0x10,
    BluetoothWifi = 0x12,
    WifiReceiver = 0x13,
    VideoReceiver = 0x14,
    TbsCorePnpPro = 0x80,
    Reserved1 = 0x8A,
    Esc1 = 0x90,
    Esc2 = 0x91,
    Esc3 = 0x92,
    Esc4 = 0x93,
    Esc5 = 0x94,
    Esc6 = 0x95,
    Esc7 = 0x96,
    Esc8 = 0x97,
    CrsfReserved1 = 0xB0,
    CrsfReserved2 = 0xB2,
    CurrentSensor = 0xC0,
    Gps = 0xC2,
    TbsBlackbox = 0xC4,
    FlightController = 0xC8,
    Reserved2 = 0xCA,
    RaceTag = 0xCC,
    Vtx = 0xCE,
    RemoteControl = 0xEA,
    Receiver = 0xEC,
    Transmitter = 0xEE,
    Reserved3 = 0xF0,
    Reserved4 = 0xF2,
}

/// Per-byte timeout for a UART running at `baud_rate`
///
/// Time to transmit one 10-bit UART byte, plus one microsecond to make up
/// for the integer division rounding down. 420000 baud gives 24us.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use crsf_link::crsf::protocol::uart_byte_timeout;
///
/// assert_eq!(uart_byte_timeout(420_000), Duration::from_micros(24));
/// ```
pub fn uart_byte_timeout(baud_rate: u32) -> Duration {
    let us = UART_BITS_PER_BYTE * 1_000_000 / u64::from(baud_rate.max(1)) + 1;
    Duration::from_micros(us)
}

/// A CRC-validated frame: type byte plus raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Frame type
    pub frame_type: u8,

    /// Payload data
    pub payload: Vec<u8>,
}

impl RawFrame {
    /// Create a new CRSF frame
    ///
    /// # Arguments
    ///
    /// * `frame_type` - Frame type byte
    /// * `payload` - Payload data (max 60 bytes)
    ///
    /// # Errors
    ///
    /// Returns `PayloadTooLarge` if payload exceeds CRSF_MAX_PAYLOAD_SIZE (60 bytes)
    pub fn new(frame_type: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > CRSF_MAX_PAYLOAD_SIZE {
            return Err(LinkError::PayloadTooLarge {
                len: payload.len(),
                max: CRSF_MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            frame_type,
            payload,
        })
    }

    /// Get frame size field (type + payload + crc)
    ///
    /// This is guaranteed not to overflow since payload is validated to be ≤ 60 bytes
    pub fn frame_size(&self) -> u8 {
        (1 + self.payload.len() + 1) as u8
    }

    /// Frame type as a known code, if it is one
    pub fn known_type(&self) -> Option<FrameType> {
        FrameType::try_from(self.frame_type).ok()
    }

    /// Whether the frame type uses the extended header
    pub fn is_extended(&self) -> bool {
        self.frame_type >= CRSF_EXTENDED_FRAME_TYPE_MIN
    }

    /// Destination and origin addresses of an extended frame
    pub fn extended_addresses(&self) -> Option<(DeviceAddress, DeviceAddress)> {
        if !self.is_extended() {
            return None;
        }

        match self.payload.as_slice() {
            [dst, src, ..] => Some((
                DeviceAddress::try_from(*dst).ok()?,
                DeviceAddress::try_from(*src).ok()?,
            )),
            _ => None,
        }
    }
}
