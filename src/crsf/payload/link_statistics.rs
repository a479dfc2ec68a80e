//! Link statistics (0x14): ten single-byte fields, no endianness concerns.

use serde::{Deserialize, Serialize};

use super::fixed_payload;
use crate::crsf::protocol::{FrameType, CRSF_LINK_STATS_PAYLOAD_SIZE};
use crate::error::Result;

/// Link statistics telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStatistics {
    /// Uplink RSSI (antenna 1) in -dBm
    pub uplink_rssi_1: u8,

    /// Uplink RSSI (antenna 2) in -dBm (diversity)
    pub uplink_rssi_2: u8,

    /// Uplink link quality (0-100%)
    pub uplink_lq: u8,

    /// Uplink SNR in dB
    pub uplink_snr: i8,

    /// Active antenna (0 or 1)
    pub active_antenna: u8,

    /// RF mode / packet rate
    pub rf_mode: u8,

    /// Uplink TX power, enum index {0mW, 10mW, 25mW, 100mW, 500mW, 1000mW, 2000mW, 250mW, 50mW}
    pub uplink_tx_power: u8,

    /// Downlink RSSI in -dBm
    pub downlink_rssi: u8,

    /// Downlink link quality (0-100%)
    pub downlink_lq: u8,

    /// Downlink SNR in dB
    pub downlink_snr: i8,
}

/// Decode Link Statistics telemetry packet
///
/// # Arguments
///
/// * `payload` - Link Statistics payload (10 bytes)
///
/// # Returns
///
/// * `Result<LinkStatistics>` - Decoded link statistics
pub fn decode_link_statistics(payload: &[u8]) -> Result<LinkStatistics> {
    let payload: &[u8; CRSF_LINK_STATS_PAYLOAD_SIZE] =
        fixed_payload(FrameType::LinkStatistics, payload)?;

    Ok(LinkStatistics {
        uplink_rssi_1: payload[0],
        uplink_rssi_2: payload[1],
        uplink_lq: payload[2],
        uplink_snr: payload[3] as i8,
        active_antenna: payload[4],
        rf_mode: payload[5],
        uplink_tx_power: payload[6],
        downlink_rssi: payload[7],
        downlink_lq: payload[8],
        downlink_snr: payload[9] as i8,
    })
}

/// Encode Link Statistics into its 10-byte payload
pub fn encode_link_statistics(stats: &LinkStatistics) -> [u8; CRSF_LINK_STATS_PAYLOAD_SIZE] {
    [
        stats.uplink_rssi_1,
        stats.uplink_rssi_2,
        stats.uplink_lq,
        stats.uplink_snr as u8,
        stats.active_antenna,
        stats.rf_mode,
        stats.uplink_tx_power,
        stats.downlink_rssi,
        stats.downlink_lq,
        stats.downlink_snr as u8,
    ]
}
