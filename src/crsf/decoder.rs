//! # CRSF Frame Decoder
//!
//! Byte-at-a-time state machine that recovers frames from a live UART stream.
//!
//! ```text
//! +----------+   sync   +------------+  2..=62  +----------+
//! | SeekSync |--------->| ReadLength |--------->| ReadBody |
//! +----------+          +------------+          +----------+
//!      ^  ^                   |                      |
//!      |  +-------------------+ bad length           | crc byte: validate,
//!      +---------------------------------------------+ dispatch or drop
//! ```
//!
//! Every failure returns the decoder to `SeekSync`; nothing here is fatal.

use serde::Serialize;
use tracing::{debug, trace};

use super::crc::CRC8_DVB_S2;
use super::payload::Packet;
use super::protocol::*;
use crate::error::{LinkError, Result};

/// Current position of the decoder within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Discarding bytes until the sync byte shows up
    SeekSync,
    /// Sync seen, next byte is the frame size
    ReadLength,
    /// Accumulating type + payload until the CRC byte lands at `crc_index`
    ReadBody { crc_index: usize },
}

/// Counters for link-quality diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    /// Frames that passed CRC validation
    pub frames_ok: u64,
    /// Frames dropped on CRC mismatch
    pub crc_errors: u64,
    /// Frame size bytes outside `[2, 62]`
    pub invalid_lengths: u64,
    /// Frames abandoned because the line went quiet mid-frame
    pub timeouts: u64,
    /// CRC-valid frames whose payload did not match their type
    pub decode_errors: u64,
    /// Bytes discarded while looking for sync
    pub bytes_discarded: u64,
}

/// Streaming CRSF frame decoder
///
/// One decoder per physical link. All state is owned by the instance; the
/// CRC table is the shared read-only [`CRC8_DVB_S2`].
///
/// # Examples
///
/// ```
/// use crsf_link::crsf::decoder::FrameDecoder;
/// use crsf_link::crsf::encoder::encode_rc_channels_frame;
/// use crsf_link::crsf::payload::Packet;
///
/// let mut decoder = FrameDecoder::new();
/// let frame = encode_rc_channels_frame(&[992; 16]);
///
/// let packets = decoder.push_bytes(&frame);
/// assert_eq!(packets.len(), 1);
/// assert!(matches!(packets[0], Ok(Packet::RcChannels(_))));
/// ```
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecoderState,
    buf: [u8; CRSF_MAX_PACKET_SIZE],
    len: usize,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Creates a decoder waiting for a sync byte
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DecoderState::SeekSync,
            buf: [0; CRSF_MAX_PACKET_SIZE],
            len: 0,
            stats: DecoderStats::default(),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// True when no frame is in progress
    pub fn is_idle(&self) -> bool {
        self.state == DecoderState::SeekSync
    }

    /// Bytes of the frame currently being assembled, sync byte included
    pub fn buffered(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Drop any partial frame and go back to looking for sync
    pub fn reset(&mut self) {
        self.state = DecoderState::SeekSync;
        self.len = 0;
    }

    /// Abandon a partial frame after an inter-byte timeout
    ///
    /// Returns `true` if a frame was in progress.
    pub fn abandon(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }

        trace!("abandoning partial frame after {} bytes", self.len);
        self.stats.timeouts += 1;
        self.reset();
        true
    }

    /// Consume one byte, returning a frame once its CRC byte has been validated
    pub fn push_byte_raw(&mut self, byte: u8) -> Option<RawFrame> {
        match self.state {
            DecoderState::SeekSync => {
                if byte == CRSF_SYNC_BYTE {
                    self.buf[0] = byte;
                    self.len = 1;
                    self.state = DecoderState::ReadLength;
                } else {
                    self.stats.bytes_discarded += 1;
                }
                None
            }
            DecoderState::ReadLength => {
                if (CRSF_MIN_FRAME_SIZE..=CRSF_MAX_FRAME_SIZE).contains(&byte) {
                    self.buf[1] = byte;
                    self.len = CRSF_HEADER_LEN;
                    self.state = DecoderState::ReadBody {
                        crc_index: CRSF_HEADER_LEN + byte as usize - 1,
                    };
                } else {
                    trace!("invalid frame size {}", byte);
                    self.stats.invalid_lengths += 1;
                    self.reset();
                }
                None
            }
            DecoderState::ReadBody { crc_index } => {
                let index = self.len;
                self.buf[index] = byte;
                self.len += 1;

                if index < crc_index {
                    return None;
                }

                let frame = self.validate(crc_index);
                self.reset();
                frame
            }
        }
    }

    /// Consume one byte and decode the payload of a completed frame
    ///
    /// A payload that does not fit its frame type is reported for that frame
    /// only; the decoder is already waiting for the next sync byte.
    pub fn push_byte(&mut self, byte: u8) -> Option<Result<Packet>> {
        let frame = self.push_byte_raw(byte)?;

        let result = Packet::from_raw(&frame);
        if let Err(ref e) = result {
            debug!("dropping frame 0x{:02X}: {}", frame.frame_type, e);
            self.stats.decode_errors += 1;
        }

        Some(result)
    }

    /// Consume a slice of bytes, collecting every completed frame
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<Result<Packet>> {
        bytes.iter().filter_map(|&byte| self.push_byte(byte)).collect()
    }

    fn validate(&mut self, crc_index: usize) -> Option<RawFrame> {
        let expected = self.buf[crc_index];
        let actual = CRC8_DVB_S2.calculate(&self.buf[CRSF_HEADER_LEN..crc_index]);

        if actual != expected {
            trace!(
                "CRC mismatch: expected 0x{:02X}, got 0x{:02X}",
                expected,
                actual
            );
            self.stats.crc_errors += 1;
            return None;
        }

        self.stats.frames_ok += 1;
        Some(RawFrame {
            frame_type: self.buf[CRSF_HEADER_LEN],
            payload: self.buf[CRSF_HEADER_LEN + 1..crc_index].to_vec(),
        })
    }
}

/// Decode a complete CRSF frame held in one buffer
///
/// # Arguments
///
/// * `frame` - Complete CRSF frame bytes (including sync, length, type, payload, crc)
///
/// # Returns
///
/// * `Result<RawFrame>` - Validated frame, or error if invalid
///
/// # Errors
///
/// Returns error if:
/// - Frame is too short
/// - Sync byte is incorrect
/// - Frame size is out of range
/// - CRC check fails
pub fn decode_frame(frame: &[u8]) -> Result<RawFrame> {
    // Minimum frame size: sync(1) + length(1) + type(1) + crc(1) = 4 bytes
    if frame.len() < 4 {
        return Err(LinkError::CrsfProtocol("Frame too short".to_string()));
    }

    if frame[0] != CRSF_SYNC_BYTE {
        return Err(LinkError::CrsfProtocol(format!(
            "Invalid sync byte: 0x{:02X}",
            frame[0]
        )));
    }

    let frame_size = frame[1];
    if !(CRSF_MIN_FRAME_SIZE..=CRSF_MAX_FRAME_SIZE).contains(&frame_size) {
        return Err(LinkError::CrsfProtocol(format!(
            "Invalid frame size: {}",
            frame_size
        )));
    }

    let crc_index = CRSF_HEADER_LEN + frame_size as usize - 1;
    if frame.len() <= crc_index {
        return Err(LinkError::CrsfProtocol(format!(
            "Frame too short: expected {} bytes, got {}",
            crc_index + 1,
            frame.len()
        )));
    }

    // CRC covers Type + Payload
    let received_crc = frame[crc_index];
    let calculated_crc = CRC8_DVB_S2.calculate(&frame[CRSF_HEADER_LEN..crc_index]);
    if calculated_crc != received_crc {
        return Err(LinkError::CrsfProtocol(format!(
            "CRC mismatch: expected 0x{:02X}, got 0x{:02X}",
            calculated_crc, received_crc
        )));
    }

    RawFrame::new(
        frame[CRSF_HEADER_LEN],
        frame[CRSF_HEADER_LEN + 1..crc_index].to_vec(),
    )
}
