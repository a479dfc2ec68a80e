//! # Serial Communication Module
//!
//! Handles the UART link from the RC receiver.
//!
//! This module handles:
//! - Opening the serial port (8N1, no flow control)
//! - Feeding received bytes through the frame decoder with per-byte timeouts
//! - Dropping partial frames when the line goes quiet

pub mod port_trait;

use std::time::Duration;

use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::crsf::decoder::{DecoderStats, FrameDecoder};
use crate::crsf::payload::Packet;
use crate::crsf::protocol::uart_byte_timeout;
use crate::error::{LinkError, Result};
pub use port_trait::{ByteSource, SerialByteSource};

/// Default device paths to try when the port is set to `auto` (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC devices
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyAMA0", // Raspberry Pi PL011 UART
];

/// Open a specific serial port with CRSF settings
///
/// # Arguments
///
/// * `path` - Device path (e.g., "/dev/ttyACM0")
/// * `baud_rate` - Line speed (420000 for standard CRSF)
///
/// # Returns
///
/// * `Result<SerialStream>` - Opened serial port
///
/// # Errors
///
/// Returns `LinkError::Serial` if the device cannot be opened
pub fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    let port = tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| LinkError::Serial(format!("Failed to open {}: {}", path, e)))?;

    Ok(port)
}

/// Open the first device that works from a list of candidates
///
/// # Returns
///
/// * `Result<(String, SerialStream)>` - The path that opened and its port
///
/// # Errors
///
/// Returns `LinkError::SerialPortNotFound` listing every path tried
pub fn open_first(paths: &[&str], baud_rate: u32) -> Result<(String, tokio_serial::SerialStream)> {
    for path in paths {
        debug!("Trying to open serial port: {}", path);

        match open_port(path, baud_rate) {
            Ok(port) => {
                info!("Opened serial port {} at {} baud", path, baud_rate);
                return Ok((path.to_string(), port));
            }
            Err(e) => {
                warn!("Failed to open {}: {}", path, e);
                continue;
            }
        }
    }

    Err(LinkError::SerialPortNotFound(paths.join(", ")))
}

/// Pulls bytes from a [`ByteSource`] and turns them into packets
///
/// While no frame is in progress it waits up to `idle_timeout` for a sync
/// byte. Mid-frame it waits one byte-time at the line's baud rate and drops
/// the partial frame if nothing arrives.
pub struct CrsfReceiver<S> {
    source: S,
    decoder: FrameDecoder,
    byte_timeout: Duration,
    idle_timeout: Duration,
}

impl<S: ByteSource> CrsfReceiver<S> {
    pub fn new(source: S, baud_rate: u32, idle_timeout: Duration) -> Self {
        Self {
            source,
            decoder: FrameDecoder::new(),
            byte_timeout: uart_byte_timeout(baud_rate),
            idle_timeout,
        }
    }

    /// Wait for the next decoded packet
    ///
    /// Returns `Ok(None)` when the line goes quiet, either between frames
    /// (after `idle_timeout`) or mid-frame (after one byte-time). Frames
    /// whose payload does not decode are logged and skipped.
    ///
    /// # Errors
    ///
    /// Only I/O errors from the byte source are returned.
    pub async fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            let timeout = if self.decoder.is_idle() {
                self.idle_timeout
            } else {
                self.byte_timeout
            };

            let Some(byte) = self.source.try_read_byte(timeout).await? else {
                if self.decoder.abandon() {
                    debug!("Line went quiet mid-frame, partial frame dropped");
                }
                return Ok(None);
            };

            match self.decoder.push_byte(byte) {
                Some(Ok(packet)) => return Ok(Some(packet)),
                Some(Err(e)) => warn!("Dropping frame: {}", e),
                None => {}
            }
        }
    }

    /// Requested mid-frame wait (24 µs at 420000 baud)
    ///
    /// The tokio timer has millisecond resolution, so the effective wait is
    /// 1–2 ms. At high packet rates a stalled partial frame can swallow the
    /// start of the next one, which then fails its CRC and resyncs.
    pub fn byte_timeout(&self) -> Duration {
        self.byte_timeout
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}
