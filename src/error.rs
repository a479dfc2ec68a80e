//! # Error Types
//!
//! Custom error types for CRSF Link using `thiserror`.

use thiserror::Error;

/// Main error type for CRSF Link
#[derive(Debug, Error)]
pub enum LinkError {
    /// CRSF protocol errors (bad sync, truncated frame, CRC mismatch)
    #[error("CRSF protocol error: {0}")]
    CrsfProtocol(String),

    /// Payload length does not match the size declared for its frame type
    #[error("payload length mismatch for frame type 0x{frame_type:02X}: expected {expected} bytes, got {actual}")]
    PayloadLength {
        frame_type: u8,
        expected: usize,
        actual: usize,
    },

    /// Payload does not fit in a single frame
    #[error("payload size {len} exceeds maximum {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// A field value cannot be represented in its wire encoding
    #[error("field `{field}` value {value} does not fit its wire encoding")]
    FieldOutOfRange { field: &'static str, value: u64 },

    /// Payload content is malformed beyond its length
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Actuation port errors
    #[error("Output error: {0}")]
    Output(String),
}

/// Result type alias for CRSF Link
pub type Result<T> = std::result::Result<T, LinkError>;
