//! # CRSF Link Library
//!
//! Decode and encode the CRSF (Crossfire) serial link between an RC receiver
//! and a flight controller.
//!
//! This library provides a byte-at-a-time frame decoder, payload codecs for
//! the common telemetry frames, a tokio serial receiver and the glue to drive
//! servo outputs from RC channels.

pub mod config;
pub mod error;
pub mod crsf;
pub mod output;
pub mod serial;
pub mod telemetry;
