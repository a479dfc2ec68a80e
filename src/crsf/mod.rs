//! # CRSF Protocol Module
//!
//! Implementation of the Crossfire (CRSF) serial protocol spoken between an
//! RC receiver and a flight controller.
//!
//! This module handles:
//! - Frame synchronization and validation (byte-at-a-time decoder)
//! - CRC8-DVB-S2 checksum calculation
//! - Payload codecs (RC channels, link statistics, battery, GPS, attitude, flight mode)
//! - Frame encoding

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
pub mod payload;
