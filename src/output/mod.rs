//! # Output Module
//!
//! Drives actuators from decoded RC channels.
//!
//! This module handles:
//! - Converting CRSF channel values to servo pulse widths
//! - Mapping channels onto configured servo outputs (reversal, endpoint clamping)
//! - Failsafe pulses and the link status indicator
//!
//! Hardware sits behind the [`PulseOutput`] and [`StatusIndicator`] ports so
//! the bank can run against a PWM driver, a log, or a test double.

pub mod failsafe;

use tracing::{debug, info};

use crate::config::OutputConfig;
use crate::crsf::protocol::{RcChannels, CRSF_CHANNEL_RAW_MAX};
use crate::error::{LinkError, Result};

pub use failsafe::{LinkMonitor, LinkState};

/// Shortest pulse a standard servo accepts (0°)
pub const PULSE_MIN_US: u16 = 500;

/// Longest pulse a standard servo accepts (180°)
pub const PULSE_MAX_US: u16 = 2500;

/// Servo travel in degrees
pub const SERVO_MAX_DEG: u16 = 180;

/// Convert a CRSF channel value to a pulse width in microseconds
///
/// 172 → 987 µs, 992 → 1500 µs, 1811 → 2011 µs.
///
/// # Examples
///
/// ```
/// use crsf_link::output::channel_to_us;
///
/// assert_eq!(channel_to_us(992), 1500);
/// ```
pub fn channel_to_us(value: u16) -> u16 {
    let value = u32::from(value.min(CRSF_CHANNEL_RAW_MAX));
    (value * 5 / 8 + 880) as u16
}

/// Convert a pulse width in microseconds to a CRSF channel value
///
/// Inverse of [`channel_to_us`] up to integer rounding. Pulses below 880 µs
/// map to 0, results above 2047 are clamped.
pub fn us_to_channel(us: u16) -> u16 {
    let value = (u32::from(us) * 8 / 5).saturating_sub(1408);
    value.min(u32::from(CRSF_CHANNEL_RAW_MAX)) as u16
}

/// Convert a servo angle to its pulse width
///
/// 0° → 500 µs, 90° → 1500 µs, 180° → 2500 µs. Angles past 180° return `None`.
pub fn angle_to_pulse_us(degrees: u16) -> Option<u16> {
    if degrees > SERVO_MAX_DEG {
        return None;
    }

    let span = u32::from(PULSE_MAX_US - PULSE_MIN_US);
    Some(PULSE_MIN_US + (u32::from(degrees) * span / u32::from(SERVO_MAX_DEG)) as u16)
}

/// Pulse-width output port (PWM driver, servo controller, ...)
#[cfg_attr(test, mockall::automock)]
pub trait PulseOutput {
    /// Command `output` to emit pulses of `pulse_us` microseconds
    fn set_pulse_us(&mut self, output: usize, pulse_us: u16) -> Result<()>;
}

/// On/off link status light
#[cfg_attr(test, mockall::automock)]
pub trait StatusIndicator {
    fn set(&mut self, on: bool);
}

/// Pulse for `value` on a configured output: reversal, then endpoint clamp
pub fn output_pulse(mapping: &OutputConfig, value: u16) -> u16 {
    let mut pulse = channel_to_us(value);
    if mapping.reversed {
        pulse = (mapping.min_us + mapping.max_us).saturating_sub(pulse);
    }
    pulse.clamp(mapping.min_us, mapping.max_us)
}

/// Set of servos fed from RC channels
pub struct ServoBank<P> {
    port: P,
    mappings: Vec<OutputConfig>,
}

impl<P: PulseOutput> ServoBank<P> {
    pub fn new(port: P, mappings: Vec<OutputConfig>) -> Self {
        Self { port, mappings }
    }

    pub fn mappings(&self) -> &[OutputConfig] {
        &self.mappings
    }

    /// Drive every output from its configured channel
    ///
    /// # Errors
    ///
    /// Stops at the first output the port rejects
    pub fn apply(&mut self, channels: &RcChannels) -> Result<()> {
        for mapping in &self.mappings {
            let value = *channels.get(mapping.channel).ok_or_else(|| {
                LinkError::Output(format!("channel {} out of range", mapping.channel))
            })?;

            self.port
                .set_pulse_us(mapping.output, output_pulse(mapping, value))?;
        }
        Ok(())
    }

    /// Drive every output to its failsafe pulse
    pub fn apply_failsafe(&mut self) -> Result<()> {
        for mapping in &self.mappings {
            self.port.set_pulse_us(mapping.output, mapping.failsafe_us)?;
        }
        Ok(())
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}

/// Pulse output that only logs, for running without servo hardware
///
/// Logs a pulse only when it changes by at least `deadband_us`.
#[derive(Debug, Default)]
pub struct LoggingPulseOutput {
    last: Vec<Option<u16>>,
    deadband_us: u16,
}

impl LoggingPulseOutput {
    pub fn new(deadband_us: u16) -> Self {
        Self {
            last: Vec::new(),
            deadband_us,
        }
    }

    pub fn last_pulse(&self, output: usize) -> Option<u16> {
        self.last.get(output).copied().flatten()
    }
}

impl PulseOutput for LoggingPulseOutput {
    fn set_pulse_us(&mut self, output: usize, pulse_us: u16) -> Result<()> {
        if output >= self.last.len() {
            self.last.resize(output + 1, None);
        }

        let changed = match self.last[output] {
            Some(prev) => prev.abs_diff(pulse_us) >= self.deadband_us.max(1),
            None => true,
        };

        if changed {
            debug!("output {} -> {} us", output, pulse_us);
            self.last[output] = Some(pulse_us);
        }
        Ok(())
    }
}

/// Status indicator that logs state changes
#[derive(Debug, Default)]
pub struct LoggingStatusIndicator {
    on: Option<bool>,
}

impl LoggingStatusIndicator {
    pub fn is_on(&self) -> bool {
        self.on.unwrap_or(false)
    }
}

impl StatusIndicator for LoggingStatusIndicator {
    fn set(&mut self, on: bool) {
        if self.on != Some(on) {
            info!("Link indicator {}", if on { "on" } else { "off" });
            self.on = Some(on);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::protocol::{
        CRSF_CHANNEL_VALUE_1000, CRSF_CHANNEL_VALUE_2000, CRSF_CHANNEL_VALUE_MAX,
        CRSF_CHANNEL_VALUE_MID, CRSF_CHANNEL_VALUE_MIN, CRSF_NUM_CHANNELS,
    };
    use mockall::predicate::eq;

    fn mapping(output: usize, channel: usize, reversed: bool) -> OutputConfig {
        OutputConfig {
            output,
            channel,
            min_us: 1000,
            max_us: 2000,
            failsafe_us: 1500,
            reversed,
        }
    }

    #[test]
    fn test_channel_to_us() {
        assert_eq!(channel_to_us(CRSF_CHANNEL_VALUE_MIN), 987);
        assert_eq!(channel_to_us(CRSF_CHANNEL_VALUE_MID), 1500);
        assert_eq!(channel_to_us(CRSF_CHANNEL_VALUE_MAX), 2011);
        assert_eq!(channel_to_us(CRSF_CHANNEL_VALUE_1000), 999);
        assert_eq!(channel_to_us(CRSF_CHANNEL_VALUE_2000), 2000);
        assert_eq!(channel_to_us(0), 880);
        assert_eq!(channel_to_us(u16::MAX), channel_to_us(2047));
    }

    #[test]
    fn test_us_to_channel() {
        assert_eq!(us_to_channel(1500), CRSF_CHANNEL_VALUE_MID);
        assert_eq!(us_to_channel(1000), 192);
        assert_eq!(us_to_channel(2000), CRSF_CHANNEL_VALUE_2000);
        assert_eq!(us_to_channel(0), 0);
        assert_eq!(us_to_channel(u16::MAX), 2047);

        // Round trip within integer rounding
        for value in [CRSF_CHANNEL_VALUE_MIN, 500, CRSF_CHANNEL_VALUE_MID, CRSF_CHANNEL_VALUE_MAX] {
            let back = us_to_channel(channel_to_us(value));
            assert!(back.abs_diff(value) <= 2, "{} -> {}", value, back);
        }
    }

    #[test]
    fn test_angle_to_pulse() {
        assert_eq!(angle_to_pulse_us(0), Some(500));
        assert_eq!(angle_to_pulse_us(90), Some(1500));
        assert_eq!(angle_to_pulse_us(180), Some(2500));
        assert_eq!(angle_to_pulse_us(181), None);
    }

    #[test]
    fn test_output_pulse_clamps_and_reverses() {
        let normal = mapping(0, 0, false);
        assert_eq!(output_pulse(&normal, CRSF_CHANNEL_VALUE_MID), 1500);
        assert_eq!(output_pulse(&normal, CRSF_CHANNEL_VALUE_MIN), 1000);
        assert_eq!(output_pulse(&normal, CRSF_CHANNEL_VALUE_MAX), 2000);

        let reversed = mapping(0, 0, true);
        assert_eq!(output_pulse(&reversed, CRSF_CHANNEL_VALUE_MID), 1500);
        assert_eq!(output_pulse(&reversed, CRSF_CHANNEL_VALUE_MIN), 2000);
        assert_eq!(output_pulse(&reversed, CRSF_CHANNEL_VALUE_MAX), 1000);
        // 1200 us mirrors to 1800 us
        assert_eq!(output_pulse(&reversed, 512), 1800);
    }

    #[test]
    fn test_servo_bank_applies_channels() {
        let mut port = MockPulseOutput::new();
        port.expect_set_pulse_us()
            .with(eq(0), eq(1500))
            .times(1)
            .returning(|_, _| Ok(()));
        port.expect_set_pulse_us()
            .with(eq(1), eq(2000))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut bank = ServoBank::new(port, vec![mapping(0, 2, false), mapping(1, 3, true)]);

        let mut channels = [CRSF_CHANNEL_VALUE_MID; CRSF_NUM_CHANNELS];
        channels[3] = CRSF_CHANNEL_VALUE_MIN;
        bank.apply(&channels).unwrap();
    }

    #[test]
    fn test_servo_bank_failsafe() {
        let mut port = MockPulseOutput::new();
        port.expect_set_pulse_us()
            .with(eq(4), eq(1500))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut bank = ServoBank::new(port, vec![mapping(4, 0, false)]);
        bank.apply_failsafe().unwrap();
    }

    #[test]
    fn test_servo_bank_propagates_port_errors() {
        let mut port = MockPulseOutput::new();
        port.expect_set_pulse_us()
            .times(1)
            .returning(|_, _| Err(LinkError::Output("pwm busy".to_string())));

        let mut bank = ServoBank::new(port, vec![mapping(0, 0, false), mapping(1, 1, false)]);
        let result = bank.apply(&[CRSF_CHANNEL_VALUE_MID; CRSF_NUM_CHANNELS]);
        assert!(matches!(result, Err(LinkError::Output(_))));
    }

    #[test]
    fn test_servo_bank_rejects_bad_channel_index() {
        let port = MockPulseOutput::new();
        let mut bank = ServoBank::new(port, vec![mapping(0, 16, false)]);

        assert!(bank.apply(&[CRSF_CHANNEL_VALUE_MID; CRSF_NUM_CHANNELS]).is_err());
    }

    #[test]
    fn test_logging_pulse_output_deadband() {
        let mut port = LoggingPulseOutput::new(5);
        port.set_pulse_us(2, 1500).unwrap();
        assert_eq!(port.last_pulse(2), Some(1500));
        assert_eq!(port.last_pulse(0), None);

        port.set_pulse_us(2, 1503).unwrap();
        assert_eq!(port.last_pulse(2), Some(1500));

        port.set_pulse_us(2, 1505).unwrap();
        assert_eq!(port.last_pulse(2), Some(1505));
    }

    #[test]
    fn test_status_indicator_mock() {
        let mut indicator = MockStatusIndicator::new();
        indicator.expect_set().with(eq(true)).times(1).return_const(());
        indicator.set(true);

        let mut logging = LoggingStatusIndicator::default();
        assert!(!logging.is_on());
        logging.set(true);
        assert!(logging.is_on());
    }
}
