//! # CRSF Link
//!
//! Receive a CRSF serial link from an RC receiver and drive servos from it.
//!
//! This application decodes the receiver's UART stream, maps RC channels to
//! servo outputs, records sensor telemetry and falls back to failsafe
//! positions when the link drops.

use anyhow::{Context, Result};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::io::BufReader;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crsf_link::config::{Config, LoggingConfig, SerialConfig};
use crsf_link::crsf::payload::Packet;
use crsf_link::output::{
    LinkMonitor, LoggingPulseOutput, LoggingStatusIndicator, PulseOutput, ServoBank,
    StatusIndicator,
};
use crsf_link::serial::{
    self, ByteSource, CrsfReceiver, SerialByteSource, DEFAULT_DEVICE_PATHS,
};
use crsf_link::telemetry::TelemetryLogger;

/// Config file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Pulse changes smaller than this are not logged
const PULSE_LOG_DEADBAND_US: u16 = 5;

/// Stale-link checks per failsafe timeout
const LINK_CHECKS_PER_TIMEOUT: u32 = 4;

/// Reacts to decoded packets: servos, indicator, failsafe and telemetry
struct LinkHandler<P, S> {
    servos: ServoBank<P>,
    indicator: S,
    monitor: LinkMonitor,
    telemetry: Option<TelemetryLogger>,
    packets: u64,
}

impl<P: PulseOutput, S: StatusIndicator> LinkHandler<P, S> {
    fn new(
        servos: ServoBank<P>,
        indicator: S,
        monitor: LinkMonitor,
        telemetry: Option<TelemetryLogger>,
    ) -> Self {
        Self {
            servos,
            indicator,
            monitor,
            telemetry,
            packets: 0,
        }
    }

    /// Drive every output to failsafe and turn the indicator off
    fn enter_failsafe(&mut self) -> Result<()> {
        self.servos.apply_failsafe()?;
        self.indicator.set(false);
        Ok(())
    }

    fn handle_packet(&mut self, packet: &Packet, now: Instant) -> Result<()> {
        self.packets += 1;

        match packet {
            Packet::RcChannels(channels) => {
                if self.monitor.channels_received(now) {
                    self.indicator.set(true);
                }
                self.servos.apply(channels)?;
            }
            Packet::LinkStatistics(stats) => {
                debug!(
                    "Link: RSSI {}/{} dBm, LQ {}%, SNR {} dB",
                    -i16::from(stats.uplink_rssi_1),
                    -i16::from(stats.uplink_rssi_2),
                    stats.uplink_lq,
                    stats.uplink_snr
                );
            }
            Packet::Unrecognized { frame_type, payload } => {
                debug!(
                    "Unhandled frame type 0x{:02X} ({} bytes)",
                    frame_type,
                    payload.len()
                );
            }
            _ => {}
        }

        if let Some(logger) = self.telemetry.as_mut() {
            if let Err(e) = logger.log(packet) {
                warn!("Failed to record telemetry: {}", e);
            }
        }

        Ok(())
    }

    /// Enter failsafe if channels have gone stale
    fn check_link(&mut self, now: Instant) -> Result<()> {
        if self.monitor.check(now) {
            self.enter_failsafe()?;
        }
        Ok(())
    }
}

fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level: tracing::Level = config
        .level
        .parse()
        .with_context(|| format!("invalid log level '{}'", config.level))?;
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "crsf-link.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn open_serial(config: &SerialConfig) -> Result<(String, tokio_serial::SerialStream)> {
    if config.is_auto() {
        Ok(serial::open_first(DEFAULT_DEVICE_PATHS, config.baud_rate)?)
    } else {
        let port = serial::open_port(&config.port, config.baud_rate)?;
        Ok((config.port.clone(), port))
    }
}

/// Current time on the tokio clock
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// How often to check for a stale link: a quarter of the failsafe timeout
fn link_check_period(failsafe_timeout: Duration) -> Duration {
    (failsafe_timeout / LINK_CHECKS_PER_TIMEOUT).max(Duration::from_millis(1))
}

/// Receive and handle packets until `shutdown` completes
///
/// The link is checked on its own interval because `next_packet` does not
/// return while a noisy line keeps delivering bytes that never form a frame.
async fn run<B, P, S, F>(
    receiver: &mut CrsfReceiver<B>,
    handler: &mut LinkHandler<P, S>,
    link_check_every: Duration,
    stats_every: Duration,
    shutdown: F,
) -> Result<()>
where
    B: ByteSource,
    P: PulseOutput,
    S: StatusIndicator,
    F: Future,
{
    let mut link_check = interval(link_check_every);
    link_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut stats_interval = interval(stats_every);
    stats_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    loop {
        // Decoder state lives in the receiver, so dropping a pending read loses nothing
        tokio::select! {
            result = receiver.next_packet() => {
                if let Some(packet) = result? {
                    handler.handle_packet(&packet, now())?;
                }
            }

            _ = link_check.tick() => {
                handler.check_link(now())?;
            }

            _ = stats_interval.tick() => {
                let stats = receiver.stats();
                info!(
                    "Frames: {} ok, {} crc errors, {} bad lengths, {} timeouts, {} decode errors",
                    stats.frames_ok,
                    stats.crc_errors,
                    stats.invalid_lengths,
                    stats.timeouts,
                    stats.decode_errors
                );
            }

            // Handle Ctrl+C for graceful shutdown
            _ = &mut shutdown => {
                info!("Shutting down...");
                handler.enter_failsafe()?;
                info!("Total packets received: {}", handler.packets);
                break;
            }
        }
    }

    Ok(())
}

/// Main entry point for CRSF Link
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Open the receiver's serial port
///    - Drive all servos to failsafe
///
/// 2. **Main Loop**
///    - Decode packets; RC channels drive the servo bank
///    - Record sensor telemetry
///    - Enter failsafe when RC channels stop arriving
///    - Log decoder statistics periodically
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration cannot be loaded
/// - Serial port cannot be opened or fails while reading
/// - A servo output rejects a command
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path))?;

    let _log_guard = init_logging(&config.logging)?;

    info!("CRSF Link v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from {}", config_path);

    let (device_path, port) = open_serial(&config.serial)?;
    info!(
        "Receiving CRSF on {} at {} baud",
        device_path, config.serial.baud_rate
    );

    let source = SerialByteSource::new(BufReader::new(port));
    let mut receiver = CrsfReceiver::new(
        source,
        config.serial.baud_rate,
        config.serial.idle_timeout(),
    );

    let telemetry = if config.telemetry.enabled {
        Some(TelemetryLogger::new(&config.telemetry)?)
    } else {
        None
    };

    let mut handler = LinkHandler::new(
        ServoBank::new(
            LoggingPulseOutput::new(PULSE_LOG_DEADBAND_US),
            config.outputs.clone(),
        ),
        LoggingStatusIndicator::default(),
        LinkMonitor::new(config.link.failsafe_timeout()),
        telemetry,
    );
    handler.enter_failsafe()?;

    info!("Press Ctrl+C to exit");

    run(
        &mut receiver,
        &mut handler,
        link_check_period(config.link.failsafe_timeout()),
        config.link.stats_interval(),
        tokio::signal::ctrl_c(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crsf_link::config::OutputConfig;
    use async_trait::async_trait;
    use crsf_link::crsf::payload::FlightMode;
    use crsf_link::crsf::protocol::CRSF_BAUD_RATE;

    /// Line that never goes quiet but never carries a frame
    struct NoiseSource;

    #[async_trait]
    impl ByteSource for NoiseSource {
        async fn try_read_byte(
            &mut self,
            _timeout: Duration,
        ) -> crsf_link::error::Result<Option<u8>> {
            tokio::time::sleep(Duration::from_micros(24)).await;
            Ok(Some(0x55))
        }
    }

    fn handler(telemetry: Option<TelemetryLogger>) -> LinkHandler<LoggingPulseOutput, LoggingStatusIndicator> {
        let outputs = vec![OutputConfig {
            output: 0,
            channel: 0,
            min_us: 1000,
            max_us: 2000,
            failsafe_us: 1100,
            reversed: false,
        }];

        LinkHandler::new(
            ServoBank::new(LoggingPulseOutput::new(1), outputs),
            LoggingStatusIndicator::default(),
            LinkMonitor::new(Duration::from_millis(500)),
            telemetry,
        )
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_starts_in_failsafe() {
        let mut handler = handler(None);
        handler.enter_failsafe().unwrap();

        assert_eq!(handler.servos.port().last_pulse(0), Some(1100));
        assert!(!handler.indicator.is_on());
    }

    #[test]
    fn test_channels_drive_servos() {
        let mut handler = handler(None);
        handler.enter_failsafe().unwrap();

        handler
            .handle_packet(&Packet::RcChannels([992; 16]), Instant::now())
            .unwrap();

        assert_eq!(handler.servos.port().last_pulse(0), Some(1500));
        assert!(handler.indicator.is_on());
        assert_eq!(handler.packets, 1);
    }

    #[test]
    fn test_failsafe_after_link_loss() {
        let mut handler = handler(None);
        let start = Instant::now();
        handler
            .handle_packet(&Packet::RcChannels([1811; 16]), start)
            .unwrap();
        assert_eq!(handler.servos.port().last_pulse(0), Some(2000));

        handler.check_link(start + Duration::from_millis(100)).unwrap();
        assert_eq!(handler.servos.port().last_pulse(0), Some(2000));

        handler.check_link(start + Duration::from_secs(1)).unwrap();
        assert_eq!(handler.servos.port().last_pulse(0), Some(1100));
        assert!(!handler.indicator.is_on());

        // Link comes back
        handler
            .handle_packet(&Packet::RcChannels([992; 16]), start + Duration::from_secs(2))
            .unwrap();
        assert_eq!(handler.servos.port().last_pulse(0), Some(1500));
        assert!(handler.indicator.is_on());
    }

    #[test]
    fn test_telemetry_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TelemetryLogger::with_limits(dir.path(), 100, 10).unwrap();
        let mut handler = handler(Some(logger));

        handler
            .handle_packet(&Packet::FlightMode(FlightMode("ACRO".to_string())), Instant::now())
            .unwrap();

        let logger = handler.telemetry.as_ref().unwrap();
        assert_eq!(logger.records_in_file(), 1);
    }

    #[test]
    fn test_link_check_period() {
        assert_eq!(
            link_check_period(Duration::from_millis(500)),
            Duration::from_millis(125)
        );
        assert_eq!(
            link_check_period(Duration::from_millis(2)),
            Duration::from_millis(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failsafe_on_noisy_line() {
        let mut handler = handler(None);
        handler
            .handle_packet(&Packet::RcChannels([1811; 16]), now())
            .unwrap();
        assert_eq!(handler.servos.port().last_pulse(0), Some(2000));

        let mut receiver =
            CrsfReceiver::new(NoiseSource, CRSF_BAUD_RATE, Duration::from_millis(100));

        run(
            &mut receiver,
            &mut handler,
            link_check_period(Duration::from_millis(500)),
            Duration::from_secs(5),
            tokio::time::sleep(Duration::from_secs(2)),
        )
        .await
        .unwrap();

        assert!(handler.monitor.is_failsafe());
        assert!(!handler.indicator.is_on());
        assert_eq!(handler.servos.port().last_pulse(0), Some(1100));
        assert_eq!(receiver.stats().frames_ok, 0);
        assert!(receiver.stats().bytes_discarded > 0);
    }
}
