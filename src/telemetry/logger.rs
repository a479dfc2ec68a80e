//! Rotating JSONL telemetry writer

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::crsf::payload::Packet;
use crate::error::Result;

const FILE_PREFIX: &str = "telemetry_";
const FILE_EXTENSION: &str = "jsonl";

/// One line of a telemetry log
#[derive(Debug, Serialize)]
pub struct TelemetryRecord<'a> {
    /// RFC 3339 wall-clock time, millisecond precision
    pub timestamp: String,
    pub packet: &'a Packet,
}

impl<'a> TelemetryRecord<'a> {
    pub fn new(timestamp: DateTime<Local>, packet: &'a Packet) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            packet,
        }
    }
}

/// Writes sensor packets to rotating JSONL files
///
/// Files are named `telemetry_<YYYYmmdd_HHMMSS>_<seq>.jsonl` so that name
/// order is creation order. RC channel packets are not recorded.
#[derive(Debug)]
pub struct TelemetryLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    files_created: u64,
}

impl TelemetryLogger {
    /// Create a logger writing into `config.log_dir`
    ///
    /// # Errors
    ///
    /// Returns `LinkError::Io` if the directory cannot be created
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        Self::with_limits(
            &config.log_dir,
            config.max_records_per_file,
            config.max_files_to_keep,
        )
    }

    pub fn with_limits<P: AsRef<Path>>(
        dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Telemetry logging to {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            files_created: 0,
        })
    }

    /// Record a packet
    ///
    /// Returns `false` for packets that are not recorded (RC channels).
    pub fn log(&mut self, packet: &Packet) -> Result<bool> {
        if matches!(packet, Packet::RcChannels(_)) {
            return Ok(false);
        }

        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = TelemetryRecord::new(Local::now(), packet);
        let line = serde_json::to_string(&record)?;

        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        self.records_in_file += 1;

        Ok(true)
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn records_in_file(&self) -> usize {
        self.records_in_file
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.close()?;

        self.files_created += 1;
        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.files_created,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Delete the oldest log files beyond `max_files_to_keep`
    fn prune(&self) -> Result<()> {
        let mut files = list_log_files(&self.dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old telemetry file {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

impl Drop for TelemetryLogger {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to flush telemetry log: {}", e);
        }
    }
}

/// Telemetry files in `dir`, unsorted
pub fn list_log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(FILE_PREFIX))
            && path.extension().is_some_and(|ext| ext == FILE_EXTENSION);

        if is_log {
            files.push(path);
        }
    }
    Ok(files)
}
