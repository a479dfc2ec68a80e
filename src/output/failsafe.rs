//! Link-loss detection
//!
//! Tracks when the last RC channel frame arrived and reports failsafe once
//! the link has been silent for longer than the configured timeout.

use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Link state as seen by the outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No channel frame seen since start
    Waiting,
    /// Channels are fresh
    Active,
    /// Channels are stale
    Failsafe,
}

/// Watches RC channel frame arrival times
#[derive(Debug)]
pub struct LinkMonitor {
    timeout: Duration,
    last_channels: Option<Instant>,
    state: LinkState,
}

impl LinkMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_channels: None,
            state: LinkState::Waiting,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Record a valid channel frame at `now`
    ///
    /// Returns `true` if this ends a failsafe (or the initial wait).
    pub fn channels_received(&mut self, now: Instant) -> bool {
        self.last_channels = Some(now);

        let recovered = self.state != LinkState::Active;
        if recovered {
            info!("RC link active");
            self.state = LinkState::Active;
        }
        recovered
    }

    /// Re-evaluate the link at `now`
    ///
    /// Returns `true` only on the transition into failsafe.
    pub fn check(&mut self, now: Instant) -> bool {
        if self.state != LinkState::Active {
            return false;
        }

        let stale = self
            .last_channels
            .map_or(true, |last| now.saturating_duration_since(last) > self.timeout);

        if stale {
            warn!("No RC channels for {:?}, entering failsafe", self.timeout);
            self.state = LinkState::Failsafe;
        }
        stale
    }

    /// True unless channels are fresh
    pub fn is_failsafe(&self) -> bool {
        self.state != LinkState::Active
    }
}
