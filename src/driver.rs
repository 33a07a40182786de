//! Fixed-rate frame loop for headless hosts.
//!
//! Every tick advances the strip by a fixed step, so the visual speed
//! follows the rate the loop actually achieves. Missed ticks are skipped
//! rather than replayed in a burst.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::ScrollerConfig;
use crate::feed::StatusFeed;
use crate::session::ScrollerSession;
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    FrameLimit,
    Signal,
    TornDown,
}

#[derive(Debug, Clone, Copy)]
pub struct DriveSummary {
    pub frames: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
}

impl DriveSummary {
    pub fn achieved_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameDriver {
    interval: Duration,
    max_frames: Option<u64>,
}

impl FrameDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_frames: None,
        }
    }

    pub fn from_config(config: &ScrollerConfig) -> Self {
        Self::new(config.frame_interval())
    }

    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks `session` onto `surface` until `stop` resolves, the frame limit
    /// is hit, or the session is torn down.
    pub async fn run<F, S, Fut>(
        &self,
        session: &mut ScrollerSession<F>,
        surface: &mut S,
        stop: Fut,
    ) -> DriveSummary
    where
        F: StatusFeed,
        S: Surface + ?Sized,
        Fut: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(stop);

        debug!(
            interval_ms = self.interval.as_secs_f64() * 1000.0,
            max_frames = ?self.max_frames,
            "Frame loop starting"
        );
        let start = Instant::now();
        let mut frames = 0u64;

        let reason = loop {
            if session.is_torn_down() {
                break StopReason::TornDown;
            }
            if self.max_frames.map_or(false, |max| frames >= max) {
                break StopReason::FrameLimit;
            }
            tokio::select! {
                _ = &mut stop => break StopReason::Signal,
                _ = ticker.tick() => {
                    session.tick(surface);
                    frames += 1;
                }
            }
        };

        let summary = DriveSummary {
            frames,
            elapsed: start.elapsed(),
            reason,
        };
        info!(
            frames,
            reason = ?summary.reason,
            fps = summary.achieved_fps(),
            "Frame loop stopped"
        );
        summary
    }
}
