//! Tunable constants for the scroller.
//!
//! Motion is expressed per frame, not per second: doubling the frame rate
//! doubles the on-screen speed.

use std::time::Duration;

use crate::error::{Result, ScrollerError};
use crate::surface::{Color, TextStyle};

/// Default frame rate in frames per second.
pub const DEFAULT_FPS: u32 = 100;

/// Drift speed near the centre of the surface (px/frame).
const DEFAULT_MAX_SPEED: f64 = 11.0;

/// Drift speed at the surface edges (px/frame).
const DEFAULT_MIN_SPEED: f64 = 4.0;

/// Speed at which an arriving item pushes its predecessors (px/frame).
const DEFAULT_CONNECTED_SPEED: f64 = 4.0;

/// Geometric momentum decay applied per frame once the pointer is released.
const DEFAULT_DECEL: f64 = 49.0 / 50.0;

/// Momentum below this magnitude snaps to zero.
const DEFAULT_STOP_EPSILON: f64 = 0.05;

const DEFAULT_SPRINGBACK_RESISTANCE: f64 = 0.02;

/// Configuration for a scroller session.
#[derive(Debug, Clone)]
pub struct ScrollerConfig {
    pub fps: u32,
    pub max_speed: f64,
    pub min_speed: f64,
    pub connected_speed: f64,
    pub decel: f64,
    pub stop_epsilon: f64,
    pub springback_resistance: f64,
    /// Row height items are scaled to. `None` uses the surface height.
    pub strip_height: Option<f64>,
    pub spinner: SpinnerConfig,
    pub status_style: TextStyle,
    pub marquee_style: TextStyle,
    pub searching_text: String,
}

/// Waiting indicator shown until the first image lands.
#[derive(Debug, Clone)]
pub struct SpinnerConfig {
    pub radius: f64,
    pub line_width: f64,
    pub color: Color,
    /// Percent of a full turn at which the arc is cleared and restarted.
    pub end_percent: f64,
    /// Percent advanced per frame.
    pub step_percent: f64,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            radius: 28.0,
            line_width: 10.0,
            color: Color::rgb(0xad, 0x23, 0x23),
            end_percent: 101.0,
            step_percent: 1.0,
        }
    }
}

impl Default for ScrollerConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            max_speed: DEFAULT_MAX_SPEED,
            min_speed: DEFAULT_MIN_SPEED,
            connected_speed: DEFAULT_CONNECTED_SPEED,
            decel: DEFAULT_DECEL,
            stop_epsilon: DEFAULT_STOP_EPSILON,
            springback_resistance: DEFAULT_SPRINGBACK_RESISTANCE,
            strip_height: None,
            spinner: SpinnerConfig::default(),
            status_style: TextStyle::new(12.0, Color::rgb(0xaa, 0xaa, 0xaa)),
            marquee_style: TextStyle::new(12.0, Color::rgb(0x90, 0x00, 0x00)),
            searching_text: "... searching for images ...".to_string(),
        }
    }
}

impl ScrollerConfig {
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_speeds(mut self, min_speed: f64, max_speed: f64) -> Self {
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        self
    }

    pub fn with_connected_speed(mut self, speed: f64) -> Self {
        self.connected_speed = speed;
        self
    }

    pub fn with_decel(mut self, decel: f64) -> Self {
        self.decel = decel;
        self
    }

    pub fn with_springback_resistance(mut self, resistance: f64) -> Self {
        self.springback_resistance = resistance;
        self
    }

    pub fn with_strip_height(mut self, height: f64) -> Self {
        self.strip_height = Some(height);
        self
    }

    /// Interval between frames at the configured rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ScrollerError::InvalidConfig("fps must be greater than 0".into()));
        }
        if self.min_speed < 0.0 || self.max_speed < self.min_speed {
            return Err(ScrollerError::InvalidConfig(format!(
                "drift speeds must satisfy 0 <= min ({}) <= max ({})",
                self.min_speed, self.max_speed
            )));
        }
        if self.connected_speed <= 0.0 {
            return Err(ScrollerError::InvalidConfig(
                "connected speed must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.decel) {
            return Err(ScrollerError::InvalidConfig(format!(
                "decel must lie in [0, 1), got {}",
                self.decel
            )));
        }
        if self.springback_resistance <= 0.0 {
            return Err(ScrollerError::InvalidConfig(
                "springback resistance must be positive".into(),
            ));
        }
        if let Some(height) = self.strip_height {
            if height <= 0.0 {
                return Err(ScrollerError::InvalidConfig(
                    "strip height must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}
