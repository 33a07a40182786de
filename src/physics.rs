//! Per-frame strip motion: drift, push and clamp.
//!
//! Each frame the engine walks the processing window left to right. Items
//! drift left at a speed that peaks mid-surface, stop against their left
//! neighbour, and, once that neighbour has settled, push the settled prefix
//! further left to make room for themselves.

use tracing::{debug, trace};

use crate::config::ScrollerConfig;
use crate::scroll::ScrollState;
use crate::strip::StripModel;

#[derive(Debug, Clone, Copy)]
pub struct DriftParams {
    pub min_speed: f64,
    pub max_speed: f64,
    pub connected_speed: f64,
}

impl From<&ScrollerConfig> for DriftParams {
    fn from(config: &ScrollerConfig) -> Self {
        Self {
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            connected_speed: config.connected_speed,
        }
    }
}

impl DriftParams {
    /// Position after one frame of free drift from `x`.
    ///
    /// Items at or past the left edge do not drift.
    pub fn drift(&self, x: f64, surface_width: f64) -> f64 {
        if x <= 0.0 {
            return x;
        }
        let half = surface_width / 2.0;
        let frac = if half > 0.0 {
            (1.0 - (x - half).abs() / half).clamp(0.0, 1.0)
        } else {
            0.0
        };
        x - (self.min_speed + (self.max_speed - self.min_speed) * frac)
    }
}

/// Summary of one physics pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Items processed this frame.
    pub window: usize,
    /// Total distance the settled prefix was pushed left.
    pub pushed: f64,
    /// Items that settled during this frame.
    pub newly_settled: usize,
}

#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    params: DriftParams,
    /// Highest index whose right edge has been fully on-screen.
    cleared_right: Option<usize>,
}

impl PhysicsEngine {
    pub fn new(params: DriftParams) -> Self {
        Self {
            params,
            cleared_right: None,
        }
    }

    pub fn params(&self) -> &DriftParams {
        &self.params
    }

    pub fn cleared_right(&self) -> Option<usize> {
        self.cleared_right
    }

    /// Number of leading items processed this frame: everything that has
    /// cleared the right edge plus one more.
    pub fn window(&self, len: usize) -> usize {
        self.cleared_right.map_or(1, |k| k + 2).min(len)
    }

    pub fn step(
        &mut self,
        strip: &mut StripModel,
        scroll: &mut ScrollState,
        pointer_down: bool,
    ) -> StepReport {
        let surface_width = strip.surface_width();
        let connected = self.params.connected_speed;
        let window = self.window(strip.len());
        let items = strip.items_mut();
        let mut report = StepReport {
            window,
            ..Default::default()
        };

        for i in 0..window {
            items[i].begin_frame();
            let x = items[i].x;
            let width = items[i].width();
            let mut new_x = self.params.drift(x, surface_width);

            let left_settled = i > 0 && items[i - 1].settled;
            if left_settled && items[i].max_left > surface_width - width {
                // No room left of the right edge: shove the prefix along.
                new_x = x - connected;
                let distance = if items[i].max_left > surface_width {
                    connected
                } else {
                    items[i].max_left - new_x
                };
                if distance > 0.0 {
                    for item in items[..i].iter_mut() {
                        item.shift_left(distance);
                    }
                    items[i].max_left -= distance;
                    scroll.extend_left(distance, pointer_down);
                    report.pushed += distance;
                }
            }

            if new_x > items[i].max_left {
                items[i].x = new_x;
            } else {
                let was_settled = items[i].settled;
                items[i].x = items[i].max_left;
                items[i].settle_if(i == 0 || items[i - 1].settled);
                if items[i].settled && !was_settled {
                    report.newly_settled += 1;
                    debug!(index = i, x = items[i].x, "Item settled");
                }
            }

            if items[i].right() <= surface_width && self.cleared_right.map_or(true, |k| i > k) {
                self.cleared_right = Some(i);
                trace!(index = i, "Item cleared the right edge");
            }

            let right = items[i].right();
            if let Some(next) = items.get_mut(i + 1) {
                next.max_left = right;
            }
        }

        report
    }
}
