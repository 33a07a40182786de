//! Scroll offset, momentum and springback.
//!
//! The offset is a global translation layered over the strip: an item at
//! strip position `x` is drawn at `x - offset`. Valid offsets lie in
//! `[min_offset, 0]`; `min_offset` only ever moves further left as arriving
//! images push the strip.

use tracing::trace;

use crate::config::ScrollerConfig;
use crate::input::DragSample;

#[derive(Debug, Clone, Copy)]
pub struct MomentumParams {
    pub decel: f64,
    pub stop_epsilon: f64,
    pub springback_resistance: f64,
}

impl From<&ScrollerConfig> for MomentumParams {
    fn from(config: &ScrollerConfig) -> Self {
        Self {
            decel: config.decel,
            stop_epsilon: config.stop_epsilon,
            springback_resistance: config.springback_resistance,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    offset: f64,
    momentum: f64,
    min_offset: f64,
    springback: bool,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn min_offset(&self) -> f64 {
        self.min_offset
    }

    pub fn is_springing_back(&self) -> bool {
        self.springback
    }

    pub fn in_bounds(&self) -> bool {
        self.offset <= 0.0 && self.offset >= self.min_offset
    }

    /// Grows the scrollable range by `distance` after a push.
    ///
    /// A strip that is scrolled away from its right anchor, or held at it by
    /// the pointer, follows the push so the view stays where the user put it.
    pub(crate) fn extend_left(&mut self, distance: f64, pointer_down: bool) {
        self.min_offset -= distance;
        if self.offset < 0.0 || (self.offset == 0.0 && pointer_down) {
            self.offset -= distance;
        }
    }

    /// Advances momentum and offset by one frame.
    pub fn update(&mut self, sample: DragSample, params: &MomentumParams) {
        let pointer_down = sample.pointer_down();
        match sample {
            DragSample::Held { delta } => self.momentum = -delta,
            // Held off the surface: the last drag momentum is kept as is.
            DragSample::HeldOutside => {}
            DragSample::Released => self.decay(params),
        }

        if self.springback {
            self.apply_springback(pointer_down, params);
        }

        self.offset += self.momentum;
        self.springback = self.offset > 0.0 || self.offset < self.min_offset;
        trace!(
            offset = self.offset,
            momentum = self.momentum,
            min_offset = self.min_offset,
            springback = self.springback,
            "Scroll updated"
        );
    }

    fn decay(&mut self, params: &MomentumParams) {
        if self.momentum != 0.0 {
            self.momentum *= params.decel;
            if self.momentum.abs() < params.stop_epsilon {
                self.momentum = 0.0;
            }
        }
    }

    fn apply_springback(&mut self, pointer_down: bool, params: &MomentumParams) {
        // +1 pulls left toward 0, -1 pulls right toward min_offset.
        let (excess, sign) = if self.offset > 0.0 {
            (self.offset, 1.0)
        } else if self.offset < self.min_offset {
            (self.min_offset - self.offset, -1.0)
        } else {
            (0.0, 0.0)
        };
        let accel = (params.springback_resistance * excess).powi(2);

        // Dragging back into range is left alone.
        if pointer_down && sign * self.momentum < 0.0 {
            return;
        }

        self.momentum -= sign * accel;
        if pointer_down {
            // Held: resist outward motion but never pull.
            if sign * self.momentum < 0.0 {
                self.momentum = 0.0;
            }
            return;
        }

        if self.offset > 0.0 && self.offset + self.momentum < 0.0 {
            self.offset = 0.0;
            self.momentum = 0.0;
        } else if self.offset < self.min_offset && self.offset + self.momentum > self.min_offset {
            self.offset = self.min_offset;
            self.momentum = 0.0;
        }
    }
}
