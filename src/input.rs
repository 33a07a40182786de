//! Pointer input fusion.
//!
//! Raw pointer events update a running drag position; the session samples it
//! once per frame to turn the distance moved since the previous frame into
//! scroll momentum.

use tracing::trace;

/// A pointer event in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    /// Release anywhere on the page, not only over the surface.
    Up,
    Enter { x: f64, y: f64 },
    Leave,
}

/// What the host should do with the event after the scroller saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventDisposition {
    /// Suppress text selection and native image drag for this event.
    pub suppress_default: bool,
}

/// Pointer state as consumed by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragSample {
    /// Held over the surface; `delta` is the x distance moved since the
    /// previous frame.
    Held { delta: f64 },
    /// Held but outside the surface.
    HeldOutside,
    Released,
}

impl DragSample {
    pub fn pointer_down(self) -> bool {
        !matches!(self, DragSample::Released)
    }
}

#[derive(Debug, Clone)]
pub struct DragState {
    origin: (f64, f64),
    size: (f64, f64),
    pointer_down: bool,
    inside: bool,
    last_x: f64,
    last_y: f64,
    current_x: f64,
    current_y: f64,
}

impl DragState {
    /// `origin` is the surface's top-left corner in page coordinates.
    pub fn new(origin: (f64, f64), size: (f64, f64)) -> Self {
        Self {
            origin,
            size,
            pointer_down: false,
            inside: false,
            last_x: 0.0,
            last_y: 0.0,
            current_x: 0.0,
            current_y: 0.0,
        }
    }

    pub fn set_origin(&mut self, origin: (f64, f64)) {
        self.origin = origin;
    }

    pub fn pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn pointer_inside(&self) -> bool {
        self.inside
    }

    /// True while a drag that started on the surface is in progress.
    pub fn owns_gesture(&self) -> bool {
        self.pointer_down
    }

    fn local(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.origin.0, y - self.origin.1)
    }

    fn contains(&self, (x, y): (f64, f64)) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.size.0 && y < self.size.1
    }

    fn seed(&mut self, (x, y): (f64, f64)) {
        self.last_x = x;
        self.last_y = y;
        self.current_x = x;
        self.current_y = y;
    }

    pub fn handle(&mut self, event: PointerEvent) -> EventDisposition {
        trace!(?event, down = self.pointer_down, inside = self.inside, "Pointer event");
        match event {
            PointerEvent::Down { x, y } => {
                let pos = self.local(x, y);
                if !self.contains(pos) {
                    return EventDisposition::default();
                }
                self.pointer_down = true;
                self.inside = true;
                self.seed(pos);
            }
            PointerEvent::Move { x, y } => {
                let pos = self.local(x, y);
                let inside = self.contains(pos);
                if inside && !self.inside && self.pointer_down {
                    // Re-entering with the button held: start a fresh delta.
                    self.seed(pos);
                }
                self.inside = inside;
                if inside {
                    self.current_x = pos.0;
                    self.current_y = pos.1;
                }
            }
            PointerEvent::Enter { x, y } => {
                let pos = self.local(x, y);
                if self.pointer_down {
                    self.seed(pos);
                }
                self.inside = true;
            }
            PointerEvent::Leave => {
                self.inside = false;
            }
            PointerEvent::Up => {
                let was_down = self.pointer_down;
                self.reset();
                return EventDisposition {
                    suppress_default: was_down,
                };
            }
        }
        EventDisposition {
            suppress_default: self.pointer_down,
        }
    }

    /// Consumes the movement accumulated since the previous frame.
    pub fn sample(&mut self) -> DragSample {
        match (self.pointer_down, self.inside) {
            (true, true) => {
                let delta = self.current_x - self.last_x;
                self.last_x = self.current_x;
                self.last_y = self.current_y;
                DragSample::Held { delta }
            }
            (true, false) => DragSample::HeldOutside,
            (false, _) => DragSample::Released,
        }
    }

    /// Drops the transient drag, keeping the surface geometry.
    pub fn reset(&mut self) {
        let inside = self.inside;
        *self = Self::new(self.origin, self.size);
        self.inside = inside;
    }
}
