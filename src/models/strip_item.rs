use super::DrawableHandle;

/// Lifecycle of an item on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPhase {
    /// Placed right of the surface and held off the visible row until the
    /// processing window reaches it.
    Parked,
    /// First frame on the row.
    Entering,
    /// Drifting left toward its resting slot.
    Sliding,
    /// At rest. Only pushback moves it from here, and only further left.
    Settled,
}

/// One image on the strip.
///
/// `x` is in strip coordinates; the scroll offset is layered on top at
/// render time.
#[derive(Debug, Clone)]
pub struct StripItem {
    handle: DrawableHandle,
    width: f64,
    pub(crate) x: f64,
    pub(crate) max_left: f64,
    pub(crate) settled: bool,
    pub(crate) phase: ItemPhase,
}

impl StripItem {
    pub(crate) fn parked(handle: DrawableHandle, width: f64, x: f64) -> Self {
        Self {
            handle,
            width,
            x,
            max_left: 0.0,
            settled: false,
            phase: ItemPhase::Parked,
        }
    }

    pub fn handle(&self) -> &DrawableHandle {
        &self.handle
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    /// Right edge in strip coordinates.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Lower bound on `x` imposed by the item to the left.
    pub fn max_left(&self) -> f64 {
        self.max_left
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn phase(&self) -> ItemPhase {
        self.phase
    }

    pub fn is_parked(&self) -> bool {
        self.phase == ItemPhase::Parked
    }

    /// Moves the phase forward at the start of a physics pass.
    pub(crate) fn begin_frame(&mut self) {
        self.phase = match self.phase {
            ItemPhase::Parked => ItemPhase::Entering,
            ItemPhase::Entering => ItemPhase::Sliding,
            other => other,
        };
    }

    /// Records that the left constraint bound this frame.
    ///
    /// Settledness is sticky: once set it is never cleared.
    pub(crate) fn settle_if(&mut self, left_neighbour_settled: bool) {
        if left_neighbour_settled {
            self.settled = true;
            self.phase = ItemPhase::Settled;
        }
    }

    /// Shifts the item left by `distance`, along with its bound.
    pub(crate) fn shift_left(&mut self, distance: f64) {
        self.x -= distance;
        self.max_left -= distance;
    }
}
