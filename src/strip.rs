//! The ordered row of placed images.
//!
//! Items are appended in arrival order and never removed or reordered. The
//! physics pass only touches positions, bounds and settledness.

use anyhow::bail;
use tracing::debug;

use crate::models::{DrawableHandle, StripItem};

#[derive(Debug)]
pub struct StripModel {
    items: Vec<StripItem>,
    surface_width: f64,
    strip_height: f64,
}

impl StripModel {
    pub fn new(surface_width: f64, strip_height: f64) -> Self {
        Self {
            items: Vec::new(),
            surface_width,
            strip_height,
        }
    }

    pub fn surface_width(&self) -> f64 {
        self.surface_width
    }

    pub fn strip_height(&self) -> f64 {
        self.strip_height
    }

    /// Places a freshly loaded image just right of the surface, parked until
    /// the physics window reaches it. Returns its index.
    pub fn append(&mut self, handle: DrawableHandle) -> usize {
        let width = handle.scaled_width(self.strip_height);
        let index = self.items.len();
        debug!(
            index,
            reference = %handle.reference,
            width,
            "Appending image to strip"
        );
        self.items
            .push(StripItem::parked(handle, width, self.surface_width));
        index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[StripItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&StripItem> {
        self.items.get(index)
    }

    pub(crate) fn items_mut(&mut self) -> &mut [StripItem] {
        &mut self.items
    }

    /// Length of the settled prefix.
    pub fn settled_count(&self) -> usize {
        self.items.iter().take_while(|item| item.is_settled()).count()
    }

    /// Checks the structural invariants: settledness forms a prefix and no
    /// item on the row sits left of its bound.
    pub fn check_invariants(&self) -> anyhow::Result<()> {
        let settled = self.settled_count();
        if let Some(gap) = self.items[settled..].iter().position(|i| i.is_settled()) {
            bail!("item {} is settled but item {} is not", settled + gap, settled);
        }
        for (index, item) in self.items.iter().enumerate() {
            if !item.is_parked() && item.x() < item.max_left() - 1e-9 {
                bail!(
                    "item {} at x={} is left of its bound {}",
                    index,
                    item.x(),
                    item.max_left()
                );
            }
        }
        Ok(())
    }
}
