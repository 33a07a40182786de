//! Self-animating horizontal image strip.
//!
//! Images arrive one at a time from a growing feed, slide in from the right
//! edge, settle against their left neighbour and push the row left once it
//! fills the surface. The row can be flung with the pointer and springs back
//! when dragged past either end.

pub mod config;
pub mod driver;
pub mod error;
pub mod feed;
pub mod indicator;
pub mod input;
pub mod loader;
pub mod models;
pub mod physics;
pub mod resolve;
pub mod scroll;
pub mod session;
pub mod strip;
pub mod surface;

pub use config::ScrollerConfig;
pub use error::{Result, ScrollerError};
pub use feed::{SharedFeed, StatusFeed};
pub use input::{EventDisposition, PointerEvent};
pub use models::{DrawableHandle, ImageRef, ItemPhase, StripItem};
pub use session::{FrameReport, ScrollerSession, SessionStats};
pub use surface::Surface;
