//! Single-slot image load pipeline.
//!
//! - `fetch`: turns a resolved address into decoded pixels
//! - `pipeline`: at most one load in flight, completions consumed per frame

pub mod fetch;
pub mod pipeline;

pub use fetch::{FsFetcher, ImageFetcher};
pub use pipeline::{LoadMode, LoadOutcome, LoadPipeline, LoadStats};
