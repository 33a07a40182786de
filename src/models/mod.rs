pub mod drawable;
pub mod image_ref;
pub mod strip_item;

pub use drawable::*;
pub use image_ref::*;
pub use strip_item::*;
