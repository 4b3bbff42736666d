//! Source image resolution and normalization.

pub mod image;

pub use image::{FileImageSource, ImageSource};
