//! Dioxus UI components for glimmer.

mod progressive_image;

pub use progressive_image::{ProgressiveImage, ProgressiveImageProps};
