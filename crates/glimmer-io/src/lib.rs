//! glimmer-io: Browser I/O and Dioxus component library.
//!
//! Runs image prefetches through the browser, routes `log` records to
//! the console, and provides the [`ProgressiveImage`] component that
//! drives a `glimmer_reveal::RevealMachine`.

pub mod components;
pub mod logging;
pub mod prefetch;
pub mod style;

pub use components::ProgressiveImage;
pub use logging::ConsoleLogger;
pub use prefetch::{PrefetchError, prefetch_image};
