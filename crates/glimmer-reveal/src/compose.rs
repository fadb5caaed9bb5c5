//! Render compositor: reveal state to visible layers.
//!
//! Layers are listed back to front. The compositor is a pure function of
//! its inputs and knows nothing about how a host draws them.

use serde::{Deserialize, Serialize};

use crate::prefetch::Generation;
use crate::resolve::ResolvedSources;
use crate::types::{ImageDescriptor, RevealState};

/// The final-resolution image layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalLayer {
    /// What to render: the optimized variant if one was resolved,
    /// otherwise the full descriptor.
    pub source: ImageDescriptor,
    /// Opacity the fade is heading to: 0 until revealed, then 1.
    pub fade_target: f32,
    /// Reveal cycle the layer is mounted under. Load callbacks must echo
    /// it back.
    pub generation: Generation,
}

/// Which layers are visible, back to front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layers {
    /// Neutral fill behind the placeholders. Only without a thumbnail.
    pub backdrop: bool,
    /// Pulsing skeleton. Exactly while the image is not loaded.
    pub skeleton: bool,
    /// Low-resolution placeholder, shown whenever one resolved.
    pub thumbnail: Option<ImageDescriptor>,
    /// Activity indicator for network images with nothing else to show.
    pub spinner: bool,
    /// The final image, once it is safe to mount.
    pub final_image: Option<FinalLayer>,
}

/// Compute the layer set for one image.
#[must_use]
pub fn compose(sources: &ResolvedSources, state: RevealState, generation: Generation) -> Layers {
    let has_thumbnail = sources.thumbnail.is_some();
    let full_has_uri = sources
        .full
        .as_ref()
        .is_some_and(|full| full.uri().is_some());

    let final_image = sources
        .full
        .as_ref()
        .filter(|full| state.is_prefetched || full.uri().is_none())
        .and_then(|_| sources.final_source())
        .map(|source| FinalLayer {
            source,
            fade_target: if state.is_loaded { 1.0 } else { 0.0 },
            generation,
        });

    Layers {
        backdrop: !has_thumbnail,
        skeleton: !state.is_loaded,
        thumbnail: sources.thumbnail.clone(),
        spinner: !has_thumbnail && full_has_uri && !state.is_loaded && !state.is_prefetched,
        final_image,
    }
}
