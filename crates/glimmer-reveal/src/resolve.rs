//! Source resolution: caller references to normalized descriptors.

use crate::optimize::{Optimization, optimize_path};
use crate::registry::{AssetRegistry, ResourceResolver};
use crate::types::{ImageDescriptor, ImageSource, OptimizerConfig};

/// Resolve a caller reference into a descriptor.
///
/// Strings are looked up in `registry` first; a miss is not an error, the
/// string is treated as a direct locator instead. Descriptors pass
/// through unchanged.
pub fn resolve_source<R>(source: Option<&ImageSource>, registry: &R) -> Option<ImageDescriptor>
where
    R: AssetRegistry + ?Sized,
{
    match source? {
        ImageSource::Locator(name) => Some(
            registry
                .lookup(name)
                .unwrap_or_else(|| ImageDescriptor::Uri(name.clone())),
        ),
        ImageSource::Descriptor(descriptor) => Some(descriptor.clone()),
    }
}

/// Everything the reveal machine needs to know about one set of props.
///
/// The thumbnail and the full reference are resolved independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSources {
    /// The full-resolution descriptor.
    pub full: Option<ImageDescriptor>,
    /// The low-resolution placeholder descriptor.
    pub thumbnail: Option<ImageDescriptor>,
    /// Optimizer outcome for the full reference. `None` when there is no
    /// full reference.
    pub optimized: Option<Optimization>,
}

impl ResolvedSources {
    /// Resolve both references and run the optimizer on the full one.
    pub fn resolve<A>(
        full: Option<&ImageSource>,
        thumbnail: Option<&ImageSource>,
        assets: &A,
        config: &OptimizerConfig,
    ) -> Self
    where
        A: AssetRegistry + ResourceResolver + ?Sized,
    {
        Self {
            full: resolve_source(full, assets),
            thumbnail: resolve_source(thumbnail, assets),
            optimized: full.map(|source| optimize_path(source, assets, config)),
        }
    }

    /// The descriptor the final image layer should render: the optimized
    /// variant when one was resolved, otherwise the full descriptor.
    #[must_use]
    pub fn final_source(&self) -> Option<ImageDescriptor> {
        let full = self.full.as_ref()?;
        Some(
            self.optimized
                .as_ref()
                .and_then(Optimization::optimized)
                .map_or_else(|| full.clone(), |r| ImageDescriptor::Local(r.clone())),
        )
    }
}
