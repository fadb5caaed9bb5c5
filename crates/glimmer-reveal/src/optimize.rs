//! Best-effort substitution of optimized asset variants.
//!
//! Bundled images under the source prefix (`assets/images/` by default)
//! may have a precomputed, smaller variant under the optimized prefix
//! (`assets/optimized-images/`). [`optimize_path`] rewrites the locator
//! and resolves it; anything that goes wrong leaves the input untouched.
//!
//! The function is total: the outcome is a tagged [`Optimization`], never
//! an error. Resolution failures are logged at `warn` level and otherwise
//! swallowed so a missing variant can never break the caller.

use crate::registry::ResourceResolver;
use crate::types::{ImageDescriptor, ImageSource, LocalResource, OptimizerConfig};

/// Result of attempting to optimize an image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Optimization {
    /// The optimized variant exists and was resolved.
    Optimized(LocalResource),
    /// No substitution applies; carries the reference to use instead.
    ///
    /// Network locators come back normalized as
    /// `ImageSource::Descriptor(ImageDescriptor::Uri(..))`; everything
    /// else is the caller's input verbatim.
    Unchanged(ImageSource),
}

impl Optimization {
    /// The optimized resource, if one was resolved.
    #[must_use]
    pub const fn optimized(&self) -> Option<&LocalResource> {
        match self {
            Self::Optimized(resource) => Some(resource),
            Self::Unchanged(_) => None,
        }
    }

    /// Convert back into an image reference, e.g. to feed the optimizer
    /// again.
    #[must_use]
    pub fn into_source(self) -> ImageSource {
        match self {
            Self::Optimized(resource) => ImageSource::from(resource),
            Self::Unchanged(source) => source,
        }
    }
}

/// Attempt to substitute the optimized variant of `source`.
///
/// - Network locators are returned as `Unchanged(Uri(locator))` without
///   any rewrite.
/// - Locators under `config.source_prefix` are rewritten to
///   `config.optimized_prefix` and resolved through `resolver`.
/// - A rewritten path lacking `config.optimized_marker`, a pre-resolved
///   local resource, or a failed resolution all yield
///   `Unchanged(source)`.
pub fn optimize_path<R>(source: &ImageSource, resolver: &R, config: &OptimizerConfig) -> Optimization
where
    R: ResourceResolver + ?Sized,
{
    let Some(locator) = effective_locator(source) else {
        return Optimization::Unchanged(source.clone());
    };

    if config.is_network(locator) {
        return Optimization::Unchanged(ImageSource::Descriptor(ImageDescriptor::Uri(
            locator.to_owned(),
        )));
    }

    let rewritten = rewrite(locator, config);
    if !rewritten.contains(config.optimized_marker.as_str()) {
        return Optimization::Unchanged(source.clone());
    }

    match resolver.resolve(&rewritten) {
        Ok(resource) => Optimization::Optimized(resource),
        Err(e) => {
            log::warn!("optimized variant unavailable for {locator}: {e}");
            Optimization::Unchanged(source.clone())
        }
    }
}

/// The string locator carried by `source`, if any.
fn effective_locator(source: &ImageSource) -> Option<&str> {
    match source {
        ImageSource::Locator(locator) => Some(locator),
        ImageSource::Descriptor(descriptor) => descriptor.uri(),
    }
}

/// Swap the source prefix for the optimized prefix.
fn rewrite(locator: &str, config: &OptimizerConfig) -> String {
    locator
        .strip_prefix(config.source_prefix.as_str())
        .map_or_else(
            || locator.to_owned(),
            |rest| format!("{}{rest}", config.optimized_prefix),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticAssets;

    fn assets() -> StaticAssets {
        StaticAssets::new().with_resource("assets/optimized-images/logo.png", "/opt/logo.png")
    }

    fn optimize(source: &ImageSource) -> Optimization {
        optimize_path(source, &assets(), &OptimizerConfig::default())
    }

    #[test]
    fn rewrites_and_resolves_existing_variant() {
        let result = optimize(&"assets/images/logo.png".into());
        let resource = result.optimized().cloned();
        assert_eq!(
            resource,
            Some(LocalResource::new(
                "assets/optimized-images/logo.png",
                "/opt/logo.png"
            ))
        );
    }

    #[test]
    fn missing_variant_returns_original() {
        let source = ImageSource::from("assets/images/missing.png");
        assert_eq!(optimize(&source), Optimization::Unchanged(source));
    }

    #[test]
    fn network_locator_is_normalized_not_rewritten() {
        let result = optimize(&"https://cdn.example.com/a.jpg".into());
        assert_eq!(
            result,
            Optimization::Unchanged(ImageSource::Descriptor(ImageDescriptor::Uri(
                "https://cdn.example.com/a.jpg".into()
            )))
        );
    }

    #[test]
    fn uri_descriptor_under_source_prefix_is_rewritten() {
        let source = ImageSource::Descriptor(ImageDescriptor::Uri("assets/images/logo.png".into()));
        assert!(optimize(&source).optimized().is_some());
    }

    #[test]
    fn local_descriptor_is_unchanged() {
        let source = ImageSource::from(LocalResource::new("assets/images/a.png", "/a.png"));
        assert_eq!(optimize(&source), Optimization::Unchanged(source));
    }

    #[test]
    fn unrelated_path_is_unchanged() {
        let source = ImageSource::from("photos/beach.png");
        assert_eq!(optimize(&source), Optimization::Unchanged(source));
    }

    #[test]
    fn already_optimized_path_is_resolved_directly() {
        let result = optimize(&"assets/optimized-images/logo.png".into());
        assert!(result.optimized().is_some());
    }

    #[test]
    fn invalid_rewritten_path_returns_original() {
        let source = ImageSource::from("assets/images/../logo.png");
        assert_eq!(optimize(&source), Optimization::Unchanged(source));
    }

    #[test]
    fn idempotent_on_non_matching_inputs() {
        let inputs: [ImageSource; 4] = [
            "photos/beach.png".into(),
            "https://cdn.example.com/a.jpg".into(),
            "assets/images/missing.png".into(),
            LocalResource::new("x", "/x").into(),
        ];
        for input in inputs {
            let once = optimize(&input);
            let twice = optimize(&once.clone().into_source());
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn custom_prefixes() {
        let config = OptimizerConfig {
            source_prefix: "img/".into(),
            optimized_prefix: "img-small/".into(),
            optimized_marker: "img-small".into(),
            ..OptimizerConfig::default()
        };
        let assets = StaticAssets::new().with_resource("img-small/a.png", "/a.png");
        let result = optimize_path(&"img/a.png".into(), &assets, &config);
        assert!(result.optimized().is_some());
    }
}
