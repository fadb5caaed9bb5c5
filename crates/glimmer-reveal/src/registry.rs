//! Asset lookup: the static name registry and the packaging-path resolver.
//!
//! Both are consumed through traits so the reveal pipeline never depends
//! on how assets are bundled. [`StaticAssets`] is the in-memory
//! implementation used by the web app and the trace tool; it can be
//! built in code or deserialized from a manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ImageDescriptor, LocalResource, ResolveError};

/// Maps asset names to descriptors.
///
/// Must be synchronous and free of side effects.
pub trait AssetRegistry {
    /// Look up a descriptor by asset name.
    fn lookup(&self, name: &str) -> Option<ImageDescriptor>;
}

/// Resolves packaging paths to bundled resources.
pub trait ResourceResolver {
    /// Resolve `path` to a local resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when nothing is bundled at
    /// `path`, or [`ResolveError::InvalidPath`] when `path` can never
    /// name a bundled resource.
    fn resolve(&self, path: &str) -> Result<LocalResource, ResolveError>;
}

/// One bundled resource in an [`AssetManifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestResource {
    /// Packaging path, e.g. `assets/optimized-images/logo.png`.
    pub path: String,
    /// URL to render the resource from. Defaults to `/{path}`.
    #[serde(default)]
    pub href: Option<String>,
}

/// Serializable description of a [`StaticAssets`] catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    /// Asset names and the descriptors they stand for.
    pub names: BTreeMap<String, ImageDescriptor>,
    /// Resources bundled with the application.
    pub resources: Vec<ManifestResource>,
}

/// In-memory asset catalog implementing both lookup traits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAssets {
    names: BTreeMap<String, ImageDescriptor>,
    resources: BTreeMap<String, LocalResource>,
}

impl StaticAssets {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as an alias for `descriptor`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>, descriptor: ImageDescriptor) -> Self {
        self.names.insert(name.into(), descriptor);
        self
    }

    /// Bundle a resource at `path`, rendered from `href`.
    #[must_use]
    pub fn with_resource(mut self, path: impl Into<String>, href: impl Into<String>) -> Self {
        let path = path.into();
        let resource = LocalResource::new(path.clone(), href);
        self.resources.insert(path, resource);
        self
    }

    /// Number of bundled resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

impl From<AssetManifest> for StaticAssets {
    fn from(manifest: AssetManifest) -> Self {
        let mut assets = Self {
            names: manifest.names,
            resources: BTreeMap::new(),
        };
        for entry in manifest.resources {
            let href = entry.href.unwrap_or_else(|| format!("/{}", entry.path));
            assets = assets.with_resource(entry.path, href);
        }
        assets
    }
}

impl AssetRegistry for StaticAssets {
    fn lookup(&self, name: &str) -> Option<ImageDescriptor> {
        self.names.get(name).cloned()
    }
}

impl ResourceResolver for StaticAssets {
    fn resolve(&self, path: &str) -> Result<LocalResource, ResolveError> {
        validate_path(path)?;
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(path.to_owned()))
    }
}

/// Reject paths that cannot be inside the bundle.
fn validate_path(path: &str) -> Result<(), ResolveError> {
    let invalid = |reason| {
        Err(ResolveError::InvalidPath {
            path: path.to_owned(),
            reason,
        })
    };
    if path.is_empty() {
        return invalid("empty path");
    }
    if path.starts_with('/') {
        return invalid("absolute path");
    }
    if path.split('/').any(|segment| segment == "..") {
        return invalid("parent directory segment");
    }
    Ok(())
}
