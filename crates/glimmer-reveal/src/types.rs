//! Shared types for the glimmer reveal pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as integer milliseconds.
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    /// Deserialize a `Duration` from integer milliseconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// A local resource bundled with the application.
///
/// Opaque to callers: it is produced by a
/// [`ResourceResolver`](crate::registry::ResourceResolver) or an
/// [`AssetRegistry`](crate::registry::AssetRegistry) and is always safe
/// to display without a network step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalResource {
    path: String,
    href: String,
}

impl LocalResource {
    /// Create a resource for the packaging `path`, rendered from `href`.
    #[must_use]
    pub fn new(path: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            href: href.into(),
        }
    }

    /// The packaging path this resource was resolved from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The URL a renderer should load the resource from.
    #[must_use]
    pub fn href(&self) -> &str {
        &self.href
    }
}

/// Normalized reference to an image resource.
///
/// Serialized externally tagged, so a locator reads as
/// `{ "uri": "https://..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDescriptor {
    /// Network or filesystem locator. Must be fetched before it is safe
    /// to display.
    Uri(String),
    /// Pre-resolved local resource. Immediately safe to display.
    Local(LocalResource),
}

impl ImageDescriptor {
    /// The locator, if this descriptor needs a fetch before display.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Uri(uri) => Some(uri),
            Self::Local(_) => None,
        }
    }

    /// The URL a renderer should load this image from.
    #[must_use]
    pub fn href(&self) -> &str {
        match self {
            Self::Uri(uri) => uri,
            Self::Local(resource) => resource.href(),
        }
    }
}

/// A caller-supplied image reference, before resolution.
///
/// Deserialized untagged: a bare JSON string is a locator, an object is
/// a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// An asset name or a network/filesystem locator.
    Locator(String),
    /// An already-resolved descriptor, passed through as-is.
    Descriptor(ImageDescriptor),
}

impl From<&str> for ImageSource {
    fn from(value: &str) -> Self {
        Self::Locator(value.to_owned())
    }
}

impl From<String> for ImageSource {
    fn from(value: String) -> Self {
        Self::Locator(value)
    }
}

impl From<ImageDescriptor> for ImageSource {
    fn from(value: ImageDescriptor) -> Self {
        Self::Descriptor(value)
    }
}

impl From<LocalResource> for ImageSource {
    fn from(value: LocalResource) -> Self {
        Self::Descriptor(ImageDescriptor::Local(value))
    }
}

/// The reveal flags of one mounted image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealState {
    /// The final-resolution image has signalled a successful display.
    pub is_loaded: bool,
    /// The full descriptor is safe to mount: either it has no locator,
    /// or its prefetch succeeded.
    pub is_prefetched: bool,
}

/// How an image is fitted into its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMode {
    /// Scale uniformly to fill the box, cropping the overflow.
    #[default]
    Cover,
    /// Scale uniformly to fit inside the box, letterboxing.
    Contain,
    /// Scale each axis independently to fill the box.
    Stretch,
    /// Keep the intrinsic size, centred in the box.
    Center,
    /// Tile the image at its intrinsic size.
    Repeat,
}

/// Caller styling recognized by the image component.
///
/// A zero or absent width/height means "fill the parent" along that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageStyle {
    /// Explicit width in pixels.
    pub width: Option<f64>,
    /// Explicit height in pixels.
    pub height: Option<f64>,
    /// Corner radius in pixels. Square corners when absent.
    pub border_radius: Option<f64>,
}

/// One axis of an image box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    /// Fixed size in pixels.
    Explicit(f64),
    /// Stretch to the parent along this axis.
    Fill,
}

/// Resolved geometry shared by the thumbnail and final image layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBox {
    /// Horizontal extent.
    pub width: Extent,
    /// Vertical extent.
    pub height: Extent,
    /// Corner radius in pixels.
    pub border_radius: f64,
}

impl ImageStyle {
    /// Resolve the style into the box both image layers are drawn in.
    #[must_use]
    pub fn image_box(&self) -> ImageBox {
        let extent = |value: Option<f64>| match value {
            Some(v) if v > 0.0 => Extent::Explicit(v),
            _ => Extent::Fill,
        };
        ImageBox {
            width: extent(self.width),
            height: extent(self.height),
            border_radius: self.border_radius.unwrap_or(0.0).max(0.0),
        }
    }
}

/// Skeleton pulse parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Opacity the skeleton starts from before the first leg.
    pub rest: f32,
    /// Lower bound of the oscillation.
    pub low: f32,
    /// Upper bound of the oscillation.
    pub high: f32,
    /// Duration of one leg (low to high or high to low).
    #[serde(with = "duration_ms")]
    pub leg_duration: Duration,
}

impl PulseConfig {
    /// Default resting opacity.
    pub const DEFAULT_REST: f32 = 0.6;
    /// Default lower bound.
    pub const DEFAULT_LOW: f32 = 0.4;
    /// Default upper bound.
    pub const DEFAULT_HIGH: f32 = 0.7;
    /// Default leg duration.
    pub const DEFAULT_LEG_DURATION: Duration = Duration::from_millis(500);
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            rest: Self::DEFAULT_REST,
            low: Self::DEFAULT_LOW,
            high: Self::DEFAULT_HIGH,
            leg_duration: Self::DEFAULT_LEG_DURATION,
        }
    }
}

/// Path rewriting rules for the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Locator prefixes that mark a network resource. These are never
    /// rewritten.
    pub network_schemes: Vec<String>,
    /// Prefix of the original (unoptimized) asset tree.
    pub source_prefix: String,
    /// Prefix of the optimized asset tree that replaces `source_prefix`.
    pub optimized_prefix: String,
    /// Substring a rewritten path must contain to be worth resolving.
    pub optimized_marker: String,
}

impl OptimizerConfig {
    /// Default original asset prefix.
    pub const DEFAULT_SOURCE_PREFIX: &'static str = "assets/images/";
    /// Default optimized asset prefix.
    pub const DEFAULT_OPTIMIZED_PREFIX: &'static str = "assets/optimized-images/";
    /// Default optimized marker.
    pub const DEFAULT_OPTIMIZED_MARKER: &'static str = "optimized-images";

    /// Whether `locator` starts with one of the network schemes.
    #[must_use]
    pub fn is_network(&self, locator: &str) -> bool {
        self.network_schemes
            .iter()
            .any(|scheme| locator.starts_with(scheme.as_str()))
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            network_schemes: vec!["http://".to_owned(), "https://".to_owned()],
            source_prefix: Self::DEFAULT_SOURCE_PREFIX.to_owned(),
            optimized_prefix: Self::DEFAULT_OPTIMIZED_PREFIX.to_owned(),
            optimized_marker: Self::DEFAULT_OPTIMIZED_MARKER.to_owned(),
        }
    }
}

/// Colours used by the placeholder layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Backdrop behind the skeleton and spinner when there is no thumbnail.
    pub backdrop: String,
    /// Skeleton fill.
    pub skeleton: String,
    /// Spinner stroke.
    pub spinner: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            backdrop: "#e6f0ec".to_owned(),
            skeleton: "#d9e3df".to_owned(),
            spinner: "#2E7D6A".to_owned(),
        }
    }
}

/// Configuration for one reveal machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Duration of the fade from transparent to opaque on reveal.
    #[serde(with = "duration_ms")]
    pub fade_duration: Duration,
    /// Skeleton pulse parameters.
    pub pulse: PulseConfig,
    /// Path rewriting rules.
    pub optimizer: OptimizerConfig,
    /// Placeholder colours.
    pub theme: Theme,
}

impl RevealConfig {
    /// Default fade duration.
    pub const DEFAULT_FADE_DURATION: Duration = Duration::from_millis(260);
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            fade_duration: Self::DEFAULT_FADE_DURATION,
            pulse: PulseConfig::default(),
            optimizer: OptimizerConfig::default(),
            theme: Theme::default(),
        }
    }
}

/// Errors from resolving a packaging path to a local resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No resource is bundled at this path.
    #[error("no bundled asset at {0}")]
    NotFound(String),

    /// The path can never name a bundled resource.
    #[error("invalid asset path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}
