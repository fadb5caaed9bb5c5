//! glimmer-reveal: Pure progressive image reveal (sans-IO).
//!
//! Turns caller image references into a layered render description:
//! resolve -> optimize -> prefetch bookkeeping -> reveal state machine ->
//! compositor.
//!
//! This crate has **no I/O dependencies**. Prefetches, load callbacks and
//! animation are requested through [`Command`]s and reported back as
//! [`Event`]s; the browser side lives in `glimmer-io`.
//!
//! ```rust
//! use glimmer_reveal::{
//!     Command, Event, PrefetchOutcome, ResolvedSources, RevealConfig, RevealMachine,
//!     StaticAssets,
//! };
//!
//! let config = RevealConfig::default();
//! let assets = StaticAssets::new();
//! let mut machine = RevealMachine::new(&config);
//!
//! let sources = ResolvedSources::resolve(
//!     Some(&"https://cdn.example.com/a.jpg".into()),
//!     None,
//!     &assets,
//!     &config.optimizer,
//! );
//! let commands = machine.handle(Event::SourceChanged(sources));
//! assert!(machine.layers().spinner);
//!
//! for command in commands {
//!     if let Command::IssuePrefetch(ticket) = command {
//!         machine.handle(Event::PrefetchSettled {
//!             ticket,
//!             outcome: PrefetchOutcome::Succeeded,
//!         });
//!     }
//! }
//! let generation = machine.state().generation();
//! machine.handle(Event::FinalImageLoaded { generation });
//! assert!(!machine.layers().skeleton);
//! ```

pub mod animation;
pub mod compose;
pub mod machine;
pub mod optimize;
pub mod prefetch;
pub mod registry;
pub mod resolve;
pub mod types;

pub use animation::{Animator, FadeTrack, PulseTrack};
pub use compose::{FinalLayer, Layers, compose};
pub use machine::{Command, Event, MachineState, Phase, RevealMachine, Transition};
pub use optimize::{Optimization, optimize_path};
pub use prefetch::{Generation, PrefetchController, PrefetchOutcome, PrefetchStatus, PrefetchTicket};
pub use registry::{AssetManifest, AssetRegistry, ManifestResource, ResourceResolver, StaticAssets};
pub use resolve::{ResolvedSources, resolve_source};
pub use types::{
    Extent, ImageBox, ImageDescriptor, ImageSource, ImageStyle, LocalResource, OptimizerConfig,
    PulseConfig, ResizeMode, ResolveError, RevealConfig, RevealState, Theme,
};
