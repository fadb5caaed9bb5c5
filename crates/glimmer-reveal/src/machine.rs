//! The reveal state machine.
//!
//! [`MachineState::transition`] is a pure function: it consumes the
//! current state and one [`Event`] and returns the next state together
//! with the side effects the host must perform, as a list of
//! [`Command`]s. Nothing here touches the network, a clock, or a UI tree,
//! so every reveal sequence can be replayed deterministically in tests.
//!
//! # Lifecycle
//!
//! ```text
//!            SourceChanged (new full descriptor)
//!        ┌──────────────────────────────────────────┐
//!        ▼                                          │
//!    Pending ── FinalImageLoaded (mounted, current) ──▶ Revealed
//!        │                                          │
//!        └────────────── Teardown ──────────────────┴──▶ disposed
//! ```
//!
//! The prefetch status is orthogonal to the phase: it only decides
//! whether the final image layer may be mounted, and the final image can
//! only report a load once it is mounted. For network descriptors this
//! gives the two-step gate "prefetch succeeded, then image displayed".

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compose::{Layers, compose};
use crate::prefetch::{
    Generation, PrefetchController, PrefetchOutcome, PrefetchStatus, PrefetchTicket,
};
use crate::resolve::ResolvedSources;
use crate::types::{RevealConfig, RevealState};

/// Reveal phase of the current descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Placeholder visuals; the skeleton pulses.
    #[default]
    Pending,
    /// The final image reported a successful display. Terminal until the
    /// descriptor changes.
    Revealed,
}

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The caller's references were (re)resolved.
    SourceChanged(ResolvedSources),
    /// A prefetch issued through [`Command::IssuePrefetch`] settled.
    PrefetchSettled {
        /// The ticket the prefetch was issued with.
        ticket: PrefetchTicket,
        /// How it settled.
        outcome: PrefetchOutcome,
    },
    /// The mounted final image finished loading.
    FinalImageLoaded {
        /// Generation the final layer was mounted under.
        generation: Generation,
    },
    /// The component is being unmounted.
    Teardown,
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    /// Jump the final image opacity back to transparent.
    ResetFade,
    /// (Re)start the skeleton pulse loop.
    StartPulse,
    /// Stop the skeleton pulse loop.
    StopPulse,
    /// Animate the final image opacity to `target`.
    StartFade {
        /// Target opacity.
        target: f32,
        /// Animation duration.
        #[serde(with = "crate::types::duration_ms")]
        duration: Duration,
    },
    /// Prefetch `ticket.locator` and report back with
    /// [`Event::PrefetchSettled`].
    IssuePrefetch(PrefetchTicket),
    /// Any settlement for this generation will be ignored; the host may
    /// drop its callback.
    DefusePrefetch {
        /// The superseded reveal cycle.
        generation: Generation,
    },
}

/// Output of [`MachineState::transition`].
#[derive(Debug, Clone, PartialEq)]
#[must_use = "the new state replaces the old one and the commands must be executed"]
pub struct Transition {
    /// The state after the event.
    pub state: MachineState,
    /// Side effects to perform, in order.
    pub commands: Vec<Command>,
}

/// Complete state of one mounted image.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineState {
    sources: ResolvedSources,
    phase: Phase,
    prefetch: PrefetchController,
    fade_duration: Duration,
    disposed: bool,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new(&RevealConfig::default())
    }
}

impl MachineState {
    /// A fresh, sourceless state.
    #[must_use]
    pub fn new(config: &RevealConfig) -> Self {
        Self {
            sources: ResolvedSources::default(),
            phase: Phase::Pending,
            prefetch: PrefetchController::new(),
            fade_duration: config.fade_duration,
            disposed: false,
        }
    }

    /// Current resolved references.
    #[must_use]
    pub const fn sources(&self) -> &ResolvedSources {
        &self.sources
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Prefetch progress of the current descriptor.
    #[must_use]
    pub const fn prefetch_status(&self) -> PrefetchStatus {
        self.prefetch.status()
    }

    /// Current reveal cycle.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.prefetch.generation()
    }

    /// Whether [`Event::Teardown`] has been processed.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The `{ is_loaded, is_prefetched }` flags.
    #[must_use]
    pub const fn reveal_state(&self) -> RevealState {
        RevealState {
            is_loaded: matches!(self.phase, Phase::Revealed),
            is_prefetched: self.prefetch.status().is_prefetched(),
        }
    }

    /// Whether the final image layer may be mounted right now.
    #[must_use]
    pub const fn final_mount_eligible(&self) -> bool {
        self.sources.full.is_some() && self.prefetch.status().is_prefetched()
    }

    /// The layer set to render for this state.
    #[must_use]
    pub fn layers(&self) -> Layers {
        compose(&self.sources, self.reveal_state(), self.generation())
    }

    /// Apply `event`.
    pub fn transition(self, event: Event) -> Transition {
        if self.disposed {
            log::debug!("ignoring {} after teardown", event_name(&event));
            return self.unchanged();
        }

        match event {
            Event::SourceChanged(sources) => self.on_source_changed(sources),
            Event::PrefetchSettled { ticket, outcome } => self.on_prefetch_settled(&ticket, &outcome),
            Event::FinalImageLoaded { generation } => self.on_final_image_loaded(generation),
            Event::Teardown => self.on_teardown(),
        }
    }

    fn unchanged(self) -> Transition {
        Transition {
            state: self,
            commands: Vec::new(),
        }
    }

    fn on_source_changed(mut self, sources: ResolvedSources) -> Transition {
        if sources.full == self.sources.full && self.generation() != Generation::default() {
            // Same full descriptor: the reveal cycle continues, only the
            // thumbnail and optimizer outcome can differ.
            self.sources = sources;
            return self.unchanged();
        }

        let mut commands = Vec::with_capacity(4);
        if let Some(stale) = self.prefetch.defuse() {
            commands.push(Command::DefusePrefetch { generation: stale });
        }
        commands.push(Command::ResetFade);
        commands.push(Command::StartPulse);

        self.phase = Phase::Pending;
        let ticket = self.prefetch.begin(sources.full.as_ref());
        self.sources = sources;
        if let Some(ticket) = ticket {
            commands.push(Command::IssuePrefetch(ticket));
        }

        log::debug!(
            "reveal cycle {} started for {:?}",
            self.generation(),
            self.sources.full.as_ref().map(crate::ImageDescriptor::href),
        );
        Transition {
            state: self,
            commands,
        }
    }

    fn on_prefetch_settled(mut self, ticket: &PrefetchTicket, outcome: &PrefetchOutcome) -> Transition {
        self.prefetch.settle(ticket, outcome);
        self.unchanged()
    }

    fn on_final_image_loaded(mut self, generation: Generation) -> Transition {
        if generation != self.generation() {
            log::debug!(
                "ignoring load from {generation} (current {})",
                self.generation()
            );
            return self.unchanged();
        }
        if !self.final_mount_eligible() || self.phase == Phase::Revealed {
            return self.unchanged();
        }

        self.phase = Phase::Revealed;
        log::debug!("reveal cycle {} revealed", self.generation());
        let commands = vec![
            Command::StopPulse,
            Command::StartFade {
                target: 1.0,
                duration: self.fade_duration,
            },
        ];
        Transition {
            state: self,
            commands,
        }
    }

    fn on_teardown(mut self) -> Transition {
        self.disposed = true;
        let mut commands = vec![Command::StopPulse];
        if let Some(stale) = self.prefetch.defuse() {
            commands.push(Command::DefusePrefetch { generation: stale });
        }
        Transition {
            state: self,
            commands,
        }
    }
}

const fn event_name(event: &Event) -> &'static str {
    match event {
        Event::SourceChanged(_) => "source change",
        Event::PrefetchSettled { .. } => "prefetch settlement",
        Event::FinalImageLoaded { .. } => "final image load",
        Event::Teardown => "teardown",
    }
}

/// Owning wrapper around [`MachineState`] for hosts that keep the
/// machine in a mutable slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealMachine {
    state: MachineState,
}

impl RevealMachine {
    /// Create a machine with no source.
    #[must_use]
    pub fn new(config: &RevealConfig) -> Self {
        Self {
            state: MachineState::new(config),
        }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &MachineState {
        &self.state
    }

    /// Apply `event` in place and return the commands to execute.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let state = std::mem::take(&mut self.state);
        let Transition { state, commands } = state.transition(event);
        self.state = state;
        commands
    }

    /// The layer set to render.
    #[must_use]
    pub fn layers(&self) -> Layers {
        self.state.layers()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::optimize::Optimization;
    use crate::types::{ImageDescriptor, ImageSource, LocalResource};

    fn network(url: &str) -> ResolvedSources {
        ResolvedSources {
            full: Some(ImageDescriptor::Uri(url.into())),
            thumbnail: None,
            optimized: Some(Optimization::Unchanged(ImageSource::Descriptor(
                ImageDescriptor::Uri(url.into()),
            ))),
        }
    }

    fn local(path: &str) -> ResolvedSources {
        let resource = LocalResource::new(path, format!("/{path}"));
        ResolvedSources {
            full: Some(ImageDescriptor::Local(resource.clone())),
            thumbnail: None,
            optimized: Some(Optimization::Unchanged(resource.into())),
        }
    }

    fn issued(commands: &[Command]) -> Option<PrefetchTicket> {
        commands.iter().find_map(|c| match c {
            Command::IssuePrefetch(ticket) => Some(ticket.clone()),
            _ => None,
        })
    }

    fn machine() -> RevealMachine {
        RevealMachine::new(&RevealConfig::default())
    }

    #[test]
    fn initial_state_is_pending_without_source() {
        let m = machine();
        assert_eq!(m.state().phase(), Phase::Pending);
        assert!(!m.state().final_mount_eligible());
        assert!(m.layers().skeleton);
    }

    #[test]
    fn network_source_issues_prefetch_and_starts_pulse() {
        let mut m = machine();
        let commands = m.handle(Event::SourceChanged(network("https://a/1.jpg")));
        assert_eq!(commands[0], Command::ResetFade);
        assert_eq!(commands[1], Command::StartPulse);
        let ticket = issued(&commands).unwrap();
        assert_eq!(ticket.locator, "https://a/1.jpg");
        assert_eq!(m.state().prefetch_status(), PrefetchStatus::InFlight);
        assert!(!m.state().final_mount_eligible());
    }

    #[test]
    fn local_source_is_immediately_eligible() {
        let mut m = machine();
        let commands = m.handle(Event::SourceChanged(local("assets/images/a.png")));
        assert!(issued(&commands).is_none());
        assert!(m.state().final_mount_eligible());
        assert!(m.state().reveal_state().is_prefetched);
    }

    #[test]
    fn load_before_prefetch_is_ignored() {
        let mut m = machine();
        m.handle(Event::SourceChanged(network("https://a/1.jpg")));
        let generation = m.state().generation();
        let commands = m.handle(Event::FinalImageLoaded { generation });
        assert!(commands.is_empty());
        assert_eq!(m.state().phase(), Phase::Pending);
    }

    #[test]
    fn prefetch_then_load_reveals() {
        let mut m = machine();
        let ticket = issued(&m.handle(Event::SourceChanged(network("https://a/1.jpg")))).unwrap();
        let commands = m.handle(Event::PrefetchSettled {
            ticket,
            outcome: PrefetchOutcome::Succeeded,
        });
        assert!(commands.is_empty());
        assert!(m.state().final_mount_eligible());

        let generation = m.state().generation();
        let commands = m.handle(Event::FinalImageLoaded { generation });
        assert_eq!(
            commands,
            vec![
                Command::StopPulse,
                Command::StartFade {
                    target: 1.0,
                    duration: Duration::from_millis(260),
                },
            ]
        );
        assert_eq!(m.state().phase(), Phase::Revealed);
    }

    #[test]
    fn repeated_load_is_idempotent() {
        let mut m = machine();
        m.handle(Event::SourceChanged(local("a.png")));
        let generation = m.state().generation();
        assert!(!m.handle(Event::FinalImageLoaded { generation }).is_empty());
        assert!(m.handle(Event::FinalImageLoaded { generation }).is_empty());
        assert!(m.state().reveal_state().is_loaded);
    }

    #[test]
    fn load_from_previous_generation_is_ignored() {
        let mut m = machine();
        m.handle(Event::SourceChanged(local("a.png")));
        let old = m.state().generation();
        m.handle(Event::SourceChanged(local("b.png")));
        assert!(m.handle(Event::FinalImageLoaded { generation: old }).is_empty());
        assert_eq!(m.state().phase(), Phase::Pending);
    }

    #[test]
    fn source_change_resets_revealed_state() {
        let mut m = machine();
        m.handle(Event::SourceChanged(local("a.png")));
        let generation = m.state().generation();
        m.handle(Event::FinalImageLoaded { generation });
        assert!(m.state().reveal_state().is_loaded);

        let commands = m.handle(Event::SourceChanged(network("https://a/2.jpg")));
        assert!(commands.contains(&Command::StartPulse));
        assert!(commands.contains(&Command::ResetFade));
        assert_eq!(m.state().reveal_state(), RevealState::default());
    }

    #[test]
    fn superseding_source_defuses_pending_prefetch() {
        let mut m = machine();
        let first = issued(&m.handle(Event::SourceChanged(network("https://a/1.jpg")))).unwrap();
        let commands = m.handle(Event::SourceChanged(network("https://a/2.jpg")));
        assert_eq!(
            commands[0],
            Command::DefusePrefetch {
                generation: first.generation
            }
        );
        let second = issued(&commands).unwrap();
        assert_ne!(first.generation, second.generation);

        m.handle(Event::PrefetchSettled {
            ticket: first,
            outcome: PrefetchOutcome::Succeeded,
        });
        assert_eq!(m.state().prefetch_status(), PrefetchStatus::InFlight);
        assert!(!m.state().final_mount_eligible());
    }

    #[test]
    fn same_full_descriptor_keeps_cycle() {
        let mut m = machine();
        m.handle(Event::SourceChanged(network("https://a/1.jpg")));
        let generation = m.state().generation();

        let mut with_thumb = network("https://a/1.jpg");
        with_thumb.thumbnail = Some(ImageDescriptor::Uri("https://a/1-thumb.jpg".into()));
        let commands = m.handle(Event::SourceChanged(with_thumb));

        assert!(commands.is_empty());
        assert_eq!(m.state().generation(), generation);
        assert!(m.state().sources().thumbnail.is_some());
    }

    #[test]
    fn first_source_change_without_full_still_starts_pulse() {
        let mut m = machine();
        let commands = m.handle(Event::SourceChanged(ResolvedSources::default()));
        assert!(commands.contains(&Command::StartPulse));
    }

    #[test]
    fn failed_prefetch_never_mounts() {
        let mut m = machine();
        let ticket = issued(&m.handle(Event::SourceChanged(network("https://a/1.jpg")))).unwrap();
        m.handle(Event::PrefetchSettled {
            ticket,
            outcome: PrefetchOutcome::Failed {
                reason: "404".into(),
            },
        });
        assert_eq!(m.state().prefetch_status(), PrefetchStatus::Failed);
        let layers = m.layers();
        assert!(layers.spinner);
        assert!(layers.final_image.is_none());
    }

    #[test]
    fn teardown_stops_pulse_and_defuses() {
        let mut m = machine();
        let ticket = issued(&m.handle(Event::SourceChanged(network("https://a/1.jpg")))).unwrap();
        let commands = m.handle(Event::Teardown);
        assert_eq!(
            commands,
            vec![
                Command::StopPulse,
                Command::DefusePrefetch {
                    generation: ticket.generation
                }
            ]
        );
        assert!(m.state().is_disposed());

        // Nothing mutates a disposed machine.
        let before = m.state().clone();
        assert!(
            m.handle(Event::PrefetchSettled {
                ticket,
                outcome: PrefetchOutcome::Succeeded,
            })
            .is_empty()
        );
        assert!(m.handle(Event::SourceChanged(local("b.png"))).is_empty());
        assert!(m.handle(Event::Teardown).is_empty());
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn transition_is_pure() {
        let state = MachineState::default();
        let a = state.clone().transition(Event::SourceChanged(local("a.png")));
        let b = state.transition(Event::SourceChanged(local("a.png")));
        assert_eq!(a, b);
    }

    #[test]
    fn command_json_shape() {
        let json = serde_json::to_value(Command::StartFade {
            target: 1.0,
            duration: Duration::from_millis(260),
        })
        .unwrap();
        assert_eq!(json["command"], "start_fade");
        assert_eq!(json["duration"], 260);
    }
}
