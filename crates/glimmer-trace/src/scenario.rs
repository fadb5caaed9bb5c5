//! Scenario files and their replay through the reveal machine.

use std::fmt::Write;
use std::path::PathBuf;
use std::time::Duration;

use glimmer_reveal::{
    Animator, AssetManifest, Command, Event, FadeTrack, Generation, ImageSource, Layers, Phase,
    PrefetchOutcome, PrefetchTicket, PulseTrack, ResolvedSources, RevealConfig, RevealMachine,
    StaticAssets,
};
use serde::{Deserialize, Serialize};

/// Errors reading or replaying a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The scenario (including its asset manifest) is not valid JSON for
    /// the expected shape.
    #[error("invalid scenario: {0}")]
    Parse(#[source] serde_json::Error),

    /// `--config-json` did not parse.
    #[error("invalid --config-json: {0}")]
    Config(#[source] serde_json::Error),

    /// A `settle` step named a locator with no outstanding prefetch.
    #[error("step {step}: no pending prefetch for {locator}")]
    NoPendingPrefetch {
        /// Zero-based step index.
        step: usize,
        /// The locator the step tried to settle.
        locator: String,
    },
}

/// One input to the replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// New props.
    Source {
        /// Full-resolution reference.
        #[serde(default)]
        full: Option<ImageSource>,
        /// Placeholder reference.
        #[serde(default)]
        thumbnail: Option<ImageSource>,
    },
    /// Settle the oldest outstanding prefetch of `locator`.
    Settle {
        /// Locator of the prefetch.
        locator: String,
        /// How it settles.
        outcome: PrefetchOutcome,
    },
    /// The final image reports a load. Without an explicit generation,
    /// the current one is used.
    Load {
        /// Generation to report, for replaying stale callbacks.
        #[serde(default)]
        generation: Option<Generation>,
    },
    /// Advance the animation clock.
    Tick {
        /// Milliseconds to advance.
        ms: u64,
    },
    /// Unmount.
    Teardown,
}

impl Step {
    fn describe(&self) -> String {
        match self {
            Self::Source { full, thumbnail } => format!(
                "source full={} thumbnail={}",
                describe_source(full.as_ref()),
                describe_source(thumbnail.as_ref()),
            ),
            Self::Settle { locator, outcome } => match outcome {
                PrefetchOutcome::Succeeded => format!("settle {locator} ok"),
                PrefetchOutcome::Failed { reason } => format!("settle {locator} failed ({reason})"),
            },
            Self::Load {
                generation: Some(generation),
            } => format!("load {generation}"),
            Self::Load { generation: None } => "load".to_owned(),
            Self::Tick { ms } => format!("tick {ms}ms"),
            Self::Teardown => "teardown".to_owned(),
        }
    }
}

fn describe_source(source: Option<&ImageSource>) -> String {
    match source {
        None => "-".to_owned(),
        Some(ImageSource::Locator(locator)) => locator.clone(),
        Some(ImageSource::Descriptor(descriptor)) => descriptor.href().to_owned(),
    }
}

/// A scenario file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Static assets available to the replay.
    #[serde(default)]
    pub assets: AssetManifest,
    /// Inputs, in order.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Parse`] if the JSON does not describe a
    /// scenario.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(json).map_err(ScenarioError::Parse)
    }
}

/// State after one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Zero-based step index.
    pub index: usize,
    /// Human-readable step summary.
    pub step: String,
    /// Commands the step produced.
    pub commands: Vec<Command>,
    /// Reveal phase.
    pub phase: Phase,
    /// Current reveal cycle.
    pub generation: Generation,
    /// Visible layers.
    pub layers: Layers,
    /// Animation clock.
    pub elapsed_ms: u128,
    /// Final image opacity.
    pub fade_opacity: f32,
    /// Skeleton opacity.
    pub skeleton_opacity: f32,
}

impl Snapshot {
    /// One-line text rendering plus an indented command list.
    #[must_use]
    pub fn report(&self) -> String {
        let layers = &self.layers;
        let mut visible = Vec::new();
        if layers.backdrop {
            visible.push("backdrop");
        }
        if layers.skeleton {
            visible.push("skeleton");
        }
        if layers.thumbnail.is_some() {
            visible.push("thumbnail");
        }
        if layers.spinner {
            visible.push("spinner");
        }
        if layers.final_image.is_some() {
            visible.push("final");
        }

        let mut out = format!(
            "[{:>3}] {:<48} {:?} {} t={}ms fade={:.2} skeleton={:.2} layers=[{}]",
            self.index,
            self.step,
            self.phase,
            self.generation,
            self.elapsed_ms,
            self.fade_opacity,
            self.skeleton_opacity,
            visible.join(", "),
        );
        for command in &self.commands {
            let _ = write!(out, "\n        -> {command:?}");
        }
        out
    }
}

/// Host simulation: executes commands the way a renderer would.
pub struct Replay {
    config: RevealConfig,
    assets: StaticAssets,
    machine: RevealMachine,
    pending: Vec<PrefetchTicket>,
    fade: FadeTrack,
    pulse: PulseTrack,
    elapsed: Duration,
}

impl Replay {
    /// A replay with no source yet.
    #[must_use]
    pub fn new(config: RevealConfig, assets: StaticAssets) -> Self {
        Self {
            machine: RevealMachine::new(&config),
            pulse: PulseTrack::new(&config.pulse),
            fade: FadeTrack::default(),
            pending: Vec::new(),
            elapsed: Duration::ZERO,
            assets,
            config,
        }
    }

    /// Apply one step and snapshot the result.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::NoPendingPrefetch`] if a `settle` step
    /// names a locator that was never issued or already settled.
    pub fn step(&mut self, index: usize, step: &Step) -> Result<Snapshot, ScenarioError> {
        let commands = match step {
            Step::Source { full, thumbnail } => {
                let sources = ResolvedSources::resolve(
                    full.as_ref(),
                    thumbnail.as_ref(),
                    &self.assets,
                    &self.config.optimizer,
                );
                self.dispatch(Event::SourceChanged(sources))
            }
            Step::Settle { locator, outcome } => {
                let position = self
                    .pending
                    .iter()
                    .position(|ticket| &ticket.locator == locator)
                    .ok_or_else(|| ScenarioError::NoPendingPrefetch {
                        step: index,
                        locator: locator.clone(),
                    })?;
                let ticket = self.pending.remove(position);
                self.dispatch(Event::PrefetchSettled {
                    ticket,
                    outcome: outcome.clone(),
                })
            }
            Step::Load { generation } => {
                let generation = generation.unwrap_or_else(|| self.machine.state().generation());
                self.dispatch(Event::FinalImageLoaded { generation })
            }
            Step::Tick { ms } => {
                let dt = Duration::from_millis(*ms);
                self.elapsed = self.elapsed.saturating_add(dt);
                self.fade.advance(dt);
                self.pulse.advance(dt);
                Vec::new()
            }
            Step::Teardown => self.dispatch(Event::Teardown),
        };

        let state = self.machine.state();
        Ok(Snapshot {
            index,
            step: step.describe(),
            commands,
            phase: state.phase(),
            generation: state.generation(),
            layers: state.layers(),
            elapsed_ms: self.elapsed.as_millis(),
            fade_opacity: self.fade.value(),
            skeleton_opacity: self.pulse.value(),
        })
    }

    fn dispatch(&mut self, event: Event) -> Vec<Command> {
        let commands = self.machine.handle(event);
        for command in &commands {
            match command {
                Command::ResetFade => self.fade.reset(0.0),
                Command::StartFade { target, duration } => self.fade.start(*target, *duration),
                Command::StartPulse => {
                    self.pulse = PulseTrack::new(&self.config.pulse);
                    self.pulse
                        .start(self.config.pulse.low, self.config.pulse.leg_duration);
                }
                Command::StopPulse => self.pulse.stop(),
                Command::IssuePrefetch(ticket) => self.pending.push(ticket.clone()),
                // Superseded tickets stay pending so late settlements can
                // still be replayed.
                Command::DefusePrefetch { .. } => {}
            }
        }
        commands
    }
}

/// Replay every step of `scenario`.
///
/// # Errors
///
/// Stops at the first step that cannot be applied.
pub fn run(scenario: Scenario, config: RevealConfig) -> Result<Vec<Snapshot>, ScenarioError> {
    let mut replay = Replay::new(config, scenario.assets.into());
    scenario
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| replay.step(index, step))
        .collect()
}
