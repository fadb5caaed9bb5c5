//! Prefetch bookkeeping with generation-based supersession.
//!
//! The controller never performs I/O. It decides whether a descriptor
//! needs a prefetch, hands out a [`PrefetchTicket`] for the host to act
//! on, and later accepts the outcome only if the ticket still belongs to
//! the current reveal cycle.
//!
//! Every call to [`PrefetchController::begin`] or
//! [`PrefetchController::defuse`] advances the [`Generation`], so any
//! settlement carrying an older generation is discarded. This is
//! cooperative: the network request itself is not aborted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ImageDescriptor;

/// Identifier of one reveal cycle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Wrap a raw generation number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw generation number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The generation after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A prefetch the host must perform, tagged with its reveal cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefetchTicket {
    /// Reveal cycle that issued the request.
    pub generation: Generation,
    /// Locator to prefetch.
    pub locator: String,
}

/// How a prefetch settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum PrefetchOutcome {
    /// The image bytes are cached and safe to display.
    Succeeded,
    /// The prefetch failed. Final for this descriptor: there is no retry.
    Failed {
        /// Human-readable cause, for logs.
        reason: String,
    },
}

/// Prefetch progress for the current descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefetchStatus {
    /// The descriptor has no locator (or there is no descriptor).
    #[default]
    NotRequired,
    /// A request was issued and has not settled yet.
    InFlight,
    /// The prefetch succeeded.
    Succeeded,
    /// The prefetch failed.
    Failed,
    /// The request was defused before it settled.
    Abandoned,
}

impl PrefetchStatus {
    /// Whether the final image may be mounted.
    ///
    /// Descriptors without a locator count as prefetched.
    #[must_use]
    pub const fn is_prefetched(self) -> bool {
        matches!(self, Self::NotRequired | Self::Succeeded)
    }
}

/// Tracks the single outstanding prefetch of one image instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchController {
    generation: Generation,
    status: PrefetchStatus,
    locator: Option<String>,
}

impl PrefetchController {
    /// Create a controller at generation zero with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current reveal cycle.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Progress of the current descriptor's prefetch.
    #[must_use]
    pub const fn status(&self) -> PrefetchStatus {
        self.status
    }

    /// The locator currently being (or last) prefetched.
    #[must_use]
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// Start a new reveal cycle for `descriptor`.
    ///
    /// Returns the ticket the host must execute, or `None` when the
    /// descriptor has no locator and may be displayed immediately.
    pub fn begin(&mut self, descriptor: Option<&ImageDescriptor>) -> Option<PrefetchTicket> {
        self.generation = self.generation.next();
        self.locator = descriptor.and_then(ImageDescriptor::uri).map(str::to_owned);

        match &self.locator {
            Some(locator) => {
                self.status = PrefetchStatus::InFlight;
                Some(PrefetchTicket {
                    generation: self.generation,
                    locator: locator.clone(),
                })
            }
            None => {
                self.status = PrefetchStatus::NotRequired;
                None
            }
        }
    }

    /// Record the outcome of `ticket`.
    ///
    /// Returns `false` (and changes nothing) when the ticket belongs to a
    /// superseded cycle or the current cycle has already settled.
    pub fn settle(&mut self, ticket: &PrefetchTicket, outcome: &PrefetchOutcome) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "discarding stale prefetch of {} from {} (current {})",
                ticket.locator,
                ticket.generation,
                self.generation,
            );
            return false;
        }
        if self.status != PrefetchStatus::InFlight {
            return false;
        }

        self.status = match outcome {
            PrefetchOutcome::Succeeded => PrefetchStatus::Succeeded,
            PrefetchOutcome::Failed { reason } => {
                log::debug!("prefetch of {} failed: {reason}", ticket.locator);
                PrefetchStatus::Failed
            }
        };
        true
    }

    /// Invalidate any outstanding ticket without starting a new cycle.
    ///
    /// Returns the generation that was in flight, if any.
    pub fn defuse(&mut self) -> Option<Generation> {
        let in_flight = (self.status == PrefetchStatus::InFlight).then_some(self.generation);
        if in_flight.is_some() {
            self.status = PrefetchStatus::Abandoned;
        }
        self.generation = self.generation.next();
        in_flight
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::LocalResource;

    fn uri(s: &str) -> ImageDescriptor {
        ImageDescriptor::Uri(s.into())
    }

    #[test]
    fn no_locator_needs_no_prefetch() {
        let mut c = PrefetchController::new();
        let local = ImageDescriptor::Local(LocalResource::new("a", "/a"));
        assert!(c.begin(Some(&local)).is_none());
        assert_eq!(c.status(), PrefetchStatus::NotRequired);
        assert!(c.status().is_prefetched());

        assert!(c.begin(None).is_none());
        assert!(c.status().is_prefetched());
    }

    #[test]
    fn locator_issues_ticket() {
        let mut c = PrefetchController::new();
        let ticket = c.begin(Some(&uri("https://a/1.jpg"))).unwrap();
        assert_eq!(ticket.locator, "https://a/1.jpg");
        assert_eq!(ticket.generation, c.generation());
        assert_eq!(c.status(), PrefetchStatus::InFlight);
        assert!(!c.status().is_prefetched());
    }

    #[test]
    fn success_marks_prefetched() {
        let mut c = PrefetchController::new();
        let ticket = c.begin(Some(&uri("https://a/1.jpg"))).unwrap();
        assert!(c.settle(&ticket, &PrefetchOutcome::Succeeded));
        assert_eq!(c.status(), PrefetchStatus::Succeeded);
        assert!(c.status().is_prefetched());
    }

    #[test]
    fn failure_is_permanent() {
        let mut c = PrefetchController::new();
        let ticket = c.begin(Some(&uri("https://a/1.jpg"))).unwrap();
        let failed = PrefetchOutcome::Failed {
            reason: "404".into(),
        };
        assert!(c.settle(&ticket, &failed));
        // A duplicate settlement for the same cycle cannot flip it.
        assert!(!c.settle(&ticket, &PrefetchOutcome::Succeeded));
        assert_eq!(c.status(), PrefetchStatus::Failed);
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let mut c = PrefetchController::new();
        let first = c.begin(Some(&uri("https://a/1.jpg"))).unwrap();
        let second = c.begin(Some(&uri("https://a/2.jpg"))).unwrap();

        assert!(!c.settle(&first, &PrefetchOutcome::Succeeded));
        assert_eq!(c.status(), PrefetchStatus::InFlight);

        assert!(c.settle(&second, &PrefetchOutcome::Succeeded));
        assert_eq!(c.locator(), Some("https://a/2.jpg"));
    }

    #[test]
    fn defuse_invalidates_in_flight_ticket() {
        let mut c = PrefetchController::new();
        let ticket = c.begin(Some(&uri("https://a/1.jpg"))).unwrap();
        assert_eq!(c.defuse(), Some(ticket.generation));
        assert!(!c.settle(&ticket, &PrefetchOutcome::Succeeded));
        assert_eq!(c.status(), PrefetchStatus::Abandoned);
        assert!(!c.status().is_prefetched());
        assert_eq!(c.defuse(), None);
    }

    #[test]
    fn generations_increase() {
        let g = Generation::default();
        assert!(g.next() > g);
        assert_eq!(g.next().get(), 1);
        assert_eq!(Generation::new(7).to_string(), "#7");
    }

    #[test]
    fn outcome_json_shape() {
        let json = serde_json::to_string(&PrefetchOutcome::Failed {
            reason: "timeout".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"result":"failed","reason":"timeout"}"#);
        let ok: PrefetchOutcome = serde_json::from_str(r#"{"result":"succeeded"}"#).unwrap();
        assert_eq!(ok, PrefetchOutcome::Succeeded);
    }
}
