//! Opacity tracks driven by the reveal machine's commands.
//!
//! Hosts with a native animation system (CSS transitions in the browser)
//! only need the parameters carried by the commands. [`FadeTrack`] and
//! [`PulseTrack`] exist for hosts that step time themselves, such as the
//! trace tool, and implement the [`Animator`] contract with linear
//! interpolation.

use std::time::Duration;

use crate::types::PulseConfig;

/// An opacity animator.
pub trait Animator {
    /// Animate towards `target` over `duration`, starting from the
    /// current value.
    fn start(&mut self, target: f32, duration: Duration);

    /// Freeze at the current value. Safe to call when already stopped or
    /// never started.
    fn stop(&mut self);

    /// Advance the animation clock by `dt`.
    fn advance(&mut self, dt: Duration);

    /// Current opacity.
    fn value(&self) -> f32;

    /// Whether the animator is still moving.
    fn is_running(&self) -> bool;
}

/// Progress through a leg in `[0, 1]`.
#[allow(clippy::cast_possible_truncation)]
fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0) as f32
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (to - from).mul_add(t, from)
}

/// A single monotonic ramp, used for the final image fade.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeTrack {
    from: f32,
    to: f32,
    elapsed: Duration,
    duration: Duration,
    running: bool,
}

impl FadeTrack {
    /// A stopped track resting at `value`.
    #[must_use]
    pub const fn at(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            elapsed: Duration::ZERO,
            duration: Duration::ZERO,
            running: false,
        }
    }

    /// Jump to `value` and stop.
    pub fn reset(&mut self, value: f32) {
        *self = Self::at(value);
    }
}

impl Default for FadeTrack {
    fn default() -> Self {
        Self::at(0.0)
    }
}

impl Animator for FadeTrack {
    fn start(&mut self, target: f32, duration: Duration) {
        self.from = self.value();
        self.to = target;
        self.elapsed = Duration::ZERO;
        self.duration = duration;
        self.running = true;
    }

    fn stop(&mut self) {
        let value = self.value();
        self.reset(value);
    }

    fn advance(&mut self, dt: Duration) {
        if !self.running {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed >= self.duration {
            let to = self.to;
            self.reset(to);
        }
    }

    fn value(&self) -> f32 {
        if self.running {
            lerp(self.from, self.to, progress(self.elapsed, self.duration))
        } else {
            self.to
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// A looping oscillation between two bounds, used for the skeleton.
///
/// [`start`](Animator::start) heads towards `target` first, then bounces
/// between [`PulseConfig::low`] and [`PulseConfig::high`] forever.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseTrack {
    low: f32,
    high: f32,
    leg: FadeTrack,
    leg_duration: Duration,
}

impl PulseTrack {
    /// A stopped pulse resting at `config.rest`.
    #[must_use]
    pub const fn new(config: &PulseConfig) -> Self {
        Self {
            low: config.low,
            high: config.high,
            leg: FadeTrack::at(config.rest),
            leg_duration: config.leg_duration,
        }
    }

    /// The bound opposite to the one the current leg is heading to.
    fn turnaround(&self, reached: f32) -> f32 {
        if (reached - self.low).abs() <= (reached - self.high).abs() {
            self.high
        } else {
            self.low
        }
    }

    /// Finish the current leg and head back the other way.
    fn turn(&mut self) {
        let reached = self.leg.to;
        self.leg.reset(reached);
        let next = self.turnaround(reached);
        self.leg.start(next, self.leg_duration);
    }
}

/// `dt` modulo `period`; `dt` itself when `period` is zero.
#[allow(clippy::cast_possible_truncation)]
fn wrap(dt: Duration, period: Duration) -> Duration {
    if period.is_zero() {
        return dt;
    }
    let nanos = dt.as_nanos() % period.as_nanos();
    u64::try_from(nanos / 1_000_000_000).map_or(dt, |secs| {
        Duration::new(secs, (nanos % 1_000_000_000) as u32)
    })
}

impl Animator for PulseTrack {
    fn start(&mut self, target: f32, duration: Duration) {
        self.leg_duration = duration;
        self.leg.start(target, duration);
    }

    fn stop(&mut self) {
        self.leg.stop();
    }

    fn advance(&mut self, dt: Duration) {
        if !self.leg.is_running() {
            return;
        }
        let left_in_leg = self.leg.duration.saturating_sub(self.leg.elapsed);
        if dt < left_in_leg || self.leg_duration.is_zero() {
            self.leg.advance(dt);
            return;
        }
        self.turn();
        // Every leg from here is a full one, so whole periods change nothing.
        let period = self.leg_duration.saturating_mul(2);
        let mut remaining = wrap(dt.saturating_sub(left_in_leg), period);
        while remaining >= self.leg_duration {
            remaining = remaining.saturating_sub(self.leg_duration);
            self.turn();
        }
        self.leg.advance(remaining);
    }

    fn value(&self) -> f32 {
        self.leg.value()
    }

    fn is_running(&self) -> bool {
        self.leg.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fade_ramps_monotonically_to_target() {
        let mut fade = FadeTrack::default();
        fade.start(1.0, ms(260));

        let mut last = fade.value();
        for _ in 0..30 {
            fade.advance(ms(10));
            let v = fade.value();
            assert!(v >= last, "fade went backwards: {last} -> {v}");
            last = v;
        }
        assert!((fade.value() - 1.0).abs() < EPS);
        assert!(!fade.is_running());
    }

    #[test]
    fn fade_midpoint() {
        let mut fade = FadeTrack::default();
        fade.start(1.0, ms(200));
        fade.advance(ms(100));
        assert!((fade.value() - 0.5).abs() < EPS);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut fade = FadeTrack::default();
        fade.stop();
        fade.stop();
        assert!(fade.value().abs() < EPS);

        fade.start(1.0, ms(100));
        fade.advance(ms(50));
        fade.stop();
        let frozen = fade.value();
        fade.advance(ms(100));
        fade.stop();
        assert!((fade.value() - frozen).abs() < EPS);
    }

    #[test]
    fn zero_duration_fade_jumps() {
        let mut fade = FadeTrack::default();
        fade.start(1.0, Duration::ZERO);
        assert!((fade.value() - 1.0).abs() < EPS);
        fade.advance(Duration::ZERO);
        assert!(!fade.is_running());
    }

    #[test]
    fn pulse_rests_until_started() {
        let mut pulse = PulseTrack::new(&PulseConfig::default());
        pulse.advance(ms(1000));
        assert!((pulse.value() - 0.6).abs() < EPS);
        assert!(!pulse.is_running());
    }

    #[test]
    fn pulse_oscillates_between_bounds() {
        let config = PulseConfig::default();
        let mut pulse = PulseTrack::new(&config);
        pulse.start(config.low, config.leg_duration);

        pulse.advance(ms(500));
        assert!((pulse.value() - 0.4).abs() < EPS, "{}", pulse.value());

        pulse.advance(ms(500));
        assert!((pulse.value() - 0.7).abs() < EPS, "{}", pulse.value());

        pulse.advance(ms(250));
        assert!((pulse.value() - 0.55).abs() < EPS, "{}", pulse.value());

        for _ in 0..100 {
            pulse.advance(ms(37));
            let v = pulse.value();
            assert!((0.4 - EPS..=0.7 + EPS).contains(&v), "out of bounds: {v}");
        }
        assert!(pulse.is_running());
    }

    #[test]
    fn pulse_advance_spanning_several_legs() {
        let config = PulseConfig::default();
        let mut pulse = PulseTrack::new(&config);
        pulse.start(config.low, config.leg_duration);
        // 0.6 -> 0.4 (500) -> 0.7 (500) -> 0.4 (500), then 100 ms more.
        pulse.advance(ms(1600));
        assert!((pulse.value() - 0.46).abs() < EPS, "{}", pulse.value());
    }

    #[test]
    fn pulse_survives_huge_advance() {
        let config = PulseConfig {
            leg_duration: ms(1),
            ..PulseConfig::default()
        };
        let mut pulse = PulseTrack::new(&config);
        pulse.start(config.low, config.leg_duration);

        for dt in [
            Duration::from_secs(86_400),
            Duration::from_secs(100 * 365 * 86_400),
            Duration::MAX,
        ] {
            pulse.advance(dt);
            let v = pulse.value();
            assert!((0.4 - EPS..=0.7 + EPS).contains(&v), "out of bounds: {v}");
            assert!(pulse.is_running());
        }
    }

    #[test]
    fn whole_periods_keep_the_phase() {
        let config = PulseConfig::default();
        let mut short = PulseTrack::new(&config);
        let mut long = PulseTrack::new(&config);
        short.start(config.low, config.leg_duration);
        long.start(config.low, config.leg_duration);

        // First leg, then 750 ms into the low/high ping-pong.
        short.advance(ms(500 + 750));
        long.advance(ms(500 + 1_000_000 * 1000 + 750));
        assert!((short.value() - 0.55).abs() < EPS, "{}", short.value());
        assert!((long.value() - short.value()).abs() < EPS, "{}", long.value());
    }

    #[test]
    fn stopped_pulse_freezes() {
        let config = PulseConfig::default();
        let mut pulse = PulseTrack::new(&config);
        pulse.start(config.low, config.leg_duration);
        pulse.advance(ms(250));
        pulse.stop();
        let frozen = pulse.value();
        pulse.advance(ms(1000));
        assert!((pulse.value() - frozen).abs() < EPS);
        pulse.stop();
    }
}
