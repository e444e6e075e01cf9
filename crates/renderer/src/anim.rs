//! Host-side animation driver: the intro/outro state machine that
//! feeds the `intro` shader parameter, plus the always-on pointer
//! low-pass. Progress is a pure function of `(phase, elapsed)`, so the
//! whole machine is driven by `Instant` values passed in and never
//! consults a clock of its own.

use std::time::{Duration, Instant};

/// Total reveal duration once a pair's textures are ready.
pub const INTRO_DURATION: Duration = Duration::from_millis(3500);
/// Total dismissal duration once navigation is requested.
pub const OUTRO_DURATION: Duration = Duration::from_millis(1200);
/// Per-tick pointer low-pass coefficient.
pub const POINTER_SMOOTHING: f32 = 0.06;

/// Cubic ease-out: fast start, settling end. Drives the intro.
pub fn ease_out_cubic(raw: f32) -> f32 {
    let raw = raw.clamp(0.0, 1.0);
    1.0 - (1.0 - raw).powi(3)
}

/// Quadratic ease-in: slow start, accelerating end. Drives the outro.
pub fn ease_in_quad(raw: f32) -> f32 {
    let raw = raw.clamp(0.0, 1.0);
    raw * raw
}

/// Intro parameter value after `elapsed` time in the Introing phase.
pub fn intro_value(elapsed: Duration) -> f32 {
    let raw = (elapsed.as_secs_f32() / INTRO_DURATION.as_secs_f32()).clamp(0.0, 1.0);
    ease_out_cubic(raw)
}

/// Intro parameter value after `elapsed` time in the Leaving phase,
/// decaying from `from` down to zero.
pub fn outro_value(from: f32, elapsed: Duration) -> f32 {
    let raw = (elapsed.as_secs_f32() / OUTRO_DURATION.as_secs_f32()).clamp(0.0, 1.0);
    from * (1.0 - ease_in_quad(raw))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// Resting: either nothing loaded yet (intro holds 0) or the intro
    /// has settled (intro holds 1).
    Idle,
    Introing {
        started: Instant,
    },
    Leaving {
        started: Instant,
        from: f32,
        target: usize,
    },
}

/// Drives the `intro` parameter through the reveal/dismiss lifecycle.
///
/// One driver is active per displayed pair. Entering Leaving cancels an
/// in-flight intro; the outro then decays from the last published value
/// so there is never a discontinuity.
#[derive(Debug)]
pub struct AnimationDriver {
    phase: Phase,
    published: f32,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            published: 0.0,
        }
    }

    /// Current `intro` parameter value, as of the last tick.
    pub fn intro(&self) -> f32 {
        self.published
    }

    pub fn is_leaving(&self) -> bool {
        matches!(self.phase, Phase::Leaving { .. })
    }

    pub fn is_introing(&self) -> bool {
        matches!(self.phase, Phase::Introing { .. })
    }

    /// Starts the reveal. Called when a pair's textures finish loading
    /// (including the degraded fallback path — a failed load still
    /// animates in).
    pub fn begin_intro(&mut self, now: Instant) {
        self.phase = Phase::Introing { started: now };
        self.published = 0.0;
    }

    /// Requests navigation to `target`. No-op while already Leaving and
    /// when the target is the slide currently displayed; otherwise any
    /// in-flight intro is cancelled and the outro starts from the
    /// current published value. Returns whether the request was
    /// accepted.
    pub fn request_leave(&mut self, target: usize, current: usize, now: Instant) -> bool {
        if self.is_leaving() || target == current {
            return false;
        }
        self.phase = Phase::Leaving {
            started: now,
            from: self.published,
            target,
        };
        true
    }

    /// Stops ticking and invalidates the current phase without firing
    /// any event. Safe to call at any time, including when already at
    /// rest.
    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Advances the machine to `now` and republishes the intro value.
    /// Returns the navigation target exactly once, on the tick where
    /// the outro completes.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        match self.phase {
            Phase::Idle => None,
            Phase::Introing { started } => {
                let elapsed = now.saturating_duration_since(started);
                self.published = intro_value(elapsed);
                if elapsed >= INTRO_DURATION {
                    self.published = 1.0;
                    self.phase = Phase::Idle;
                }
                None
            }
            Phase::Leaving {
                started,
                from,
                target,
            } => {
                let elapsed = now.saturating_duration_since(started);
                self.published = outro_value(from, elapsed);
                if elapsed >= OUTRO_DURATION {
                    self.published = 0.0;
                    self.phase = Phase::Idle;
                    Some(target)
                } else {
                    None
                }
            }
        }
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential low-pass over the raw pointer position. Runs every tick
/// regardless of the intro/outro phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerFilter {
    smoothed: [f32; 2],
}

impl PointerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, raw: [f32; 2]) {
        self.smoothed[0] += (raw[0] - self.smoothed[0]) * POINTER_SMOOTHING;
        self.smoothed[1] += (raw[1] - self.smoothed[1]) * POINTER_SMOOTHING;
    }

    pub fn get(&self) -> [f32; 2] {
        self.smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn intro_is_monotone_and_caps_at_one() {
        let mut last = -1.0f32;
        for step in 0..=80 {
            let value = intro_value(ms(step * 50));
            assert!(value >= last, "intro regressed at step {step}");
            assert!(value <= 1.0);
            last = value;
        }
        assert_eq!(intro_value(INTRO_DURATION), 1.0);
        assert_eq!(intro_value(ms(10_000)), 1.0);
    }

    #[test]
    fn intro_follows_cubic_ease_out() {
        // Halfway through the eased curve: 1-(1-r)^3 = 0.5 at
        // r = 1 - 0.5^(1/3).
        let half_raw = 1.0 - 0.5f32.powf(1.0 / 3.0);
        let t = Duration::from_secs_f32(INTRO_DURATION.as_secs_f32() * half_raw);
        assert!((intro_value(t) - 0.5).abs() < 1e-3);
        // Ease-out means the first half of wall time covers well over
        // half the eased progress.
        assert!(intro_value(ms(1750)) > 0.8);
    }

    #[test]
    fn outro_is_monotone_and_reaches_zero() {
        for from in [1.0f32, 0.62, 0.11] {
            let mut last = from + 1.0;
            for step in 0..=60 {
                let value = outro_value(from, ms(step * 20));
                assert!(value <= last, "outro increased at step {step}");
                last = value;
            }
            assert_eq!(outro_value(from, OUTRO_DURATION), 0.0);
            assert_eq!(outro_value(from, ms(5000)), 0.0);
            assert_eq!(outro_value(from, ms(0)), from);
        }
    }

    #[test]
    fn driver_runs_intro_to_completion() {
        let start = Instant::now();
        let mut driver = AnimationDriver::new();
        driver.begin_intro(start);
        assert!(driver.is_introing());

        assert_eq!(driver.tick(start), None);
        assert_eq!(driver.intro(), 0.0);

        driver.tick(start + ms(1000));
        let mid = driver.intro();
        assert!(mid > 0.0 && mid < 1.0);

        assert_eq!(driver.tick(start + INTRO_DURATION), None);
        assert_eq!(driver.intro(), 1.0);
        assert!(!driver.is_introing());

        // Settled: further ticks hold at 1.
        driver.tick(start + ms(9999));
        assert_eq!(driver.intro(), 1.0);
    }

    #[test]
    fn leave_during_intro_starts_from_last_published_value() {
        let start = Instant::now();
        let mut driver = AnimationDriver::new();
        driver.begin_intro(start);
        driver.tick(start + ms(800));
        let captured = driver.intro();
        assert!(captured > 0.0 && captured < 1.0);

        assert!(driver.request_leave(1, 0, start + ms(800)));
        assert!(driver.is_leaving());
        assert!(!driver.is_introing());

        // First outro tick republishes exactly the captured value — no
        // jump in either direction.
        driver.tick(start + ms(800));
        assert_eq!(driver.intro(), captured);

        // And it only decreases from there.
        driver.tick(start + ms(1300));
        assert!(driver.intro() < captured);
    }

    #[test]
    fn navigation_requests_are_idempotent() {
        let start = Instant::now();
        let mut driver = AnimationDriver::new();
        driver.begin_intro(start);
        driver.tick(start + INTRO_DURATION);

        // Target equals the displayed slide: nothing happens.
        assert!(!driver.request_leave(0, 0, start));
        assert!(!driver.is_leaving());

        assert!(driver.request_leave(2, 0, start + ms(4000)));
        // Re-requests while leaving are dropped, whatever the target.
        assert!(!driver.request_leave(1, 0, start + ms(4100)));
        assert!(!driver.request_leave(2, 0, start + ms(4200)));

        // The original target fires exactly once.
        assert_eq!(driver.tick(start + ms(4000) + OUTRO_DURATION), Some(2));
        assert_eq!(driver.tick(start + ms(9000)), None);
    }

    #[test]
    fn cancel_is_idempotent_and_suppresses_events() {
        let start = Instant::now();
        let mut driver = AnimationDriver::new();
        driver.cancel();
        driver.cancel();

        driver.begin_intro(start);
        driver.tick(start + ms(100));
        assert!(driver.request_leave(1, 0, start + ms(100)));
        driver.cancel();
        assert_eq!(driver.tick(start + ms(100) + OUTRO_DURATION), None);
    }

    #[test]
    fn pointer_filter_converges_geometrically() {
        let mut filter = PointerFilter::new();
        let target = [0.8f32, -0.4];
        let mut previous_error = 1.0f32;
        for tick in 0..200 {
            filter.tick(target);
            let error = (target[0] - filter.get()[0]).abs();
            let bound = previous_error * (1.0 - POINTER_SMOOTHING) + 1e-6;
            assert!(error <= bound, "tick {tick}: error {error} above bound {bound}");
            previous_error = error;
        }
        assert!((filter.get()[0] - target[0]).abs() < 1e-3);
        assert!((filter.get()[1] - target[1]).abs() < 1e-3);
    }
}
