use std::time::{Duration, Instant};

/// Snapshot of the time state for one frame. Every consumer of time in
/// a frame (the animation driver, the shader uniforms) reads the same
/// sample, so a frame can never observe two different clocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// The instant this sample represents, for duration arithmetic.
    pub instant: Instant,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, instant: Instant, frame_index: u64) -> Self {
        Self {
            seconds,
            instant,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let now = Instant::now();
        let sample = TimeSample::new((now - self.origin).as_secs_f32(), now, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that advances by a fixed step per sample. Used by tests
/// and headless runs where wall-clock drift would make assertions
/// flaky.
#[derive(Debug, Clone, Copy)]
pub struct SteppedTimeSource {
    origin: Instant,
    step: Duration,
    frame: u64,
}

impl SteppedTimeSource {
    pub fn new(step: Duration) -> Self {
        Self {
            origin: Instant::now(),
            step,
            frame: 0,
        }
    }
}

impl TimeSource for SteppedTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let elapsed = self.step * self.frame as u32;
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.origin + elapsed, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_source_is_deterministic() {
        let mut source = SteppedTimeSource::new(Duration::from_millis(100));
        let first = source.sample();
        let second = source.sample();
        assert_eq!(first.seconds, 0.0);
        assert_eq!(first.frame_index, 0);
        assert!((second.seconds - 0.1).abs() < 1e-6);
        assert_eq!(second.instant - first.instant, Duration::from_millis(100));

        source.reset();
        assert_eq!(source.sample().frame_index, 0);
    }

    #[test]
    fn system_source_counts_frames() {
        let mut source = SystemTimeSource::new();
        assert_eq!(source.sample().frame_index, 0);
        assert_eq!(source.sample().frame_index, 1);
        source.reset();
        assert_eq!(source.sample().frame_index, 0);
    }
}
