//! End-to-end exercise of the reveal lifecycle against a deterministic
//! clock: idle at zero, intro sweep, navigation request, outro decay,
//! and the single completion event that hands over to the next pair.

use std::time::Duration;

use renderer::anim::{AnimationDriver, PointerFilter, INTRO_DURATION, OUTRO_DURATION};
use renderer::runtime::{SteppedTimeSource, TimeSource};

const STEP: Duration = Duration::from_millis(10);

#[test]
fn full_lifecycle_under_a_stepped_clock() {
    let mut clock = SteppedTimeSource::new(STEP);
    let mut driver = AnimationDriver::new();

    // Waiting for textures: the driver rests at zero.
    let start = clock.sample();
    assert_eq!(driver.tick(start.instant), None);
    assert_eq!(driver.intro(), 0.0);

    // Textures arrive, the intro begins.
    driver.begin_intro(start.instant);

    let mut nav_events = Vec::new();
    let mut last_intro = 0.0f32;
    let mut sample = start;
    let mut leave_issued = false;

    loop {
        sample = clock.sample();
        let elapsed = sample.instant - start.instant;

        if let Some(target) = driver.tick(sample.instant) {
            nav_events.push((target, elapsed));
        }

        if elapsed < INTRO_DURATION {
            assert!(
                driver.intro() >= last_intro,
                "intro regressed at {elapsed:?}"
            );
        }
        last_intro = driver.intro();

        // Once settled, request navigation exactly once.
        if !leave_issued && elapsed >= INTRO_DURATION {
            assert_eq!(driver.intro(), 1.0);
            assert!(driver.request_leave(1, 0, sample.instant));
            leave_issued = true;
            // Duplicate requests while leaving are dropped.
            assert!(!driver.request_leave(2, 0, sample.instant));
        }

        if elapsed >= INTRO_DURATION + OUTRO_DURATION + STEP {
            break;
        }
    }

    // Exactly one navigation event, for the requested target, fired
    // when the outro ran out.
    assert_eq!(nav_events.len(), 1);
    let (target, at) = nav_events[0];
    assert_eq!(target, 1);
    assert!(at >= INTRO_DURATION + OUTRO_DURATION);
    assert_eq!(driver.intro(), 0.0);

    // The machine is back at rest; further ticks are inert.
    assert_eq!(driver.tick(sample.instant + Duration::from_secs(5)), None);
}

#[test]
fn outro_decays_from_a_cancelled_intro() {
    let mut clock = SteppedTimeSource::new(STEP);
    let mut driver = AnimationDriver::new();

    let start = clock.sample();
    driver.begin_intro(start.instant);

    // Let the intro run partway.
    let mut sample = start;
    while sample.instant - start.instant < Duration::from_millis(900) {
        sample = clock.sample();
        driver.tick(sample.instant);
    }
    let captured = driver.intro();
    assert!(captured > 0.0 && captured < 1.0);

    // Navigate mid-intro: the outro starts from the captured value and
    // only decreases.
    assert!(driver.request_leave(1, 0, sample.instant));
    let outro_start = sample.instant;
    let mut last = captured + f32::EPSILON;
    let mut fired = None;
    while sample.instant - outro_start <= OUTRO_DURATION + STEP {
        sample = clock.sample();
        if let Some(target) = driver.tick(sample.instant) {
            fired = Some(target);
        }
        assert!(driver.intro() <= last, "outro increased");
        last = driver.intro();
    }

    assert_eq!(fired, Some(1));
    assert_eq!(driver.intro(), 0.0);
}

#[test]
fn pointer_smoothing_trails_the_raw_pointer() {
    let mut filter = PointerFilter::new();

    // Step input: the filtered value approaches but never overshoots.
    for _ in 0..30 {
        filter.tick([1.0, -1.0]);
        assert!(filter.get()[0] < 1.0);
        assert!(filter.get()[1] > -1.0);
    }
    let partial = filter.get()[0];
    assert!(partial > 0.5, "filter too slow after 30 ticks: {partial}");

    // Reversing the input walks the value back down smoothly.
    filter.tick([-1.0, 1.0]);
    assert!(filter.get()[0] < partial);
}
