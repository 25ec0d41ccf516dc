//! End-to-end tests running all four workers

mod test_helpers;

use pan_tilt_tracker::{
    axis_controller::Axis,
    config::Config,
    detection::synthetic::{SyntheticSource, SyntheticTarget},
    supervisor::Tracker,
    Error,
};
use std::thread;
use std::time::{Duration, Instant};
use test_helpers::{FixedSource, FixedTarget, RecordingServo, TestFrame};

const FRAME: TestFrame = TestFrame { width: 640, height: 480 };

fn fast_config() -> Config {
    let mut config = Config::default();
    config.timing.controller_interval_ms = 5;
    config.timing.driver_interval_ms = 5;
    config.timing.detector_idle_ms = 1;
    config.timing.shutdown_poll_ms = 5;
    config
}

#[test]
fn test_tracker_follows_target_and_parks() {
    let servo = RecordingServo::new();
    // Face 100 px right of center, level vertically
    let target = FixedTarget(Some((420.0, 240.0)));
    let handle = Tracker::new(fast_config(), FixedSource(FRAME), target, servo.clone())
        .unwrap()
        .start()
        .unwrap();

    thread::sleep(Duration::from_millis(300));
    let (pan, tilt) = handle.shared().commands();
    handle.shutdown().unwrap();

    assert!(pan > 90.0, "pan should move toward the face, got {pan}");
    assert!((tilt - 90.0).abs() < 1e-9, "tilt should hold, got {tilt}");

    let writes = servo.writes();
    assert!(writes.iter().all(|(_, angle)| (0.0..=180.0).contains(angle)));

    // Both axes finish at neutral
    let parked: Vec<_> = writes[writes.len() - 2..].to_vec();
    assert_eq!(parked, vec![(Axis::Pan, 90.0), (Axis::Tilt, 90.0)]);
}

#[test]
fn test_tracker_holds_without_target() {
    let servo = RecordingServo::new();
    let handle = Tracker::new(fast_config(), FixedSource(FRAME), FixedTarget(None), servo.clone())
        .unwrap()
        .start()
        .unwrap();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(handle.shared().commands(), (90.0, 90.0));
    handle.shutdown().unwrap();

    assert!(!servo.writes().is_empty());
    assert!(servo.writes().iter().all(|(_, angle)| *angle == 90.0));
}

#[test]
fn test_shutdown_is_bounded_by_poll_interval() {
    let mut config = fast_config();
    config.timing.controller_interval_ms = 10_000;
    config.timing.driver_interval_ms = 10_000;
    config.timing.detector_idle_ms = 10_000;
    config.timing.shutdown_poll_ms = 20;

    let handle = Tracker::new(config, FixedSource(FRAME), FixedTarget(None), RecordingServo::new())
        .unwrap()
        .start()
        .unwrap();
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    handle.shutdown().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
}

#[test]
fn test_tracker_with_synthetic_target() {
    let servo = RecordingServo::new();
    let source = SyntheticSource::new(640, 480, Duration::from_millis(5));
    let target = SyntheticTarget::new(Duration::from_millis(400), 0.8, 0.25);

    let handle = Tracker::new(fast_config(), source, target, servo.clone())
        .unwrap()
        .start()
        .unwrap();
    thread::sleep(Duration::from_millis(500));
    handle.shutdown().unwrap();

    let pan = servo.writes_for(Axis::Pan);
    assert!(pan.iter().any(|&angle| angle != 90.0));
    assert_eq!(pan.last(), Some(&90.0));
}

#[test]
fn test_tracker_rejects_invalid_config() {
    let mut config = Config::default();
    config.pan.min_angle = 170.0;
    config.pan.max_angle = 10.0;

    let result = Tracker::new(config, FixedSource(FRAME), FixedTarget(None), RecordingServo::new());
    assert!(matches!(result, Err(Error::ConfigError(_))));
}
