//! Tests for loading and saving configuration files

use pan_tilt_tracker::{
    actuator::OutOfRangePolicy,
    axis_controller::ErrorSign,
    config::Config,
    servo::ServoBackend,
    Error,
};
use std::io::Write;

#[test]
fn test_config_file_roundtrip() {
    let mut config = Config::default();
    config.pan.error_sign = ErrorSign::CenterMinusObject;
    config.pan.integral_limit = Some(250.0);
    config.tilt.min_angle = -90.0;
    config.tilt.max_angle = 90.0;
    config.tilt.neutral_angle = 0.0;
    config.servo.backend = ServoBackend::Maestro;
    config.servo.out_of_range = OutOfRangePolicy::Clamp;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.yaml");
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_hand_written_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
pan:
  gains: {{ p: 0.03, i: 0.0, d: 0.002 }}
  min_angle: 10.0
  max_angle: 170.0
  neutral_angle: 90.0
  error_sign: center_minus_object
servo:
  backend: maestro
  port: /dev/ttyUSB0
  out_of_range: clamp
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.pan.gains.p, 0.03);
    assert_eq!(config.pan.error_sign, ErrorSign::CenterMinusObject);
    assert_eq!(config.pan.integral_limit, None);
    assert_eq!(config.servo.port, "/dev/ttyUSB0");
    assert_eq!(config.servo.out_of_range, OutOfRangePolicy::Clamp);
    assert_eq!(config.tilt, Config::default().tilt);
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_yaml_is_config_error() {
    let result = Config::from_yaml("pan: [1, 2");
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_unknown_enum_value_is_config_error() {
    let result = Config::from_yaml("servo:\n  out_of_range: wrap\n");
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_one_line_windup_guard() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "pan:\n  integral_limit: 50.0").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    let defaults = Config::default();
    assert_eq!(config.pan.integral_limit, Some(50.0));
    assert_eq!(config.pan.gains, defaults.pan.gains);
    assert_eq!(config.pan.range(), defaults.pan.range());
    assert_eq!(config.pan.neutral_angle, defaults.pan.neutral_angle);
    assert_eq!(config.tilt, defaults.tilt);
    assert!(config.validate().is_ok());
}

#[test]
fn test_pulse_width_beyond_controller_rejected() {
    let config = Config::from_yaml("servo:\n  backend: maestro\n  max_pulse_us: 5000\n").unwrap();
    assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
}

#[test]
fn test_tilt_neutral_at_range_end() {
    let config = Config::from_yaml("tilt:\n  neutral_angle: 180.0\n").unwrap();
    assert_eq!(config.pan.neutral_angle, 90.0);
    assert_eq!(config.tilt.neutral_angle, 180.0);
    assert!(config.validate().is_ok());
}
