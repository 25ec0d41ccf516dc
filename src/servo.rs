//! Servo output backends.
//!
//! The actuator driver talks to hardware only through [`ServoSink`]. Writes
//! must be idempotent: the driver re-sends the same angle every poll.

use crate::{
    axis_controller::{AngleRange, Axis},
    config::ServoConfig,
    constants::{MAESTRO_MAX_PULSE_US, MAESTRO_SET_TARGET, SERVO_WRITE_TIMEOUT_MS},
    error::{Error, Result},
    utils::safe_cast::f64_to_u16,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use std::io::Write;
use std::time::Duration;

/// Angle sink for the two servos
pub trait ServoSink: Send {
    /// Move one axis to `angle` degrees
    fn write_angle(&mut self, axis: Axis, angle: f64) -> Result<()>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

impl<S: ServoSink + ?Sized> ServoSink for Box<S> {
    fn write_angle(&mut self, axis: Axis, angle: f64) -> Result<()> {
        (**self).write_angle(axis, angle)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Available servo backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServoBackend {
    /// Log angles without touching hardware
    #[default]
    DryRun,
    /// Pololu Maestro USB servo controller
    Maestro,
}

/// Map an angle linearly onto the pulse width range
///
/// # Errors
///
/// Returns an error if the angle lies outside `range`
pub fn angle_to_pulse_us(angle: f64, range: AngleRange, min_pulse_us: u16, max_pulse_us: u16) -> Result<u16> {
    if !range.contains(angle) {
        return Err(Error::InvalidInput(format!(
            "Angle {angle} outside [{}, {}]",
            range.min, range.max
        )));
    }
    let fraction = (angle - range.min) / (range.max - range.min);
    let span = f64::from(max_pulse_us) - f64::from(min_pulse_us);
    f64_to_u16(fraction.mul_add(span, f64::from(min_pulse_us)))
}

/// Servo sink that only records and logs angles
#[derive(Debug, Default)]
pub struct DryRunServo {
    pan: Option<f64>,
    tilt: Option<f64>,
}

impl DryRunServo {
    #[must_use]
    pub fn new() -> Self {
        info!("Dry-run servo output, no hardware will move");
        Self::default()
    }

    /// Last angle written to an axis
    #[must_use]
    pub const fn last_angle(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
        }
    }
}

impl ServoSink for DryRunServo {
    fn write_angle(&mut self, axis: Axis, angle: f64) -> Result<()> {
        let slot = match axis {
            Axis::Pan => &mut self.pan,
            Axis::Tilt => &mut self.tilt,
        };
        if *slot != Some(angle) {
            debug!("[dry-run] {axis} -> {angle:.2}");
        }
        *slot = Some(angle);
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}

/// Pololu Maestro driven with the compact serial protocol
pub struct MaestroServo {
    port: Box<dyn SerialPort>,
    pan_channel: u8,
    tilt_channel: u8,
    pan_range: AngleRange,
    tilt_range: AngleRange,
    min_pulse_us: u16,
    max_pulse_us: u16,
}

impl MaestroServo {
    /// Open the controller's command port
    pub fn open(config: &ServoConfig, pan_range: AngleRange, tilt_range: AngleRange) -> Result<Self> {
        info!("Opening Maestro servo controller on {} at {} baud", config.port, config.baud_rate);
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(SERVO_WRITE_TIMEOUT_MS))
            .open()?;

        Ok(Self {
            port,
            pan_channel: config.pan_channel,
            tilt_channel: config.tilt_channel,
            pan_range,
            tilt_range,
            min_pulse_us: config.min_pulse_us,
            max_pulse_us: config.max_pulse_us,
        })
    }

    /// Encode a "set target" command; the target is in quarter-microseconds
    ///
    /// # Errors
    ///
    /// Returns an error if the pulse does not fit the 14-bit target field
    pub fn set_target_command(channel: u8, pulse_us: u16) -> Result<[u8; 4]> {
        if pulse_us > MAESTRO_MAX_PULSE_US {
            return Err(Error::InvalidInput(format!(
                "Pulse {pulse_us} us exceeds the Maestro limit of {MAESTRO_MAX_PULSE_US} us"
            )));
        }
        let target = u32::from(pulse_us) * 4;
        Ok([
            MAESTRO_SET_TARGET,
            channel,
            (target & 0x7F) as u8,
            ((target >> 7) & 0x7F) as u8,
        ])
    }
}

impl ServoSink for MaestroServo {
    fn write_angle(&mut self, axis: Axis, angle: f64) -> Result<()> {
        let (channel, range) = match axis {
            Axis::Pan => (self.pan_channel, self.pan_range),
            Axis::Tilt => (self.tilt_channel, self.tilt_range),
        };
        let pulse_us = angle_to_pulse_us(angle, range, self.min_pulse_us, self.max_pulse_us)?;
        let command = Self::set_target_command(channel, pulse_us)?;

        self.port
            .write_all(&command)
            .and_then(|()| self.port.flush())
            .map_err(|e| Error::Servo(format!("Failed to write {axis} target: {e}")))
    }

    fn name(&self) -> &str {
        "maestro"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_to_pulse_endpoints() {
        let range = AngleRange::new(0.0, 180.0);
        assert_eq!(angle_to_pulse_us(0.0, range, 600, 2300).unwrap(), 600);
        assert_eq!(angle_to_pulse_us(90.0, range, 600, 2300).unwrap(), 1450);
        assert_eq!(angle_to_pulse_us(180.0, range, 600, 2300).unwrap(), 2300);
    }

    #[test]
    fn test_angle_to_pulse_signed_range() {
        let range = AngleRange::new(-90.0, 90.0);
        assert_eq!(angle_to_pulse_us(0.0, range, 1000, 2000).unwrap(), 1500);
        assert!(angle_to_pulse_us(91.0, range, 1000, 2000).is_err());
        assert!(angle_to_pulse_us(f64::NAN, range, 1000, 2000).is_err());
    }

    #[test]
    fn test_maestro_set_target_encoding() {
        // 1500 us -> 6000 quarter-us -> 0x70, 0x2E
        assert_eq!(MaestroServo::set_target_command(0, 1500).unwrap(), [0x84, 0x00, 0x70, 0x2E]);
        assert_eq!(MaestroServo::set_target_command(1, 600).unwrap(), [0x84, 0x01, 0x60, 0x12]);
    }

    #[test]
    fn test_maestro_target_field_limit() {
        // 4095 us is the largest 14-bit quarter-us target: 16380 -> 0x7C, 0x7F
        assert_eq!(MaestroServo::set_target_command(2, 4095).unwrap(), [0x84, 0x02, 0x7C, 0x7F]);

        // 5000 us would wrap to 904 us if the high bits were masked off
        let pulse = angle_to_pulse_us(180.0, AngleRange::new(0.0, 180.0), 600, 5000).unwrap();
        assert_eq!(pulse, 5000);
        assert!(matches!(
            MaestroServo::set_target_command(0, pulse),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_dry_run_records_last_angle() {
        let mut servo = DryRunServo::new();
        assert_eq!(servo.last_angle(Axis::Pan), None);
        servo.write_angle(Axis::Pan, 45.0).unwrap();
        servo.write_angle(Axis::Pan, 45.0).unwrap();
        servo.write_angle(Axis::Tilt, 120.0).unwrap();
        assert_eq!(servo.last_angle(Axis::Pan), Some(45.0));
        assert_eq!(servo.last_angle(Axis::Tilt), Some(120.0));
    }

    #[test]
    fn test_servo_backend_yaml_names() {
        let backend: ServoBackend = serde_yaml::from_str("maestro").unwrap();
        assert_eq!(backend, ServoBackend::Maestro);
        assert_eq!(ServoBackend::default(), ServoBackend::DryRun);
    }
}
