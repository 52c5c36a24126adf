//! Sensor metadata and reading acquisition.
//!
//! A [`SensorDescriptor`] is the immutable, validated description of one
//! sensor: what to read, how to display it, and where its thresholds lie.
//! Reader functions are looked up by name in a [`SensorRegistry`] once, when
//! the panel is built.
//!
//! ## Submodules
//!
//! - [`registry`]: name → reader function map
//! - [`system`]: built-in readers for Linux system metrics

pub mod registry;
pub mod system;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::format::FormatSpec;
use crate::config::ConfigError;

pub use registry::{ReadFn, SensorRegistry};

/// Text rendered in place of a value that could not be read.
pub const ERROR_TEXT: &str = "Err";

/// Errors raised by a single sensor read.
///
/// These are transient: the panel logs them and moves on.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The device or file behind the reader failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device answered with something that is not a reading.
    #[error("Unparseable reading: {0}")]
    Parse(String),

    /// The driver reported a failure.
    #[error("Read failed: {0}")]
    Failed(String),

    /// The read did not complete in time.
    #[error("Read timed out after {0:?}")]
    Timeout(Duration),

    /// The reader panicked or was cancelled.
    #[error("Reader aborted: {0}")]
    Aborted(String),
}

/// Behaviour flags of a sensor screen.
#[derive(Debug, Clone, Serialize)]
pub struct SensorFlags {
    pub trace_enabled: bool,
    pub log_enabled: bool,
    pub display_enabled: bool,
    pub notify_enabled: bool,
    pub buzz_on_alarm: bool,
    /// Polling ticks the sensor's screen is held before the panel advances.
    pub repeat_count: u32,
}

impl Default for SensorFlags {
    fn default() -> Self {
        Self {
            trace_enabled: true,
            log_enabled: true,
            display_enabled: true,
            notify_enabled: false,
            buzz_on_alarm: false,
            repeat_count: 1,
        }
    }
}

/// Static, validated metadata for one sensor.
#[derive(Debug, Clone, Serialize)]
pub struct SensorDescriptor {
    pub key: String,
    pub name: String,
    pub short_name: String,
    pub description: String,
    /// Reader names, one per value of the reading tuple.
    pub readers: Vec<String>,
    /// Index of the value used for tracing, classification and alerts.
    pub preferred_index: usize,
    pub baseline: Vec<f64>,
    /// Band multipliers of the preferred baseline: warning, critical[, alarm].
    pub thresholds: Vec<f64>,
    /// Alarm multipliers for the notifier, when tuned separately.
    pub alarm_thresholds: Option<Vec<f64>>,
    pub units: Vec<String>,
    pub formats: Vec<FormatSpec>,
    pub flags: SensorFlags,
}

impl SensorDescriptor {
    /// Check the shape invariants of the descriptor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let len = self.readers.len();
        if len == 0 {
            return Err(ConfigError::LengthMismatch {
                key: self.key.clone(),
                field: "read",
                expected: 1,
                found: 0,
            });
        }
        for (field, found) in [
            ("baseline", self.baseline.len()),
            ("units", self.units.len()),
            ("formats", self.formats.len()),
        ] {
            if found != len {
                return Err(ConfigError::LengthMismatch {
                    key: self.key.clone(),
                    field,
                    expected: len,
                    found,
                });
            }
        }
        if self.preferred_index >= len {
            return Err(ConfigError::PreferredIndex {
                key: self.key.clone(),
                index: self.preferred_index,
                len,
            });
        }
        if self.flags.repeat_count == 0 {
            return Err(ConfigError::ZeroRepeat(self.key.clone()));
        }

        if !self.thresholds.is_empty() {
            if !(2..=3).contains(&self.thresholds.len()) {
                return Err(self.threshold_error("thresholds", "expected 2 or 3 multipliers"));
            }
            self.check_increasing("thresholds", &self.thresholds)?;
        }
        if let Some(alarm) = &self.alarm_thresholds {
            if alarm.len() != 3 {
                return Err(self.threshold_error("alarm_thresholds", "expected 3 multipliers"));
            }
            self.check_increasing("alarm_thresholds", alarm)?;
        }
        if self.flags.notify_enabled && self.alarm_limits().is_none() {
            return Err(ConfigError::NoAlarmThresholds(self.key.clone()));
        }
        Ok(())
    }

    fn threshold_error(&self, field: &'static str, reason: &str) -> ConfigError {
        ConfigError::Thresholds {
            key: self.key.clone(),
            field,
            reason: reason.to_string(),
        }
    }

    /// Multipliers and the limits they produce must both strictly increase.
    fn check_increasing(&self, field: &'static str, multipliers: &[f64]) -> Result<(), ConfigError> {
        if multipliers.iter().any(|m| !m.is_finite()) {
            return Err(self.threshold_error(field, "multipliers must be finite"));
        }
        if !multipliers.windows(2).all(|w| w[0] < w[1]) {
            return Err(self.threshold_error(
                field,
                &format!("{:?} is not strictly increasing", multipliers),
            ));
        }
        let base = self.preferred_baseline();
        let limits: Vec<f64> = multipliers.iter().map(|m| m * base).collect();
        if !limits.windows(2).all(|w| w[0] < w[1]) {
            return Err(self.threshold_error(
                field,
                &format!("limits {:?} from baseline {} are not strictly increasing", limits, base),
            ));
        }
        Ok(())
    }

    /// Baseline of the preferred value.
    pub fn preferred_baseline(&self) -> f64 {
        self.baseline.get(self.preferred_index).copied().unwrap_or_default()
    }

    /// Absolute warning and critical limits for severity bands.
    pub fn band_limits(&self) -> Option<(f64, f64)> {
        match self.thresholds.as_slice() {
            [t1, t2, ..] => {
                let base = self.preferred_baseline();
                Some((t1 * base, t2 * base))
            }
            _ => None,
        }
    }

    /// Absolute notifier limits `t1 < t2 < t3`.
    ///
    /// Uses `alarm_thresholds` when configured, otherwise a three-entry
    /// `thresholds`.
    pub fn alarm_limits(&self) -> Option<[f64; 3]> {
        let multipliers = self.alarm_thresholds.as_deref().unwrap_or(&self.thresholds);
        match multipliers {
            [t1, t2, t3] => {
                let base = self.preferred_baseline();
                Some([t1 * base, t2 * base, t3 * base])
            }
            _ => None,
        }
    }

    /// Format one value of the reading tuple, without its unit.
    pub fn format_value(&self, index: usize, value: Option<f64>) -> String {
        match (value, self.formats.get(index)) {
            (Some(v), Some(spec)) => spec.format(v),
            (Some(v), None) => FormatSpec::default().format(v),
            (None, _) => ERROR_TEXT.to_string(),
        }
    }

    /// Screen text for a reading tuple: `"<name>: <value> <unit>"`.
    pub fn display_text(&self, values: &[Option<f64>]) -> String {
        let index = self.preferred_index;
        match values.get(index).copied().flatten() {
            Some(v) => {
                let unit = self.units.get(index).map(String::as_str).unwrap_or("");
                let text = format!("{}: {}", self.name, self.format_value(index, Some(v)));
                if unit.is_empty() {
                    text
                } else {
                    format!("{} {}", text, unit)
                }
            }
            None => format!("{}: {}", self.name, ERROR_TEXT),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A single-valued descriptor with band thresholds only.
    pub(crate) fn descriptor(key: &str, baseline: f64, thresholds: &[f64]) -> SensorDescriptor {
        SensorDescriptor {
            key: key.to_string(),
            name: key.to_string(),
            short_name: key.to_string(),
            description: String::new(),
            readers: vec![key.to_string()],
            preferred_index: 0,
            baseline: vec![baseline],
            thresholds: thresholds.to_vec(),
            alarm_thresholds: None,
            units: vec![String::new()],
            formats: vec![FormatSpec::default()],
            flags: SensorFlags::default(),
        }
    }

    fn cpu() -> SensorDescriptor {
        SensorDescriptor {
            key: "cpu".to_string(),
            name: "cpu".to_string(),
            short_name: "cpu".to_string(),
            description: "SoC temperature".to_string(),
            readers: vec!["cpu_temp".to_string(), "load1".to_string()],
            preferred_index: 0,
            baseline: vec![50.0, 1.0],
            thresholds: vec![1.2, 1.5],
            alarm_thresholds: None,
            units: vec!["C".to_string(), String::new()],
            formats: vec![FormatSpec::parse("%.1f").unwrap(), FormatSpec::parse("%.2f").unwrap()],
            flags: SensorFlags::default(),
        }
    }

    #[test]
    fn test_valid_descriptor() {
        let d = cpu();
        assert!(d.validate().is_ok());
        assert_eq!(d.band_limits(), Some((60.0, 75.0)));
        assert_eq!(d.alarm_limits(), None);
    }

    #[test]
    fn test_non_increasing_thresholds_rejected() {
        let mut d = cpu();
        d.thresholds = vec![5.0, 3.0];
        let err = d.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Thresholds { field: "thresholds", .. }));
        assert!(err.to_string().contains("not strictly increasing"));
    }

    #[test]
    fn test_negative_baseline_inverts_limits() {
        let mut d = cpu();
        d.baseline[0] = -50.0;
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_threshold_count() {
        let mut d = cpu();
        d.thresholds = vec![1.2];
        assert!(d.validate().is_err());
        d.thresholds = vec![1.0, 1.1, 1.2, 1.3];
        assert!(d.validate().is_err());
        d.thresholds = vec![];
        assert!(d.validate().is_ok());
        assert_eq!(d.band_limits(), None);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut d = cpu();
        d.units.pop();
        assert!(matches!(
            d.validate(),
            Err(ConfigError::LengthMismatch { field: "units", expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_preferred_index_out_of_range() {
        let mut d = cpu();
        d.preferred_index = 2;
        assert!(matches!(d.validate(), Err(ConfigError::PreferredIndex { index: 2, .. })));
    }

    #[test]
    fn test_notify_requires_alarm_limits() {
        let mut d = cpu();
        d.flags.notify_enabled = true;
        assert!(matches!(d.validate(), Err(ConfigError::NoAlarmThresholds(_))));

        d.alarm_thresholds = Some(vec![1.1, 1.3, 1.6]);
        assert!(d.validate().is_ok());
        let [t1, t2, t3] = d.alarm_limits().unwrap();
        assert!((t1 - 55.0).abs() < 1e-9);
        assert!((t2 - 65.0).abs() < 1e-9);
        assert!((t3 - 80.0).abs() < 1e-9);
        assert_eq!(d.band_limits(), Some((60.0, 75.0)));
    }

    #[test]
    fn test_three_thresholds_feed_both_systems() {
        let d = descriptor("gas", 1.0, &[5.0, 7.0, 10.0]);
        assert!(d.validate().is_ok());
        assert_eq!(d.band_limits(), Some((5.0, 7.0)));
        assert_eq!(d.alarm_limits(), Some([5.0, 7.0, 10.0]));
    }

    #[test]
    fn test_zero_repeat_rejected() {
        let mut d = cpu();
        d.flags.repeat_count = 0;
        assert!(matches!(d.validate(), Err(ConfigError::ZeroRepeat(_))));
    }

    #[test]
    fn test_display_text() {
        let d = cpu();
        assert_eq!(d.display_text(&[Some(48.31), Some(0.5)]), "cpu: 48.3 C");
        assert_eq!(d.display_text(&[None, Some(0.5)]), "cpu: Err");
        assert_eq!(d.format_value(1, Some(0.5)), "0.50");
        assert_eq!(d.format_value(1, None), "Err");
    }
}
