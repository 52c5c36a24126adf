//! Alarm hysteresis.
//!
//! A [`Notifier`] watches one sensor against three ascending limits
//! `t1 < t2 < t3`:
//!
//! ```text
//!   value      zone       buzzer   notification
//!   < t1       Normal     off      -
//!   t1..t2     Warning    off      -
//!   t2..t3     PreAlarm   on       -
//!   >= t3      Alarm      on       "detected" once per excursion
//! ```
//!
//! Once an alarm has fired the notifier stays triggered until the value
//! falls below `t2`, which emits a single "clearing" notification. The gap
//! between `t2` and `t3` keeps a reading that hovers around `t3` from
//! toggling the alarm.

use crate::config::FormatSpec;
use crate::sensor::SensorDescriptor;

/// Where a value sits relative to the three alarm limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlarmZone {
    Normal,
    Warning,
    PreAlarm,
    Alarm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Alarm,
    Cleared,
}

/// A message for the notification sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Outcome of testing one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub zone: AlarmZone,
    /// Whether the buzzer should sound (`value >= t2`).
    pub buzz: bool,
    pub notification: Option<Notification>,
}

/// Per-sensor alarm state machine.
#[derive(Debug, Clone)]
pub struct Notifier {
    label: String,
    limits: [f64; 3],
    format: FormatSpec,
    triggered: bool,
}

impl Notifier {
    /// Create a notifier for ascending `limits`.
    pub fn new(label: impl Into<String>, limits: [f64; 3], format: FormatSpec) -> Self {
        debug_assert!(limits[0] < limits[1] && limits[1] < limits[2]);
        Self {
            label: label.into(),
            limits,
            format,
            triggered: false,
        }
    }

    /// Build the notifier for a sensor with notifications enabled.
    pub fn for_sensor(descriptor: &SensorDescriptor) -> Option<Self> {
        if !descriptor.flags.notify_enabled {
            return None;
        }
        let limits = descriptor.alarm_limits()?;
        let format = descriptor.formats.get(descriptor.preferred_index).cloned().unwrap_or_default();
        Some(Self::new(descriptor.short_name.clone(), limits, format))
    }

    pub fn limits(&self) -> [f64; 3] {
        self.limits
    }

    /// True between an alarm and the matching clear.
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Advance the state machine with a new reading.
    pub fn test_threshold(&mut self, value: f64) -> Evaluation {
        let [_, t2, t3] = self.limits;
        let zone = self.zone(value);
        let mut notification = None;

        if zone == AlarmZone::Alarm && !self.triggered {
            self.triggered = true;
            notification = Some(Notification {
                kind: NotificationKind::Alarm,
                title: format!("{} alarm", self.label),
                message: format!(
                    "{} detected {} > {}",
                    self.label,
                    self.format.format(value),
                    self.format.format(t3)
                ),
            });
        }

        if value < t2 && self.triggered {
            self.triggered = false;
            notification = Some(Notification {
                kind: NotificationKind::Cleared,
                title: format!("{} cleared", self.label),
                message: format!(
                    "{} clearing, {} < {}",
                    self.label,
                    self.format.format(value),
                    self.format.format(t2)
                ),
            });
        }

        Evaluation {
            zone,
            buzz: zone >= AlarmZone::PreAlarm,
            notification,
        }
    }

    fn zone(&self, value: f64) -> AlarmZone {
        let [t1, t2, t3] = self.limits;
        if value >= t3 {
            AlarmZone::Alarm
        } else if value >= t2 {
            AlarmZone::PreAlarm
        } else if value >= t1 {
            AlarmZone::Warning
        } else {
            AlarmZone::Normal
        }
    }
}
