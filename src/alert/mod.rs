//! Debounced alarm notifications.
//!
//! - [`notifier`]: per-sensor hysteresis state machine ([`Notifier`])
//! - [`sink`]: delivery of notifications ([`NotificationSink`] trait, log and
//!   Pushover sinks)

pub mod notifier;
pub mod sink;

pub use notifier::{AlarmZone, Evaluation, Notification, NotificationKind, Notifier};
pub use sink::{LogSink, NotificationSink, NotifyError, PushoverSink};
