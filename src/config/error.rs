//! Configuration errors.

use thiserror::Error;

use super::format::FormatError;

/// Errors raised while loading or validating the panel configuration.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration document could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The panel lists no sensors.
    #[error("No sensors configured in panel order")]
    Empty,

    /// A sensor key appears more than once in the panel order.
    #[error("Sensor '{0}' listed more than once in panel order")]
    Duplicate(String),

    /// A sensor in the panel order is missing from one of the documents.
    #[error("Sensor '{key}' missing from {document} document")]
    MissingSensor { key: String, document: &'static str },

    /// Per-value lists of a sensor disagree in length.
    #[error("Sensor '{key}': {field} has {found} entries, expected {expected}")]
    LengthMismatch {
        key: String,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// The preferred value index is outside the reading tuple.
    #[error("Sensor '{key}': preferred_index {index} out of range for {len} values")]
    PreferredIndex { key: String, index: usize, len: usize },

    /// Threshold multipliers are malformed.
    #[error("Sensor '{key}': invalid {field}: {reason}")]
    Thresholds {
        key: String,
        field: &'static str,
        reason: String,
    },

    /// Notifications were requested but no alarm limits exist.
    #[error("Sensor '{0}': notify requires alarm_thresholds or three thresholds")]
    NoAlarmThresholds(String),

    /// A sensor must stay on screen for at least one polling tick.
    #[error("Sensor '{0}': repeat must be at least 1")]
    ZeroRepeat(String),

    /// The trace width must hold at least one reading.
    #[error("trace_width must be at least 1")]
    ZeroTraceWidth,

    /// A duration string could not be parsed.
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration { field: &'static str, reason: String },

    /// A value format string is malformed.
    #[error("Sensor '{key}': {source}")]
    InvalidFormat {
        key: String,
        #[source]
        source: FormatError,
    },

    /// A reader name does not exist in the registry.
    #[error("Sensor '{key}': unknown reader '{reader}'")]
    UnknownReader { key: String, reader: String },
}
