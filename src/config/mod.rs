//! Panel configuration loading.
//!
//! The panel is described by two documents:
//!
//! - the **panel document** holds panel-wide settings, the order in which
//!   sensors are shown, and per-sensor screen settings (repeat count, value
//!   formats, trace/log/display/notify/buzz flags);
//! - the **sensor document** maps each sensor key to its name, readers,
//!   baseline, units and thresholds.
//!
//! ```toml
//! # panel.toml
//! [panel]
//! polling_interval = "1s"
//! read_timeout = "5s"
//! trace_width = 128
//! order = ["cpu", "load"]
//!
//! [sensors.cpu]
//! repeat = 10
//! formats = ["%.1f"]
//! notify = true
//!
//! # sensors.toml
//! [cpu]
//! name = "cpu"
//! read = ["cpu_temp"]
//! baseline = [50.0]
//! units = ["C"]
//! thresholds = [1.2, 1.5]
//! alarm_thresholds = [1.2, 1.5, 1.8]
//! ```
//!
//! Any format the `config` crate understands (TOML, JSON, YAML, …) may be
//! used; it is picked from the file extension. Panel settings can be
//! overridden from the environment with the `SENSOR_PANEL` prefix and `__` as
//! separator, e.g. `SENSOR_PANEL__PANEL__POLLING_INTERVAL=2s`. Keys are
//! expected in lowercase.
//!
//! Every inconsistency is reported as a [`ConfigError`] before the panel
//! starts.

mod error;
pub mod format;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

pub use error::ConfigError;
pub use format::{FormatError, FormatSpec};

use crate::data::duration::parse_duration;
use crate::sensor::{SensorDescriptor, SensorFlags};

/// Environment variable prefix for panel overrides.
const ENV_PREFIX: &str = "SENSOR_PANEL";

#[derive(Debug, Default, Deserialize)]
struct PanelDocument {
    #[serde(default)]
    panel: PanelSection,
    #[serde(default)]
    sensors: BTreeMap<String, ScreenSection>,
    #[serde(default)]
    notify: NotifySettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PanelSection {
    polling_interval: String,
    read_timeout: String,
    trace_width: usize,
    order: Vec<String>,
    log_dir: PathBuf,
    log_prefix: String,
}

impl Default for PanelSection {
    fn default() -> Self {
        Self {
            polling_interval: "1s".to_string(),
            read_timeout: "5s".to_string(),
            trace_width: 128,
            order: Vec::new(),
            log_dir: PathBuf::from("."),
            log_prefix: "sensor_panel".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScreenSection {
    repeat: u32,
    formats: Option<Vec<String>>,
    trace: bool,
    log: bool,
    display: bool,
    notify: bool,
    buzz: bool,
}

impl Default for ScreenSection {
    fn default() -> Self {
        let flags = SensorFlags::default();
        Self {
            repeat: flags.repeat_count,
            formats: None,
            trace: flags.trace_enabled,
            log: flags.log_enabled,
            display: flags.display_enabled,
            notify: flags.notify_enabled,
            buzz: flags.buzz_on_alarm,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SensorInfo {
    name: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    description: String,
    read: Vec<String>,
    baseline: Vec<f64>,
    #[serde(default)]
    units: Option<Vec<String>>,
    #[serde(default)]
    preferred_index: usize,
    #[serde(default)]
    thresholds: Vec<f64>,
    #[serde(default)]
    alarm_thresholds: Option<Vec<f64>>,
}

/// Where alarm notifications are delivered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifySettings {
    pub pushover_token: Option<String>,
    pub pushover_user: Option<String>,
}

impl NotifySettings {
    /// Pushover application token and user key, when both are configured.
    pub fn pushover(&self) -> Option<(&str, &str)> {
        match (&self.pushover_token, &self.pushover_user) {
            (Some(token), Some(user)) if !token.is_empty() && !user.is_empty() => {
                Some((token.as_str(), user.as_str()))
            }
            _ => None,
        }
    }
}

/// Validated panel configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Sleep between polling ticks.
    pub polling_interval: Duration,
    /// Upper bound for a single reader call.
    pub read_timeout: Duration,
    /// Readings kept per trace.
    pub trace_width: usize,
    pub log_dir: PathBuf,
    pub log_prefix: String,
    pub notify: NotifySettings,
    /// Sensors in panel order.
    pub sensors: Vec<SensorDescriptor>,
}

impl PanelConfig {
    /// Load both documents from disk and validate them.
    pub fn load(panel_path: &Path, sensors_path: &Path) -> Result<Self, ConfigError> {
        let panel = Config::builder()
            .add_source(File::from(panel_path))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize::<PanelDocument>()?;

        let sensors = Config::builder()
            .add_source(File::from(sensors_path))
            .build()?
            .try_deserialize::<BTreeMap<String, SensorInfo>>()?;

        Self::from_documents(panel, sensors)
    }

    /// Parse both documents from TOML text.
    pub fn from_toml(panel: &str, sensors: &str) -> Result<Self, ConfigError> {
        let panel = Config::builder()
            .add_source(File::from_str(panel, FileFormat::Toml))
            .build()?
            .try_deserialize::<PanelDocument>()?;

        let sensors = Config::builder()
            .add_source(File::from_str(sensors, FileFormat::Toml))
            .build()?
            .try_deserialize::<BTreeMap<String, SensorInfo>>()?;

        Self::from_documents(panel, sensors)
    }

    fn from_documents(
        mut document: PanelDocument,
        mut sensors: BTreeMap<String, SensorInfo>,
    ) -> Result<Self, ConfigError> {
        let section = document.panel;
        if section.order.is_empty() {
            return Err(ConfigError::Empty);
        }
        if section.trace_width == 0 {
            return Err(ConfigError::ZeroTraceWidth);
        }

        let polling_interval = parse_duration(&section.polling_interval).map_err(|e| {
            ConfigError::InvalidDuration {
                field: "polling_interval",
                reason: e.to_string(),
            }
        })?;
        let read_timeout =
            parse_duration(&section.read_timeout).map_err(|e| ConfigError::InvalidDuration {
                field: "read_timeout",
                reason: e.to_string(),
            })?;
        if read_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: "read_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut descriptors = Vec::with_capacity(section.order.len());
        for key in &section.order {
            if !seen.insert(key.as_str()) {
                return Err(ConfigError::Duplicate(key.clone()));
            }
            let screen = document.sensors.remove(key).ok_or_else(|| ConfigError::MissingSensor {
                key: key.clone(),
                document: "panel",
            })?;
            let info = sensors.remove(key).ok_or_else(|| ConfigError::MissingSensor {
                key: key.clone(),
                document: "sensor",
            })?;
            let descriptor = build_descriptor(key, screen, info)?;
            descriptor.validate()?;
            descriptors.push(descriptor);
        }

        for key in document.sensors.keys().chain(sensors.keys()) {
            debug!("Ignoring sensor '{}' not listed in panel order", key);
        }

        Ok(Self {
            polling_interval,
            read_timeout,
            trace_width: section.trace_width,
            log_dir: section.log_dir,
            log_prefix: section.log_prefix,
            notify: document.notify,
            sensors: descriptors,
        })
    }

    /// Path of the sensor data log for `host`.
    pub fn log_path(&self, host: &str) -> PathBuf {
        self.log_dir.join(format!("{}.{}.out", self.log_prefix, host))
    }
}

fn build_descriptor(
    key: &str,
    screen: ScreenSection,
    info: SensorInfo,
) -> Result<SensorDescriptor, ConfigError> {
    let count = info.read.len();

    let formats = match screen.formats {
        Some(specs) => specs
            .iter()
            .map(|s| {
                FormatSpec::parse(s).map_err(|source| ConfigError::InvalidFormat {
                    key: key.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![FormatSpec::default(); count],
    };

    Ok(SensorDescriptor {
        key: key.to_string(),
        short_name: info.short_name.unwrap_or_else(|| key.to_string()),
        name: info.name,
        description: info.description,
        readers: info.read,
        preferred_index: info.preferred_index,
        baseline: info.baseline,
        thresholds: info.thresholds,
        alarm_thresholds: info.alarm_thresholds,
        units: info.units.unwrap_or_else(|| vec![String::new(); count]),
        formats,
        flags: SensorFlags {
            trace_enabled: screen.trace,
            log_enabled: screen.log,
            display_enabled: screen.display,
            notify_enabled: screen.notify,
            buzz_on_alarm: screen.buzz,
            repeat_count: screen.repeat,
        },
    })
}
