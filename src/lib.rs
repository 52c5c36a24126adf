//! # sensor-panel
//!
//! A configuration-driven sensor panel for small Linux boards.
//!
//! The panel cycles through a list of named sensors. For each one it reads a
//! tuple of values, keeps a bounded trace for a trend line, shows the reading
//! on a display, lights a severity indicator and feeds a debounced alarm
//! notifier, so that a sustained alarm produces one notification and one
//! "cleared" message rather than one per polling tick.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            Panel                             │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌─────────┐  │
//! │  │ config  │───▶│  sensor  │───▶│  panel   │───▶│ device  │  │
//! │  │ (load)  │    │(registry)│    │ (cycle)  │    │(outputs)│  │
//! │  └─────────┘    └──────────┘    └────┬─────┘    └─────────┘  │
//! │                                      │                       │
//! │                        ┌─────────────┴──────────┐            │
//! │                        ▼                        ▼            │
//! │                  ┌──────────┐             ┌──────────┐       │
//! │                  │   data   │             │  alert   │       │
//! │                  │(trace,   │             │(notifier,│       │
//! │                  │ bands)   │             │ sinks)   │       │
//! │                  └──────────┘             └──────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: two-document configuration ([`PanelConfig`]) with validation
//! - **[`sensor`]**: sensor metadata ([`SensorDescriptor`]) and the reader
//!   [`SensorRegistry`]
//! - **[`data`]**: trend traces ([`TraceBuffer`]) and severity bands ([`classify`])
//! - **[`alert`]**: alarm hysteresis ([`Notifier`]) and notification sinks
//! - **[`device`]**: display, indicator, buzzer and log contracts with
//!   console, log and terminal implementations
//! - **[`panel`]**: the update cycle and the [`Panel`] loop
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Validate configuration and print the resolved sensors
//! sensor-panel --panel conf/panel.toml --sensors conf/sensors.toml --check
//!
//! # Run with the terminal display
//! sensor-panel --display terminal
//! ```
//!
//! ### As a library
//!
//! ```
//! use sensor_panel::{Devices, LogDisplay, Panel, PanelConfig, SensorRegistry};
//!
//! let config = PanelConfig::from_toml(
//!     r#"
//!     [panel]
//!     order = ["fan"]
//!
//!     [sensors.fan]
//!     repeat = 1
//!     "#,
//!     r#"
//!     [fan]
//!     name = "fan"
//!     read = ["fan_rpm"]
//!     baseline = [1200.0]
//!     thresholds = [1.5, 2.0]
//!     "#,
//! )
//! .unwrap();
//!
//! let mut registry = SensorRegistry::new();
//! registry.register("fan_rpm", || Ok(Some(1250.0)));
//!
//! let devices = Devices::new(Box::new(LogDisplay::new(config.trace_width)));
//! let panel = Panel::new(config, &registry, devices).unwrap();
//! assert_eq!(panel.sensors().len(), 1);
//! ```

pub mod alert;
pub mod config;
pub mod data;
pub mod device;
pub mod panel;
pub mod sensor;

// Re-export main types for convenience
pub use alert::{LogSink, NotificationSink, Notifier, NotifyError, PushoverSink};
pub use config::{ConfigError, FormatSpec, PanelConfig};
pub use data::{classify, SeverityBand, TraceBuffer};
pub use device::{
    Buzzer, ConsoleDisplay, DeviceError, Devices, Display, FileLog, Indicator, LogDisplay,
    SensorLog, TerminalDisplay, Theme,
};
pub use panel::{Panel, SensorState};
pub use sensor::{ReadError, SensorDescriptor, SensorFlags, SensorRegistry};
