//! Output devices driven by the panel.
//!
//! The panel talks to its hardware through four small contracts. Each has a
//! console/log implementation in this crate; hardware drivers implement the
//! same traits.
//!
//! - [`Display`]: renders a label/value line and an optional trend line
//! - [`Indicator`]: tri-state severity lights
//! - [`Buzzer`]: audible alarm
//! - [`SensorLog`]: append-only reading log
//!
//! ## Submodules
//!
//! - [`display`]: console, log and terminal displays
//! - [`log`]: timestamped file log ([`FileLog`])
//! - [`signal`]: log-backed indicator and buzzer
//! - [`theme`]: terminal colours

pub mod display;
pub mod log;
pub mod signal;
pub mod theme;

#[cfg(test)]
pub(crate) mod testing;

pub use display::{sparkline, ConsoleDisplay, LogDisplay, TerminalDisplay, TerminalIndicator};
pub use log::FileLog;
pub use signal::{LogBuzzer, LogIndicator};
pub use theme::Theme;

use std::fmt::Debug;

use thiserror::Error;

use crate::alert::{LogSink, NotificationSink};
use crate::config::FormatSpec;
use crate::data::SeverityBand;

/// Errors raised by an output device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Writing to the device failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device has been destroyed or could not be opened.
    #[error("Device unavailable: {0}")]
    Unavailable(String),
}

/// A text display with an optional trend line.
pub trait Display: Send + Debug {
    /// Show `text`, plus `trace` as a trend line when given.
    fn display(&mut self, text: &str, trace: Option<&[f64]>) -> Result<(), DeviceError>;

    fn clear(&mut self) -> Result<(), DeviceError>;

    /// Release the device. Further calls may fail with
    /// [`DeviceError::Unavailable`].
    fn destroy(&mut self) -> Result<(), DeviceError>;
}

/// Severity lights.
pub trait Indicator: Send + Debug {
    fn light(&mut self, band: SeverityBand);

    /// Turn every light off.
    fn clear(&mut self);
}

pub trait Buzzer: Send + Debug {
    fn start(&mut self);

    fn stop(&mut self);

    /// Stop and release the buzzer.
    fn destroy(&mut self) {
        self.stop();
    }
}

/// Persistent log of readings.
pub trait SensorLog: Send + Debug {
    /// Append one record: timestamp, `key`, then each value rendered with
    /// its format spec.
    fn write(&mut self, key: &str, values: &[f64], formats: &[FormatSpec]) -> Result<(), DeviceError>;

    /// Flush and release the log. Later writes fail.
    fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// Everything the panel writes to.
///
/// The panel owns this bundle and lends it to each update cycle.
#[derive(Debug)]
pub struct Devices {
    pub display: Box<dyn Display>,
    pub indicator: Box<dyn Indicator>,
    pub buzzer: Box<dyn Buzzer>,
    pub log: Option<Box<dyn SensorLog>>,
    pub sink: Box<dyn NotificationSink>,
}

impl Devices {
    /// Devices around `display`, with log-backed indicator, buzzer and
    /// notification sink and no persistent log.
    pub fn new(display: Box<dyn Display>) -> Self {
        Self {
            display,
            indicator: Box::new(LogIndicator::default()),
            buzzer: Box::new(LogBuzzer::default()),
            log: None,
            sink: Box::new(LogSink),
        }
    }

    pub fn with_indicator(mut self, indicator: Box<dyn Indicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn with_buzzer(mut self, buzzer: Box<dyn Buzzer>) -> Self {
        self.buzzer = buzzer;
        self
    }

    pub fn with_log(mut self, log: Box<dyn SensorLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }
}
