//! Recording fakes for every output device.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Buzzer, DeviceError, Devices, Display, Indicator, SensorLog};
use crate::alert::{NotificationSink, NotifyError};
use crate::config::FormatSpec;
use crate::data::SeverityBand;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Display(String, Option<Vec<f64>>),
    DisplayClear,
    DisplayDestroy,
    Light(SeverityBand),
    IndicatorClear,
    BuzzerStart,
    BuzzerStop,
    BuzzerDestroy,
    Log(String, Vec<f64>),
    LogClose,
    Notify { message: String, title: String },
}

/// Shared event journal for a set of fake devices.
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    fail_notify: bool,
}

impl Recorder {
    /// A recorder whose sink rejects every notification.
    pub(crate) fn failing_sink() -> Self {
        Self {
            fail_notify: true,
            ..Self::default()
        }
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub(crate) fn lights(&self) -> Vec<SeverityBand> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Light(band) => Some(band),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Display(text, _) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn notifications(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notify { message, title } => Some((message, title)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn logged(&self) -> Vec<(String, Vec<f64>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Log(key, values) => Some((key, values)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, event: &Event) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    /// A full device set, persistent log included, writing to this journal.
    pub(crate) fn devices(&self) -> Devices {
        Devices::new(Box::new(Fake(self.clone())))
            .with_indicator(Box::new(Fake(self.clone())))
            .with_buzzer(Box::new(Fake(self.clone())))
            .with_log(Box::new(Fake(self.clone())))
            .with_sink(Box::new(Fake(self.clone())))
    }
}

#[derive(Debug)]
struct Fake(Recorder);

impl Display for Fake {
    fn display(&mut self, text: &str, trace: Option<&[f64]>) -> Result<(), DeviceError> {
        self.0.push(Event::Display(text.to_string(), trace.map(<[f64]>::to_vec)));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DeviceError> {
        self.0.push(Event::DisplayClear);
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), DeviceError> {
        self.0.push(Event::DisplayDestroy);
        Ok(())
    }
}

impl Indicator for Fake {
    fn light(&mut self, band: SeverityBand) {
        self.0.push(Event::Light(band));
    }

    fn clear(&mut self) {
        self.0.push(Event::IndicatorClear);
    }
}

impl Buzzer for Fake {
    fn start(&mut self) {
        self.0.push(Event::BuzzerStart);
    }

    fn stop(&mut self) {
        self.0.push(Event::BuzzerStop);
    }

    fn destroy(&mut self) {
        self.0.push(Event::BuzzerDestroy);
    }
}

impl SensorLog for Fake {
    fn write(&mut self, key: &str, values: &[f64], _formats: &[FormatSpec]) -> Result<(), DeviceError> {
        self.0.push(Event::Log(key.to_string(), values.to_vec()));
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.0.push(Event::LogClose);
        Ok(())
    }
}

impl NotificationSink for Fake {
    fn send(&self, message: &str, title: &str) -> Result<(), NotifyError> {
        self.0.push(Event::Notify {
            message: message.to_string(),
            title: title.to_string(),
        });
        if self.0.fail_notify {
            return Err(NotifyError::Rejected(500));
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "recording"
    }
}
