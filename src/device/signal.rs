//! Log-backed indicator and buzzer for hosts without GPIO.

use tracing::{debug, info};

use super::{Buzzer, Indicator};
use crate::data::SeverityBand;

/// Reports indicator changes through the log.
///
/// Only transitions are logged, since the panel clears and relights the
/// indicator on every tick.
#[derive(Debug, Default)]
pub struct LogIndicator {
    lit: Option<SeverityBand>,
    last_reported: Option<SeverityBand>,
}

impl LogIndicator {
    /// The band currently lit, if any.
    pub fn lit(&self) -> Option<SeverityBand> {
        self.lit
    }
}

impl Indicator for LogIndicator {
    fn light(&mut self, band: SeverityBand) {
        self.lit = Some(band);
        if self.last_reported != Some(band) {
            debug!(band = %band, color = band.color(), "Indicator lit");
            self.last_reported = Some(band);
        }
    }

    fn clear(&mut self) {
        self.lit = None;
    }
}

/// Reports buzzer changes through the log.
#[derive(Debug, Default)]
pub struct LogBuzzer {
    sounding: bool,
}

impl LogBuzzer {
    pub fn is_sounding(&self) -> bool {
        self.sounding
    }
}

impl Buzzer for LogBuzzer {
    fn start(&mut self) {
        if !self.sounding {
            info!("Buzzer on");
            self.sounding = true;
        }
    }

    fn stop(&mut self) {
        if self.sounding {
            info!("Buzzer off");
            self.sounding = false;
        }
    }
}
