//! The panel loop.
//!
//! A [`Panel`] owns one [`SensorState`] per configured sensor and the
//! [`Devices`] they are shown on. Each pass runs the update cycle for every
//! sensor in configuration order; passes repeat until the shutdown future
//! resolves.
//!
//! ```text
//!   run ──▶ pass ──▶ cycle(sensor 1) ──▶ cycle(sensor 2) ──▶ … ──┐
//!    ▲                                                           │
//!    └───────────────────────────────────────────────────────────┘
//!         shutdown ──▶ release (indicator, buzzer, display, log)
//! ```

mod cycle;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::alert::Notifier;
use crate::config::{ConfigError, PanelConfig};
use crate::data::duration::format_duration;
use crate::data::{SeverityBand, TraceBuffer};
use crate::device::Devices;
use crate::sensor::{SensorDescriptor, SensorRegistry};

use cycle::{BoundedReader, Timing};

/// Runtime state of one sensor.
pub struct SensorState {
    descriptor: SensorDescriptor,
    readers: Vec<BoundedReader>,
    trace: TraceBuffer,
    notifier: Option<Notifier>,
    last: Vec<Option<f64>>,
    band: Option<SeverityBand>,
}

impl fmt::Debug for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorState")
            .field("key", &self.descriptor.key)
            .field("readers", &self.descriptor.readers)
            .field("trace", &self.trace.len())
            .field("notifier", &self.notifier)
            .field("band", &self.band)
            .finish()
    }
}

impl SensorState {
    pub fn descriptor(&self) -> &SensorDescriptor {
        &self.descriptor
    }

    pub fn trace(&self) -> &TraceBuffer {
        &self.trace
    }

    pub fn notifier(&self) -> Option<&Notifier> {
        self.notifier.as_ref()
    }

    /// The most recent reading tuple, empty before the first tick.
    pub fn last_values(&self) -> &[Option<f64>] {
        &self.last
    }

    /// The band most recently lit for this sensor.
    pub fn band(&self) -> Option<SeverityBand> {
        self.band
    }
}

/// The sensor panel.
///
/// # Example
///
/// ```no_run
/// use sensor_panel::{ConsoleDisplay, Devices, Panel, PanelConfig, SensorRegistry};
///
/// # tokio_test::block_on(async {
/// let config = PanelConfig::load("panel.toml".as_ref(), "sensors.toml".as_ref()).unwrap();
/// let registry = SensorRegistry::with_system_readers();
/// let devices = Devices::new(Box::new(ConsoleDisplay::stdout(config.trace_width)));
///
/// let mut panel = Panel::new(config, &registry, devices).unwrap();
/// panel.run(async {
///     let _ = tokio::signal::ctrl_c().await;
/// })
/// .await;
/// # });
/// ```
#[derive(Debug)]
pub struct Panel {
    sensors: Vec<SensorState>,
    devices: Devices,
    timing: Timing,
    passes: u64,
    released: bool,
}

impl Panel {
    /// Resolve every sensor's readers and set up its trace and notifier.
    ///
    /// Fails on the first reader name the registry does not know.
    pub fn new(
        config: PanelConfig,
        registry: &SensorRegistry,
        devices: Devices,
    ) -> Result<Self, ConfigError> {
        let trace_width = config.trace_width;
        let sensors = config
            .sensors
            .into_iter()
            .map(|descriptor| {
                let readers = registry
                    .resolve(&descriptor)?
                    .into_iter()
                    .zip(&descriptor.readers)
                    .map(|(read, name)| BoundedReader::new(name.as_str(), read))
                    .collect();
                let notifier = Notifier::for_sensor(&descriptor);
                if let Some(n) = &notifier {
                    debug!(sensor = %descriptor.key, limits = ?n.limits(), "Notifier armed");
                }
                Ok(SensorState {
                    readers,
                    trace: TraceBuffer::new(trace_width),
                    notifier,
                    last: Vec::new(),
                    band: None,
                    descriptor,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let mut panel = Self {
            sensors,
            devices,
            timing: Timing {
                polling_interval: config.polling_interval,
                read_timeout: config.read_timeout,
            },
            passes: 0,
            released: false,
        };
        panel.show("initializing..");
        Ok(panel)
    }

    pub fn sensors(&self) -> &[SensorState] {
        &self.sensors
    }

    pub fn sensor(&self, key: &str) -> Option<&SensorState> {
        self.sensors.iter().find(|s| s.descriptor.key == key)
    }

    /// Completed passes over the whole sensor list.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run the update cycle once for every sensor, in order.
    pub async fn run_pass(&mut self) {
        for state in &mut self.sensors {
            cycle::run_cycle(state, &mut self.devices, self.timing).await;
        }
        self.passes += 1;
    }

    /// Cycle the sensors until `shutdown` resolves, then release the devices.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.show("running..");
        info!(
            sensors = self.sensors.len(),
            interval = %format_duration(self.timing.polling_interval),
            "Panel running"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(passes = self.passes, "Shutdown requested");
                    break;
                }
                _ = self.run_pass() => {}
            }
        }

        self.release();
    }

    /// Light each band in turn, then sound the buzzer, `step` apart.
    pub async fn self_test(&mut self, step: Duration) {
        info!("Running self test");
        self.show("self test..");
        for band in SeverityBand::ALL {
            self.devices.indicator.clear();
            self.devices.indicator.light(band);
            sleep(step).await;
        }
        self.devices.indicator.clear();

        self.devices.buzzer.start();
        sleep(step).await;
        self.devices.buzzer.stop();
    }

    /// Clear the indicator and release every device. Safe to call twice.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let devices = &mut self.devices;
        devices.indicator.clear();
        devices.buzzer.stop();
        devices.buzzer.destroy();
        if let Err(e) = devices.display.clear() {
            debug!(error = %e, "Failed to clear display");
        }
        if let Err(e) = devices.display.destroy() {
            warn!(error = %e, "Failed to release display");
        }
        if let Some(log) = devices.log.as_mut() {
            if let Err(e) = log.close() {
                warn!(error = %e, "Failed to close sensor log");
            }
        }
        info!("Panel released");
    }

    fn show(&mut self, text: &str) {
        if let Err(e) = self.devices.display.display(text, None) {
            warn!(error = %e, "Display update failed");
        }
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.release();
    }
}
