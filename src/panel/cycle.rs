//! One sensor's turn on the panel.
//!
//! For `repeat_count` ticks: read every value, extend the trace, refresh the
//! display, relight the indicator and feed the notifier, then sleep one
//! polling interval. After the dwell, log the last complete reading.

use std::fmt;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::SensorState;
use crate::alert::{Evaluation, NotificationKind};
use crate::data::{classify, SeverityBand};
use crate::device::Devices;
use crate::sensor::{ReadError, ReadFn};

/// Timing shared by every cycle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timing {
    pub polling_interval: Duration,
    pub read_timeout: Duration,
}

type ReadResult = Result<Option<f64>, ReadError>;

/// A reader run on the blocking pool, with at most one read in flight.
///
/// A read that overruns its limit is abandoned but remembered. Until it
/// finishes, further reads fail at once instead of piling more threads onto
/// a stuck device.
pub(crate) struct BoundedReader {
    name: String,
    read: ReadFn,
    pending: Option<JoinHandle<ReadResult>>,
}

impl fmt::Debug for BoundedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedReader")
            .field("name", &self.name)
            .field("stuck", &self.is_stuck())
            .finish()
    }
}

impl BoundedReader {
    pub(crate) fn new(name: impl Into<String>, read: ReadFn) -> Self {
        Self {
            name: name.into(),
            read,
            pending: None,
        }
    }

    /// Whether an abandoned read is still running.
    pub(crate) fn is_stuck(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Read once, bounded by `limit`. Non-finite values are "no reading".
    pub(crate) async fn read(&mut self, limit: Duration) -> ReadResult {
        if self.is_stuck() {
            return Err(ReadError::Timeout(limit));
        }
        if self.pending.take().is_some() {
            debug!(reader = %self.name, "Abandoned read finished, discarding its result");
        }

        let read = self.read.clone();
        let mut task = tokio::task::spawn_blocking(move || read());
        match timeout(limit, &mut task).await {
            Err(_) => {
                self.pending = Some(task);
                Err(ReadError::Timeout(limit))
            }
            Ok(Err(join)) => Err(ReadError::Aborted(join.to_string())),
            Ok(Ok(result)) => result.map(|value| value.filter(|v| v.is_finite())),
        }
    }
}

/// Read the whole tuple. The first failing reader fails the tuple.
pub(crate) async fn read_all(
    readers: &mut [BoundedReader],
    limit: Duration,
) -> Result<Vec<Option<f64>>, ReadError> {
    let mut values = Vec::with_capacity(readers.len());
    for reader in readers {
        values.push(reader.read(limit).await?);
    }
    Ok(values)
}

/// Run a sensor's full dwell.
pub(crate) async fn run_cycle(state: &mut SensorState, devices: &mut Devices, timing: Timing) {
    let mut values = Vec::new();
    for _ in 0..state.descriptor.flags.repeat_count.max(1) {
        values = tick(state, devices, timing.read_timeout).await;
        sleep(timing.polling_interval).await;
    }

    let descriptor = &state.descriptor;
    if descriptor.flags.log_enabled {
        let complete: Option<Vec<f64>> = values.iter().copied().collect();
        match (complete, devices.log.as_mut()) {
            (Some(values), Some(log)) if !values.is_empty() => {
                if let Err(e) = log.write(&descriptor.key, &values, &descriptor.formats) {
                    warn!(sensor = %descriptor.key, error = %e, "Failed to write sensor log");
                }
            }
            (None, Some(_)) => debug!(sensor = %descriptor.key, "Incomplete reading not logged"),
            _ => {}
        }
    }

    devices.indicator.clear();
}

/// One polling tick. Returns the reading tuple, all `None` on error.
async fn tick(state: &mut SensorState, devices: &mut Devices, read_timeout: Duration) -> Vec<Option<f64>> {
    let values = match read_all(&mut state.readers, read_timeout).await {
        Ok(values) => values,
        Err(e) => {
            let descriptor = &state.descriptor;
            warn!(sensor = %descriptor.key, error = %e, "Sensor read failed");
            let values = vec![None; descriptor.readers.len()];
            light(&mut state.band, devices, SeverityBand::Critical);
            if descriptor.flags.display_enabled {
                show(devices, &descriptor.key, &descriptor.display_text(&values), None);
            }
            state.last = values.clone();
            return values;
        }
    };

    let descriptor = &state.descriptor;
    let flags = &descriptor.flags;
    let preferred = values.get(descriptor.preferred_index).copied().flatten();

    if flags.trace_enabled {
        if let Some(v) = preferred {
            state.trace.push(v);
        }
    }

    if flags.display_enabled {
        let trace = flags.trace_enabled.then(|| state.trace.values());
        show(devices, &descriptor.key, &descriptor.display_text(&values), trace.as_deref());
    }

    match preferred {
        None => {
            debug!(sensor = %descriptor.key, "No reading");
            light(&mut state.band, devices, SeverityBand::Critical);
        }
        Some(v) => {
            if let Some((t1, t2)) = descriptor.band_limits() {
                light(&mut state.band, devices, classify(v, t1, t2));
            }
            if let Some(notifier) = state.notifier.as_mut() {
                let evaluation = notifier.test_threshold(v);
                apply(&state.descriptor.key, state.descriptor.flags.buzz_on_alarm, evaluation, devices);
            }
        }
    }

    state.last = values.clone();
    values
}

fn light(lit: &mut Option<SeverityBand>, devices: &mut Devices, band: SeverityBand) {
    devices.indicator.clear();
    devices.indicator.light(band);
    *lit = Some(band);
}

fn show(devices: &mut Devices, key: &str, text: &str, trace: Option<&[f64]>) {
    if let Err(e) = devices.display.display(text, trace) {
        warn!(sensor = %key, error = %e, "Display update failed");
    }
}

/// Drive the buzzer and deliver any notification.
///
/// Delivery failures are logged only; the notifier has already moved on.
fn apply(key: &str, buzz_on_alarm: bool, evaluation: Evaluation, devices: &mut Devices) {
    if buzz_on_alarm {
        if evaluation.buzz {
            devices.buzzer.start();
        } else {
            devices.buzzer.stop();
        }
    }

    let Some(notification) = evaluation.notification else {
        return;
    };
    match notification.kind {
        NotificationKind::Alarm => warn!(sensor = %key, "{}", notification.message),
        NotificationKind::Cleared => info!(sensor = %key, "{}", notification.message),
    }
    if let Err(e) = devices.sink.send(&notification.message, &notification.title) {
        warn!(
            sensor = %key,
            sink = devices.sink.description(),
            error = %e,
            "Notification delivery failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reader<F>(f: F) -> BoundedReader
    where
        F: Fn() -> Result<Option<f64>, ReadError> + Send + Sync + 'static,
    {
        BoundedReader::new("test", Arc::new(f))
    }

    #[tokio::test]
    async fn test_read_passes_value_through() {
        let mut read = reader(|| Ok(Some(21.5)));
        assert_eq!(read.read(Duration::from_secs(1)).await.unwrap(), Some(21.5));
    }

    #[tokio::test]
    async fn test_read_drops_non_finite() {
        let mut read = reader(|| Ok(Some(f64::NAN)));
        assert_eq!(read.read(Duration::from_secs(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_times_out() {
        let mut read = reader(|| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Some(1.0))
        });
        let err = read.read(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, ReadError::Timeout(_)));
        assert!(read.is_stuck());
    }

    #[tokio::test]
    async fn test_stuck_read_is_not_started_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut read = reader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            Ok(Some(1.0))
        });

        for _ in 0..5 {
            let err = read.read(Duration::from_millis(10)).await.unwrap_err();
            assert!(matches!(err, ReadError::Timeout(_)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_resumes_once_abandoned_read_finishes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut read = reader(move || {
            // Only the first read is slow
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                std::thread::sleep(Duration::from_millis(100));
            }
            Ok(Some(2.0))
        });

        assert!(read.read(Duration::from_millis(10)).await.is_err());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!read.is_stuck());
        assert_eq!(read.read(Duration::from_secs(1)).await.unwrap(), Some(2.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_catches_panic() {
        let mut read = reader(|| panic!("driver bug"));
        let err = read.read(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ReadError::Aborted(_)));
        assert!(!read.is_stuck());
    }

    #[tokio::test]
    async fn test_read_all_fails_on_first_error() {
        let mut readers = vec![
            reader(|| Ok(Some(1.0))),
            reader(|| Err(ReadError::Failed("bus error".to_string()))),
            reader(|| Ok(None)),
        ];
        assert!(read_all(&mut readers, Duration::from_secs(1)).await.is_err());
        assert_eq!(
            read_all(&mut readers[..1], Duration::from_secs(1)).await.unwrap(),
            vec![Some(1.0)]
        );
    }
}
