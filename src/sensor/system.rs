//! Built-in readers for Linux / Raspberry Pi system metrics.
//!
//! Load, uptime, host name and CPU temperature come from `sysinfo`; the
//! Raspberry Pi GPU temperature is only reported by `vcgencmd`.

use std::process::Command;

use sysinfo::{Components, System};

use super::ReadError;

/// Labels of the thermal sensor that tracks the CPU, most specific first.
const CPU_LABELS: [&str; 4] = ["cpu", "soc", "package", "coretemp"];

/// CPU temperature in degrees Celsius.
pub fn cpu_temp() -> Result<Option<f64>, ReadError> {
    let components = Components::new_with_refreshed_list();
    let readings = components.list().iter().map(|c| (c.label(), c.temperature()));
    pick_cpu_temperature(readings)
        .map(Some)
        .ok_or_else(|| ReadError::Failed("no CPU temperature sensor".to_string()))
}

/// GPU temperature in degrees Celsius, as reported by `vcgencmd`.
pub fn gpu_temp() -> Result<Option<f64>, ReadError> {
    let output = Command::new("vcgencmd").arg("measure_temp").output()?;
    if !output.status.success() {
        return Err(ReadError::Failed(format!("vcgencmd exited with {}", output.status)));
    }
    parse_vcgencmd_temp(&String::from_utf8_lossy(&output.stdout)).map(Some)
}

/// 1, 5 or 15 minute load average (`index` 0, 1 or 2).
pub fn load_average(index: usize) -> Result<Option<f64>, ReadError> {
    let load = System::load_average();
    let value = match index {
        0 => load.one,
        1 => load.five,
        2 => load.fifteen,
        _ => return Err(ReadError::Failed(format!("no load average {}", index))),
    };
    // Platforms without load averages report negative values
    Ok(Some(value).filter(|v| *v >= 0.0))
}

/// Seconds since boot.
pub fn uptime() -> Result<Option<f64>, ReadError> {
    Ok(Some(System::uptime() as f64))
}

/// Host name of the machine, or `"localhost"` when it cannot be read.
pub fn hostname() -> String {
    System::host_name()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// The temperature of the first component whose label names the CPU,
/// falling back to the first component with a temperature at all.
fn pick_cpu_temperature<'a>(
    readings: impl IntoIterator<Item = (&'a str, Option<f32>)>,
) -> Option<f64> {
    let readings: Vec<(String, f32)> = readings
        .into_iter()
        .filter_map(|(label, t)| t.filter(|t| t.is_finite()).map(|t| (label.to_lowercase(), t)))
        .collect();

    CPU_LABELS
        .iter()
        .find_map(|wanted| readings.iter().find(|(label, _)| label.contains(wanted)))
        .or_else(|| readings.first())
        .map(|(_, t)| f64::from(*t))
}

fn parse_number(s: &str) -> Result<f64, ReadError> {
    s.trim().parse::<f64>().map_err(|e| ReadError::Parse(format!("'{}': {}", s.trim(), e)))
}

/// `vcgencmd measure_temp` prints `temp=48.3'C`.
fn parse_vcgencmd_temp(content: &str) -> Result<f64, ReadError> {
    let value = content
        .trim()
        .strip_prefix("temp=")
        .and_then(|rest| rest.split('\'').next())
        .ok_or_else(|| ReadError::Parse(content.trim().to_string()))?;
    parse_number(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vcgencmd_temp() {
        assert_eq!(parse_vcgencmd_temp("temp=48.3'C\n").unwrap(), 48.3);
        assert!(parse_vcgencmd_temp("error=1").is_err());
    }

    #[test]
    fn test_pick_cpu_temperature_prefers_cpu_label() {
        let readings = [
            ("nvme Composite", Some(38.0)),
            ("cpu_thermal temp1", Some(47.5)),
            ("acpitz temp1", Some(30.0)),
        ];
        assert_eq!(pick_cpu_temperature(readings), Some(47.5));
    }

    #[test]
    fn test_pick_cpu_temperature_falls_back_to_first_reading() {
        let readings = [("acpitz temp1", None), ("nvme Composite", Some(38.0))];
        assert_eq!(pick_cpu_temperature(readings), Some(38.0));
        assert_eq!(pick_cpu_temperature([("cpu", Some(f32::NAN))]), None);
        assert_eq!(pick_cpu_temperature(Vec::<(&str, Option<f32>)>::new()), None);
    }

    #[test]
    fn test_load_average_rejects_unknown_window() {
        assert!(load_average(3).is_err());
        assert!(load_average(0).is_ok());
    }

    #[test]
    fn test_hostname_never_empty() {
        assert!(!hostname().is_empty());
    }
}
