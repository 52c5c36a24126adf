//! Append-only reading log.
//!
//! One line per record:
//!
//! ```text
//! 2024-05-01 14:03:07, cpu, 48.3, 0.52
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::debug;

use super::{DeviceError, SensorLog};
use crate::config::FormatSpec;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render one log line, without the trailing newline.
pub fn format_record(
    timestamp: NaiveDateTime,
    key: &str,
    values: &[f64],
    formats: &[FormatSpec],
) -> String {
    let mut line = format!("{}, {}", timestamp.format(TIMESTAMP_FORMAT), key);
    for (i, value) in values.iter().enumerate() {
        let rendered = match formats.get(i) {
            Some(spec) => spec.format(*value),
            None => FormatSpec::default().format(*value),
        };
        line.push_str(", ");
        line.push_str(&rendered);
    }
    line
}

/// Appends records to a file, flushing after each line.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileLog {
    /// Open `path` for appending, creating it and its directory if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DeviceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Opened sensor log");
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SensorLog for FileLog {
    fn write(&mut self, key: &str, values: &[f64], formats: &[FormatSpec]) -> Result<(), DeviceError> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(DeviceError::Unavailable(format!("{} is closed", self.path.display())));
        };
        let line = format_record(Local::now().naive_local(), key, values, formats);
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    /// Flush and close the file.
    fn close(&mut self) -> Result<(), DeviceError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
