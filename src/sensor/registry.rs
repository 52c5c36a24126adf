//! Reader function registry.
//!
//! Sensor descriptors name their value sources ("cpu_temp", "load1", …).
//! Drivers register a function under each name at startup; the panel
//! resolves every descriptor against the registry once and keeps the
//! resolved handles for the life of the process.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{system, ReadError, SensorDescriptor};
use crate::config::ConfigError;

/// A value source. `Ok(None)` means "no reading this time".
pub type ReadFn = Arc<dyn Fn() -> Result<Option<f64>, ReadError> + Send + Sync>;

/// Name → reader function map.
///
/// # Example
///
/// ```
/// use sensor_panel::SensorRegistry;
///
/// let mut registry = SensorRegistry::new();
/// registry.register("constant", || Ok(Some(42.0)));
/// assert!(registry.get("constant").is_some());
/// ```
#[derive(Clone, Default)]
pub struct SensorRegistry {
    readers: BTreeMap<String, ReadFn>,
}

impl SensorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the built-in system readers.
    pub fn with_system_readers() -> Self {
        let mut registry = Self::new();
        registry.register("cpu_temp", system::cpu_temp);
        registry.register("gpu_temp", system::gpu_temp);
        registry.register("load1", || system::load_average(0));
        registry.register("load5", || system::load_average(1));
        registry.register("load15", || system::load_average(2));
        registry.register("uptime", system::uptime);
        registry
    }

    /// Register (or replace) a reader under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, reader: F)
    where
        F: Fn() -> Result<Option<f64>, ReadError> + Send + Sync + 'static,
    {
        self.readers.insert(name.into(), Arc::new(reader));
    }

    /// Look up a reader by name.
    pub fn get(&self, name: &str) -> Option<ReadFn> {
        self.readers.get(name).cloned()
    }

    /// Registered reader names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.readers.keys().map(String::as_str)
    }

    /// Resolve every reader a descriptor names, in tuple order.
    pub fn resolve(&self, descriptor: &SensorDescriptor) -> Result<Vec<ReadFn>, ConfigError> {
        descriptor
            .readers
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| ConfigError::UnknownReader {
                    key: descriptor.key.clone(),
                    reader: name.clone(),
                })
            })
            .collect()
    }
}

impl fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorRegistry").field("readers", &self.readers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::tests::descriptor;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = SensorRegistry::new();
        registry.register("fan", || Ok(Some(1200.0)));

        let d = descriptor("fan", 1000.0, &[1.5, 2.0]);
        let readers = registry.resolve(&d).unwrap();
        assert_eq!(readers.len(), 1);
        assert_eq!(readers[0]().unwrap(), Some(1200.0));
    }

    #[test]
    fn test_unknown_reader_is_config_error() {
        let registry = SensorRegistry::new();
        let d = descriptor("humidity", 40.0, &[1.5, 2.0]);
        let err = registry.resolve(&d).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownReader { ref reader, .. } if reader == "humidity"));
    }

    #[test]
    fn test_system_readers_registered() {
        let registry = SensorRegistry::with_system_readers();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["cpu_temp", "gpu_temp", "load1", "load15", "load5", "uptime"]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = SensorRegistry::new();
        registry.register("x", || Ok(Some(1.0)));
        registry.register("x", || Ok(None));
        assert_eq!(registry.get("x").unwrap()().unwrap(), None);
    }
}
