use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One reading of the three tracked utilization channels, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub cpu: f64,
    pub memory: f64,
    pub network: f64,
}

impl MetricPoint {
    pub const fn new(cpu: f64, memory: f64, network: f64) -> Self {
        Self {
            cpu,
            memory,
            network,
        }
    }
}

impl Default for MetricPoint {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.1)
    }
}

/// Engine configuration. Fixed for the lifetime of a [`ScoringEngine`](crate::ScoringEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum retained threat samples.
    pub history_capacity: usize,
    /// Maximum retained latency samples.
    pub latency_window: usize,
    /// Multiplier on the weighted baseline deviation, in `[0, 2]`.
    pub threat_sensitivity: f64,
    /// Weight of the previous consciousness value, in `[0, 1]`.
    pub consciousness_smoothing: f64,
    /// Consciousness at construction and after `reset`.
    pub initial_consciousness: f64,
    pub baseline: MetricPoint,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            latency_window: 100,
            threat_sensitivity: 1.0,
            consciousness_smoothing: 0.8,
            initial_consciousness: 0.0,
            baseline: MetricPoint::default(),
        }
    }
}

impl Config {
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "history_capacity",
            });
        }
        if self.latency_window == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "latency_window",
            });
        }
        check_range("threat_sensitivity", self.threat_sensitivity, 0.0, 2.0)?;
        check_range(
            "consciousness_smoothing",
            self.consciousness_smoothing,
            0.0,
            1.0,
        )?;
        check_range(
            "initial_consciousness",
            self.initial_consciousness,
            0.0,
            1.0,
        )?;
        check_range("baseline.cpu", self.baseline.cpu, 0.0, 1.0)?;
        check_range("baseline.memory", self.baseline.memory, 0.0, 1.0)?;
        check_range("baseline.network", self.baseline.network, 0.0, 1.0)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ConfigResult<()> {
    // NaN fails both comparisons, so it has to be rejected explicitly.
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
