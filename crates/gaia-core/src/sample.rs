use crate::config::MetricPoint;
use serde::{Deserialize, Serialize};

/// Inbound metric sample. Any field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sample {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub network: Option<f64>,
}

impl Sample {
    pub fn new(cpu: f64, memory: f64, network: f64) -> Self {
        Self {
            cpu: Some(cpu),
            memory: Some(memory),
            network: Some(network),
        }
    }

    /// Fields present in `self` win; the rest come from `fallback`.
    pub fn or(self, fallback: Sample) -> Self {
        Self {
            cpu: self.cpu.or(fallback.cpu),
            memory: self.memory.or(fallback.memory),
            network: self.network.or(fallback.network),
        }
    }

    /// Fills missing or NaN fields from `baseline` and clamps everything to `[0, 1]`.
    pub fn resolve(&self, baseline: &MetricPoint) -> MetricPoint {
        MetricPoint {
            cpu: resolve_field(self.cpu, baseline.cpu),
            memory: resolve_field(self.memory, baseline.memory),
            network: resolve_field(self.network, baseline.network),
        }
    }
}

impl From<MetricPoint> for Sample {
    fn from(p: MetricPoint) -> Self {
        Self::new(p.cpu, p.memory, p.network)
    }
}

fn resolve_field(value: Option<f64>, base: f64) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v.clamp(0.0, 1.0),
        _ => base,
    }
}
