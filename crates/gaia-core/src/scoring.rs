//! Pure scoring functions. The engine composes these under its lock; nothing here
//! holds state or touches the clock.

use crate::config::MetricPoint;
use crate::history::BoundedHistory;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationWeights {
    pub w_cpu: f64,
    pub w_memory: f64,
    pub w_network: f64,
}

pub const DEVIATION_WEIGHTS: DeviationWeights = DeviationWeights {
    w_cpu: 0.4,
    w_memory: 0.4,
    w_network: 0.2,
};

/// Gain applied to `mean + variance` before smoothing.
pub const RAW_CONSCIOUSNESS_GAIN: f64 = 1.5;

/// Clamps to `[0, 1]`, mapping NaN to `0.0`.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Weighted absolute deviation of `point` from `baseline`, scaled by `sensitivity`.
pub fn threat_level(point: &MetricPoint, baseline: &MetricPoint, sensitivity: f64) -> f64 {
    let w = DEVIATION_WEIGHTS;
    let deviation = w.w_cpu * (point.cpu - baseline.cpu).abs()
        + w.w_memory * (point.memory - baseline.memory).abs()
        + w.w_network * (point.network - baseline.network).abs();
    clamp01(sensitivity * deviation)
}

/// Unsmoothed consciousness over the whole retained threat window.
pub fn raw_consciousness(threats: &BoundedHistory) -> f64 {
    clamp01((threats.mean() + threats.variance()) * RAW_CONSCIOUSNESS_GAIN)
}

/// Exponential smoothing step: `smoothing` is the weight of `previous`.
pub fn smooth(previous: f64, raw: f64, smoothing: f64) -> f64 {
    clamp01(smoothing * previous + (1.0 - smoothing) * raw)
}

pub fn emergence(consciousness: f64, avg_threat: f64) -> f64 {
    clamp01(consciousness * (1.0 - avg_threat))
}
