use crate::error::ExporterResult;
use gaia_core::{EventResult, Status};
use prometheus::{
    exponential_buckets, Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Registry,
    TextEncoder,
};
use std::sync::Mutex;
use tracing::debug;

pub struct GaiaMetrics {
    registry: Registry,
    pub cycles_total: IntCounter,
    pub consciousness: Gauge,
    pub threat_mean: Gauge,
    pub emergence: Gauge,
    pub latency_avg_ms: Gauge,
    pub latency_p95_ms: Gauge,
    pub event_latency_ms: Histogram,
    // Highest cycle count already folded into `cycles_total`.
    counted_cycles: Mutex<u64>,
}

impl GaiaMetrics {
    pub fn new() -> ExporterResult<Self> {
        let registry = Registry::new();

        let cycles_total = IntCounter::new("gaia_cycles_total", "Events processed by the engine")?;
        let consciousness = Gauge::new("gaia_consciousness", "Smoothed consciousness score")?;
        let threat_mean = Gauge::new(
            "gaia_threat_mean",
            "Mean threat level over the retained window",
        )?;
        let emergence = Gauge::new("gaia_emergence", "Emergence score of the system")?;
        let latency_avg_ms = Gauge::new(
            "gaia_latency_avg_ms",
            "Mean scoring latency over the latency window in milliseconds",
        )?;
        let latency_p95_ms = Gauge::new(
            "gaia_latency_p95_ms",
            "95th percentile of scoring latency in milliseconds",
        )?;
        let event_latency_ms = Histogram::with_opts(
            HistogramOpts::new(
                "gaia_event_latency_ms",
                "Per-event scoring latency in milliseconds",
            )
            .buckets(exponential_buckets(0.001, 4.0, 10)?),
        )?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(consciousness.clone()))?;
        registry.register(Box::new(threat_mean.clone()))?;
        registry.register(Box::new(emergence.clone()))?;
        registry.register(Box::new(latency_avg_ms.clone()))?;
        registry.register(Box::new(latency_p95_ms.clone()))?;
        registry.register(Box::new(event_latency_ms.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            consciousness,
            threat_mean,
            emergence,
            latency_avg_ms,
            latency_p95_ms,
            event_latency_ms,
            counted_cycles: Mutex::new(0),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Publishes a status snapshot. Nothing moves backwards: a snapshot older
    /// than one already published (concurrent handlers, or an engine reset)
    /// leaves the counter and the gauges untouched.
    pub fn observe_status(&self, status: &Status) {
        let mut counted = self
            .counted_cycles
            .lock()
            .expect("cycle counter state poisoned");
        if status.cycle_count < *counted {
            debug!(
                counted = *counted,
                observed = status.cycle_count,
                "stale status snapshot ignored"
            );
            return;
        }
        self.cycles_total.inc_by(status.cycle_count - *counted);
        *counted = status.cycle_count;

        self.consciousness.set(status.consciousness);
        self.threat_mean.set(status.avg_threat);
        self.emergence.set(status.emergence);
        self.latency_avg_ms.set(status.avg_latency_ms);
        self.latency_p95_ms.set(status.latency_p95_ms);
    }

    pub fn observe_event(&self, result: &EventResult, status: &Status) {
        self.event_latency_ms.observe(result.latency_ms);
        self.observe_status(status);
    }

    /// Text exposition of every registered metric.
    pub fn snapshot(&self) -> ExporterResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}
