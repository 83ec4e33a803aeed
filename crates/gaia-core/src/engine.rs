use crate::config::Config;
use crate::error::ConfigResult;
use crate::history::BoundedHistory;
use crate::sample::Sample;
use crate::scoring;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, trace};

/// Outcome of one `process_event` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventResult {
    pub cycle: u64,
    pub threat_level: f64,
    pub consciousness: f64,
    pub latency_ms: f64,
    pub emergence: f64,
}

/// Read-only snapshot of the engine, taken under the state lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub cycle_count: u64,
    pub consciousness: f64,
    pub avg_threat: f64,
    pub avg_latency_ms: f64,
    pub threats_count: usize,
    pub latencies_count: usize,
    pub peak_threat: f64,
    pub min_threat: f64,
    pub latency_p95_ms: f64,
    pub emergence: f64,
    pub last_event_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct EngineState {
    cycle_count: u64,
    consciousness: f64,
    emergence: f64,
    threat_history: BoundedHistory,
    latency_history: BoundedHistory,
    last_event_time: Option<DateTime<Utc>>,
}

impl EngineState {
    fn initial(config: &Config) -> Self {
        Self {
            cycle_count: 0,
            consciousness: config.initial_consciousness,
            emergence: 0.0,
            threat_history: BoundedHistory::new(config.history_capacity),
            latency_history: BoundedHistory::new(config.latency_window),
            last_event_time: None,
        }
    }
}

/// Stateful scorer shared between concurrent callers, usually behind an `Arc`.
///
/// Every public operation takes the same lock, so callers only ever observe
/// state between whole events.
#[derive(Debug)]
pub struct ScoringEngine {
    config: Config,
    state: Mutex<EngineState>,
}

impl ScoringEngine {
    pub fn new(config: Config) -> ConfigResult<Self> {
        config.validate()?;
        debug!(
            history_capacity = config.history_capacity,
            latency_window = config.latency_window,
            sensitivity = config.threat_sensitivity,
            smoothing = config.consciousness_smoothing,
            "scoring engine configured"
        );
        let state = Mutex::new(EngineState::initial(&config));
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn process_event(&self, sample: &Sample) -> EventResult {
        let point = sample.resolve(&self.config.baseline);
        let mut state = self.lock();

        let started = Instant::now();
        let threat_level =
            scoring::threat_level(&point, &self.config.baseline, self.config.threat_sensitivity);
        state.threat_history.push(threat_level);

        let raw = scoring::raw_consciousness(&state.threat_history);
        state.consciousness =
            scoring::smooth(state.consciousness, raw, self.config.consciousness_smoothing);

        let emergence = scoring::emergence(state.consciousness, state.threat_history.mean());
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        state.latency_history.push(latency_ms);

        state.emergence = emergence;
        state.cycle_count += 1;
        state.last_event_time = Some(Utc::now());
        debug_assert!((0.0..=1.0).contains(&state.consciousness));
        debug_assert!(state.threat_history.len() <= self.config.history_capacity);
        debug_assert!(state.latency_history.len() <= self.config.latency_window);

        let result = EventResult {
            cycle: state.cycle_count,
            threat_level,
            consciousness: state.consciousness,
            latency_ms,
            emergence,
        };
        drop(state);

        trace!(
            cycle = result.cycle,
            threat = result.threat_level,
            consciousness = result.consciousness,
            "event scored"
        );
        result
    }

    pub fn status(&self) -> Status {
        let state = self.lock();
        Status {
            cycle_count: state.cycle_count,
            consciousness: state.consciousness,
            avg_threat: state.threat_history.mean(),
            avg_latency_ms: state.latency_history.mean(),
            threats_count: state.threat_history.len(),
            latencies_count: state.latency_history.len(),
            peak_threat: state.threat_history.max(),
            min_threat: state.threat_history.min(),
            latency_p95_ms: state.latency_history.percentile(95.0),
            emergence: state.emergence,
            last_event_time: state.last_event_time,
        }
    }

    /// Returns the engine to its construction-time state. Test setup only.
    pub fn reset(&self) {
        *self.lock() = EngineState::initial(&self.config);
        debug!("scoring engine reset");
    }

    /// Retained threat levels, oldest first.
    pub fn threat_history(&self) -> Vec<f64> {
        self.lock().threat_history.to_vec()
    }

    /// Retained latencies in milliseconds, oldest first.
    pub fn latency_history(&self) -> Vec<f64> {
        self.lock().latency_history.to_vec()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // A poisoned lock means a scoring step panicked half way; the state is
        // no longer trustworthy.
        self.state.lock().expect("scoring engine state poisoned")
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        let config = Config::default();
        let state = Mutex::new(EngineState::initial(&config));
        Self { config, state }
    }
}
