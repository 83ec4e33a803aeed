//! Offline modes: a quick self-check and a synthetic-load benchmark.

use gaia_core::{Sample, ScoringEngine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
}

impl From<bool> for CheckStatus {
    fn from(ok: bool) -> Self {
        if ok {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub status: CheckStatus,
    #[serde(flatten)]
    pub detail: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfTestReport {
    pub mode: &'static str,
    pub status: &'static str,
    pub tests: Vec<CheckOutcome>,
    pub summary: CheckSummary,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.summary.failed == 0
    }
}

pub fn run_self_test(engine: &ScoringEngine) -> SelfTestReport {
    let mut tests = Vec::with_capacity(3);

    let before = engine.status().cycle_count;
    let response = engine.process_event(&Sample::new(0.5, 0.3, 0.1));
    let processed =
        response.cycle == before + 1 && (0.0..=1.0).contains(&response.threat_level);
    tests.push(CheckOutcome {
        name: "basic_event_processing",
        status: processed.into(),
        detail: json!({ "response": response }),
    });

    let status = engine.status();
    tests.push(CheckOutcome {
        name: "consciousness_bounds",
        status: (0.0..=1.0).contains(&status.consciousness).into(),
        detail: json!({ "consciousness": status.consciousness }),
    });

    tests.push(CheckOutcome {
        name: "metrics_collection",
        status: (status.threats_count > 0 && status.latencies_count > 0).into(),
        detail: json!({
            "threats_collected": status.threats_count,
            "latencies_collected": status.latencies_count,
        }),
    });

    let passed = tests
        .iter()
        .filter(|t| t.status == CheckStatus::Passed)
        .count();
    let summary = CheckSummary {
        total_tests: tests.len(),
        passed,
        failed: tests.len() - passed,
    };

    SelfTestReport {
        mode: "test",
        status: if summary.failed == 0 {
            "success"
        } else {
            "failure"
        },
        tests,
        summary,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub mode: &'static str,
    pub cycles: u64,
    pub status: &'static str,
    pub seed: Option<u64>,
    pub total_time_seconds: f64,
    pub cycles_per_second: f64,
    pub average_latency_ms: f64,
    pub latency_p95_ms: f64,
    pub final_consciousness: f64,
    pub total_threats_processed: u64,
    pub peak_threat: f64,
    pub min_threat: f64,
}

/// Feeds `cycles` uniformly random samples through the engine. Randomness stays
/// in the harness; the engine itself is deterministic.
pub fn run_benchmark(engine: &ScoringEngine, cycles: u64, seed: Option<u64>) -> BenchmarkReport {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut peak_threat = f64::MIN;
    let mut min_threat = f64::MAX;
    let started = Instant::now();
    for _ in 0..cycles {
        let sample = Sample::new(
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
        );
        let result = engine.process_event(&sample);
        peak_threat = peak_threat.max(result.threat_level);
        min_threat = min_threat.min(result.threat_level);
    }
    let total_time_seconds = started.elapsed().as_secs_f64();

    if cycles == 0 {
        peak_threat = 0.0;
        min_threat = 0.0;
    }

    let status = engine.status();
    BenchmarkReport {
        mode: "benchmark",
        cycles,
        status: "completed",
        seed,
        total_time_seconds,
        cycles_per_second: if total_time_seconds > 0.0 {
            cycles as f64 / total_time_seconds
        } else {
            0.0
        },
        average_latency_ms: status.avg_latency_ms,
        latency_p95_ms: status.latency_p95_ms,
        final_consciousness: status.consciousness,
        total_threats_processed: cycles,
        peak_threat,
        min_threat,
    }
}
