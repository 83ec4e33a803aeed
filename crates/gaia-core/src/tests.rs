use crate::scoring::{self, clamp01};
use crate::{BoundedHistory, Config, ConfigError, MetricPoint, Sample, ScoringEngine};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

fn scenario_config() -> Config {
    Config {
        history_capacity: 100,
        latency_window: 100,
        threat_sensitivity: 1.0,
        consciousness_smoothing: 0.8,
        initial_consciousness: 0.0,
        baseline: MetricPoint::new(0.5, 0.5, 0.1),
    }
}

fn engine_with(config: Config) -> ScoringEngine {
    ScoringEngine::new(config).expect("valid config")
}

#[test]
fn baseline_sample_has_zero_threat() {
    let engine = engine_with(scenario_config());
    let result = engine.process_event(&Sample::new(0.5, 0.5, 0.1));
    assert_eq!(result.threat_level, 0.0);
    assert_eq!(result.consciousness, 0.0);
    assert_eq!(result.cycle, 1);
}

#[test]
fn saturated_sample_raises_consciousness() {
    let engine = engine_with(scenario_config());
    let before = engine.status().consciousness;
    let result = engine.process_event(&Sample::new(1.0, 1.0, 1.0));

    // 0.4 * 0.5 + 0.4 * 0.5 + 0.2 * 0.9
    assert!((result.threat_level - 0.58).abs() < 1e-12);
    assert!(result.consciousness > before);
    // 0.2 * clamp01(0.58 * 1.5)
    assert!((result.consciousness - 0.174).abs() < 1e-12);
}

#[test]
fn history_keeps_most_recent_samples_in_order() {
    let config = scenario_config();
    let engine = engine_with(config.clone());

    let samples: Vec<Sample> = (0..150)
        .map(|i| {
            let x = i as f64 / 150.0;
            Sample::new(x, 1.0 - x, (x * 7.0) % 1.0)
        })
        .collect();
    let expected: Vec<f64> = samples
        .iter()
        .map(|s| {
            scoring::threat_level(
                &s.resolve(&config.baseline),
                &config.baseline,
                config.threat_sensitivity,
            )
        })
        .collect();

    for s in &samples {
        engine.process_event(s);
    }

    let history = engine.threat_history();
    assert_eq!(history.len(), 100);
    assert_eq!(history, expected[50..].to_vec());
    assert_eq!(engine.status().threats_count, 100);
}

#[test]
fn concurrent_events_are_not_lost() {
    let engine = Arc::new(engine_with(scenario_config()));
    let workers = 8;
    let per_worker = 125;

    let handles: Vec<_> = (0..workers)
        .map(|w| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..per_worker)
                    .map(|i| {
                        let x = ((w * per_worker + i) % 10) as f64 / 10.0;
                        engine.process_event(&Sample::new(x, x, x)).cycle
                    })
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut cycles: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("worker panicked"))
        .collect();
    cycles.sort_unstable();

    assert_eq!(engine.status().cycle_count, 1000);
    assert_eq!(cycles, (1..=1000).collect::<Vec<u64>>());
    assert_eq!(engine.status().threats_count, 100);
    assert_eq!(engine.status().latencies_count, 100);
}

#[test]
fn status_does_not_advance_cycle() {
    let engine = engine_with(scenario_config());
    engine.process_event(&Sample::new(0.9, 0.2, 0.4));
    let first = engine.status();
    let second = engine.status();
    assert_eq!(first, second);
    assert_eq!(second.cycle_count, 1);
    assert_eq!(engine.process_event(&Sample::default()).cycle, 2);
}

#[test]
fn reset_restores_initial_state_and_is_idempotent() {
    let config = Config {
        initial_consciousness: 0.25,
        ..scenario_config()
    };
    let engine = engine_with(config.clone());
    let fresh = engine.status();
    for i in 0..20 {
        engine.process_event(&Sample::new(i as f64 / 20.0, 0.9, 0.0));
    }

    engine.reset();
    let once = engine.status();
    engine.reset();
    let twice = engine.status();

    assert_eq!(once, fresh);
    assert_eq!(twice, once);
    assert_eq!(once.consciousness, 0.25);
    assert!(engine.threat_history().is_empty());
    assert!(engine.latency_history().is_empty());
    assert_eq!(engine.process_event(&Sample::default()).cycle, 1);
}

#[test]
fn identical_inputs_give_identical_trajectories() {
    let samples: Vec<Sample> = (0..300)
        .map(|i| {
            let t = i as f64;
            Sample::new((t * 0.37).sin().abs(), (t * 0.11).cos().abs(), (t * 0.05) % 1.0)
        })
        .collect();

    let run = || {
        let engine = engine_with(scenario_config());
        samples
            .iter()
            .map(|s| engine.process_event(s).consciousness)
            .collect::<Vec<f64>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn noisy_threat_outpaces_flat_threat() {
    let config = Config {
        threat_sensitivity: 2.0,
        ..scenario_config()
    };
    let flat = engine_with(config.clone());
    let noisy = engine_with(config);

    // Threat 0.4 every step versus alternating 0.8 / 0.0: same mean, more variance.
    for i in 0..20 {
        flat.process_event(&Sample::new(0.75, 0.5, 0.1));
        let x = if i % 2 == 0 { 1.0 } else { 0.5 };
        noisy.process_event(&Sample::new(x, 0.5, 0.1));
    }

    let flat = flat.status();
    let noisy = noisy.status();
    assert!((flat.avg_threat - noisy.avg_threat).abs() < 1e-12);
    assert!(noisy.consciousness > flat.consciousness);
}

#[test]
fn emergence_combines_consciousness_and_sustained_threat() {
    let engine = engine_with(scenario_config());
    for _ in 0..5 {
        engine.process_event(&Sample::new(1.0, 0.0, 0.1));
    }
    let result = engine.process_event(&Sample::new(0.8, 0.3, 0.6));
    let status = engine.status();

    let expected = result.consciousness * (1.0 - status.avg_threat);
    assert!((result.emergence - expected).abs() < 1e-12);
    assert_eq!(status.emergence, result.emergence);
}

#[test]
fn missing_and_invalid_fields_fall_back_to_baseline() {
    let baseline = MetricPoint::new(0.5, 0.5, 0.1);
    let sample = Sample {
        cpu: None,
        memory: Some(f64::NAN),
        network: Some(7.5),
    };
    let point = sample.resolve(&baseline);
    assert_eq!(point, MetricPoint::new(0.5, 0.5, 1.0));

    let below = Sample::new(-3.0, -0.1, f64::NEG_INFINITY).resolve(&baseline);
    assert_eq!(below, MetricPoint::new(0.0, 0.0, 0.0));

    let engine = engine_with(scenario_config());
    assert_eq!(engine.process_event(&Sample::default()).threat_level, 0.0);
}

#[test]
fn sample_merge_prefers_own_fields() {
    let query = Sample {
        cpu: Some(0.9),
        memory: None,
        network: Some(0.2),
    };
    let body = Sample {
        cpu: Some(0.1),
        memory: Some(0.3),
        network: None,
    };
    let merged = body.or(query);
    assert_eq!(merged, Sample::new(0.1, 0.3, 0.2));
}

#[test]
fn sample_deserializes_with_missing_fields() {
    let sample: Sample = serde_json::from_str(r#"{"cpu": 0.7}"#).expect("parse sample");
    assert_eq!(sample.cpu, Some(0.7));
    assert_eq!(sample.memory, None);
    assert_eq!(sample.network, None);
}

#[test]
fn bounded_history_evicts_oldest() {
    let mut h = BoundedHistory::new(3);
    assert_eq!(h.push(1.0), None);
    assert_eq!(h.push(2.0), None);
    assert_eq!(h.push(3.0), None);
    assert_eq!(h.push(4.0), Some(1.0));
    assert_eq!(h.len(), 3);
    assert_eq!(h.to_vec(), vec![2.0, 3.0, 4.0]);
    assert_eq!(h.last(), Some(4.0));
    h.clear();
    assert!(h.is_empty());
    assert_eq!(h.capacity(), 3);
}

#[test]
fn bounded_history_statistics() {
    let mut h = BoundedHistory::new(10);
    assert_eq!(h.mean(), 0.0);
    assert_eq!(h.variance(), 0.0);
    assert_eq!(h.percentile(95.0), 0.0);

    for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
        h.push(v);
    }
    assert_eq!(h.mean(), 5.0);
    assert_eq!(h.variance(), 4.0);
    assert_eq!(h.min(), 2.0);
    assert_eq!(h.max(), 9.0);
    assert_eq!(h.percentile(50.0), 4.0);
    assert_eq!(h.percentile(95.0), 9.0);
    assert_eq!(h.percentile(0.0), 2.0);
}

#[test]
fn zero_capacity_history_holds_one_sample() {
    let mut h = BoundedHistory::new(0);
    h.push(0.3);
    h.push(0.6);
    assert_eq!(h.to_vec(), vec![0.6]);
}

#[test]
fn config_rejects_out_of_range_values() {
    let zero = Config {
        history_capacity: 0,
        ..Config::default()
    };
    assert!(matches!(
        zero.validate(),
        Err(ConfigError::ZeroCapacity {
            field: "history_capacity"
        })
    ));

    let zero_latency = Config {
        latency_window: 0,
        ..Config::default()
    };
    assert!(matches!(
        ScoringEngine::new(zero_latency),
        Err(ConfigError::ZeroCapacity {
            field: "latency_window"
        })
    ));

    let hot = Config {
        threat_sensitivity: 2.5,
        ..Config::default()
    };
    assert!(matches!(
        hot.validate(),
        Err(ConfigError::OutOfRange {
            field: "threat_sensitivity",
            ..
        })
    ));

    let nan = Config {
        consciousness_smoothing: f64::NAN,
        ..Config::default()
    };
    assert!(nan.validate().is_err());

    let baseline = Config {
        baseline: MetricPoint::new(0.5, 1.2, 0.1),
        ..Config::default()
    };
    assert!(matches!(
        baseline.validate(),
        Err(ConfigError::OutOfRange {
            field: "baseline.memory",
            ..
        })
    ));

    assert!(Config::default().validate().is_ok());
}

#[test]
fn config_parses_partial_json() {
    let config = Config::from_json_str(
        r#"{"history_capacity": 32, "baseline": {"cpu": 0.2, "memory": 0.3, "network": 0.0}}"#,
    )
    .expect("parse config");
    assert_eq!(config.history_capacity, 32);
    assert_eq!(config.latency_window, 100);
    assert_eq!(config.baseline, MetricPoint::new(0.2, 0.3, 0.0));

    assert!(matches!(
        Config::from_json_str(r#"{"threat_sensitivity": -1.0}"#),
        Err(ConfigError::OutOfRange { .. })
    ));
    assert!(matches!(
        Config::from_json_str("not json"),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn config_load_reports_missing_file() {
    let err = Config::load("/nonexistent/gaia-config.json").unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn clamp01_maps_nan_to_zero() {
    assert_eq!(clamp01(f64::NAN), 0.0);
    assert_eq!(clamp01(-1.0), 0.0);
    assert_eq!(clamp01(1.5), 1.0);
    assert_eq!(clamp01(0.3), 0.3);
}

fn arb_field() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(f64::NAN)),
        (-5.0f64..5.0).prop_map(Some),
    ]
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    (arb_field(), arb_field(), arb_field()).prop_map(|(cpu, memory, network)| Sample {
        cpu,
        memory,
        network,
    })
}

proptest! {
    #[test]
    fn scores_stay_in_unit_interval(
        samples in proptest::collection::vec(arb_sample(), 1..200),
        sensitivity in 0.0f64..=2.0,
        smoothing in 0.0f64..=1.0,
        initial in 0.0f64..=1.0,
        capacity in 1usize..40,
        window in 1usize..40,
    ) {
        let engine = engine_with(Config {
            history_capacity: capacity,
            latency_window: window,
            threat_sensitivity: sensitivity,
            consciousness_smoothing: smoothing,
            initial_consciousness: initial,
            baseline: MetricPoint::default(),
        });

        for (i, s) in samples.iter().enumerate() {
            let r = engine.process_event(s);
            prop_assert!((0.0..=1.0).contains(&r.threat_level));
            prop_assert!((0.0..=1.0).contains(&r.consciousness));
            prop_assert!((0.0..=1.0).contains(&r.emergence));
            prop_assert!(r.latency_ms >= 0.0);
            prop_assert_eq!(r.cycle, i as u64 + 1);

            let status = engine.status();
            prop_assert!(status.threats_count <= capacity);
            prop_assert!(status.latencies_count <= window);
        }
    }
}
