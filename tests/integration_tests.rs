//! Boundary scenarios for the packet-plane classification pipeline,
//! driven through the public `FlowPipeline` API only.

use std::rc::Rc;

use flowpath::clock::FakeClock;
use flowpath::config::EngineConfig;
use flowpath::flow::FlowKey;
use flowpath::path::Path;
use flowpath::pipeline::FlowPipeline;

// ============================================================================
// ALL UNIQUE KEYS, ONCE EACH
// ============================================================================

#[test]
fn all_unique_once_never_reuses_a_record() {
    let mut engine = FlowPipeline::with_clock(EngineConfig::default(), FakeClock::new(0.0));

    for k in 0..30_000u32 {
        let outcome = engine.process(FlowKey(k));
        assert_eq!(outcome.path, Path::Accelerated);
        assert!(outcome.admitted);
    }

    assert_eq!(engine.table().pool_index(), 30_000);
    assert_eq!(engine.statistics().total_packets(), 30_000);
    assert_eq!(engine.table().create_refusals(), 0);
}

// ============================================================================
// SINGLE KEY HAMMER
// ============================================================================

#[test]
fn single_key_hammer_admits_exactly_one_record() {
    let mut engine = FlowPipeline::with_clock(EngineConfig::default(), FakeClock::new(0.0));

    for _ in 0..20_000 {
        engine.process(FlowKey(77));
    }

    assert_eq!(engine.table().pool_index(), 1);
    assert_eq!(engine.statistics().total_packets(), 20_000);
}

// ============================================================================
// PRE-POPULATED HOT FLOW
// ============================================================================

#[test]
fn prepopulated_hot_flow_never_falls_back_to_slow() {
    let mut engine = FlowPipeline::with_clock(EngineConfig::default(), FakeClock::new(0.0));

    engine.load_known_flow(FlowKey(1));
    engine.load_known_flow(FlowKey(2));
    engine.load_known_flow(FlowKey(3));
    assert_eq!(engine.table().pool_index(), 3);

    for _ in 0..500 {
        let outcome = engine.process(FlowKey(1));
        assert_ne!(outcome.path, Path::Slow);
        assert!(outcome.admitted);
    }
}

// ============================================================================
// BURST TRIGGER
// ============================================================================

#[test]
fn burst_trigger_flags_active_on_sudden_spike() {
    let clock = Rc::new(FakeClock::new(0.0));
    let mut engine = FlowPipeline::with_clock(EngineConfig::default(), clock.clone());

    // 20 quiet seconds at a low, steady rate establish a baseline mean.
    for second in 0..20u64 {
        clock.set(second as f64);
        for k in 0..5u32 {
            engine.process(FlowKey(1_000_000 + second as u32 * 10 + k));
        }
    }
    assert!(!engine.aging().burst_active());

    // A sudden spike within a single second, well above twice the
    // established baseline, must flip the detector on.
    clock.set(20.0);
    for k in 0..250u32 {
        let outcome = engine.process(FlowKey(2_000_000 + k));
        if k == 249 {
            assert!(outcome.burst_active);
        }
    }
    assert!(engine.aging().burst_active());
    assert!(engine.aging().burst_rate() > 0.0);
}

// ============================================================================
// MEMORY PRESSURE / POOL EXHAUSTION
// ============================================================================

#[test]
fn memory_pressure_refuses_admission_once_pool_is_full() {
    let config = EngineConfig {
        pool_size: 100,
        ..EngineConfig::default()
    };
    let mut engine = FlowPipeline::with_clock(config, FakeClock::new(0.0));

    for k in 0..100u32 {
        let outcome = engine.process(FlowKey(k));
        assert!(outcome.admitted);
    }
    assert_eq!(engine.table().pool_index(), 100);

    for k in 100..150u32 {
        let outcome = engine.process(FlowKey(k));
        assert!(!outcome.admitted);
        // §4.8 rule 2: no flow record exists, so the new-flow rule still
        // applies even though admission was refused.
        assert!(matches!(outcome.path, Path::Accelerated | Path::Slow));
    }

    assert_eq!(engine.table().pool_index(), 100);
    assert!(engine.table().create_refusals() >= 50);
}

// ============================================================================
// AGING / DEMOTION OVER IDLE TIME
// ============================================================================

#[test]
fn aging_demotion_runs_lifecycle_sweep_and_reports_pressure() {
    let config = EngineConfig {
        pool_size: 2_000,
        lifecycle_scan_limit: 2_000,
    };
    let clock = FakeClock::new(0.0);
    let mut engine = FlowPipeline::with_clock(config, clock);

    for k in 0..1_500u32 {
        engine.process(FlowKey(k));
    }

    let report = engine.report(0, 1_500, 1_500);
    assert!(report.memory_utilization >= 0.0);
    assert!((0.0..=1.0).contains(&report.aging_pressure));
    assert_eq!(report.known_count, 0);
    assert_eq!(report.packet_count, 1_500);
}

// ============================================================================
// REPORT ASSEMBLY SANITY
// ============================================================================

#[test]
fn report_path_breakdown_sums_to_total_packets() {
    let mut engine = FlowPipeline::with_clock(EngineConfig::default(), FakeClock::new(0.0));

    for k in [1u32, 1, 1, 2, 2, 3, 4, 5, 1, 1] {
        engine.process(FlowKey(k));
    }

    let report = engine.report(0, 10, 10);
    let summed: u64 = report.path_breakdown.iter().map(|b| b.count).sum();
    assert_eq!(summed, 10);
}
