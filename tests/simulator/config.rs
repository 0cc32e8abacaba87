//! Configuration presets, JSON loading and telemetry reporting.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use crate::common::{init_tracing, scripted_sim, KEEP};
use fortress_netsim::telemetry::{CollectingObserver, ViolationKind, ViolationSeverity};
use fortress_netsim::{Destination, NetSimError, NetworkSimulator, SimulatorConfig};

#[test]
fn test_presets_build_expected_simulators() {
    let passthrough = NetworkSimulator::from_config(&SimulatorConfig::passthrough()).unwrap();
    assert!(!passthrough.is_active());
    assert_eq!(
        passthrough.capacity(),
        fortress_netsim::config::DEFAULT_CAPACITY
    );

    let poor = NetworkSimulator::from_config(&SimulatorConfig::poor_network()).unwrap();
    assert!(poor.is_active());
    assert_eq!(poor.latency_ms(), 50.0);
    assert_eq!(poor.jitter_ms(), 25.0);
    assert_eq!(poor.packet_loss_percent(), 10.0);
    assert_eq!(poor.duplicate_percent(), 5.0);
}

#[test]
fn test_from_config_rejects_zero_capacity() {
    let config = SimulatorConfig::builder().capacity(0).latency_ms(5.0).build();
    let err = NetworkSimulator::from_config(&config).unwrap_err();
    assert!(matches!(err, NetSimError::InvalidConfiguration { .. }));
    assert!(err.to_string().contains("capacity"));
}

#[test]
fn test_same_seed_same_traffic() {
    let config = SimulatorConfig::builder()
        .latency_ms(40.0)
        .jitter_ms(20.0)
        .packet_loss_percent(15.0)
        .duplicate_percent(10.0)
        .seed(123)
        .build();

    let run = |config: &SimulatorConfig| {
        let mut sim = NetworkSimulator::from_config(config).unwrap();
        let mut log = Vec::new();
        let mut now = config.initial_time;
        for i in 0..200u32 {
            sim.send_packet(Destination::new((i % 4) as usize), &i.to_le_bytes());
            now += 0.01;
            sim.advance_time(now);
            log.extend(sim.receive_packets(sim.capacity()));
        }
        (log, sim.stats())
    };

    let (first_log, first_stats) = run(&config);
    let (second_log, second_stats) = run(&config);
    assert_eq!(first_log, second_log);
    assert_eq!(first_stats, second_stats);

    let other = SimulatorConfig {
        seed: Some(124),
        ..config
    };
    let (third_log, _) = run(&other);
    assert_ne!(first_log, third_log);
}

#[test]
fn test_apply_config_switches_profiles() {
    let _guard = init_tracing();

    let mut sim = scripted_sim(16, vec![KEEP]);
    sim.apply_config(&SimulatorConfig::high_latency(200.0));
    assert!(sim.is_active());
    sim.send_packet(Destination::SERVER, b"slow");

    sim.apply_config(&SimulatorConfig::lossy(20.0));
    assert!(sim.is_active());
    assert_eq!(sim.latency_ms(), 0.0);
    assert_eq!(sim.pending_packets(), 1, "still active, nothing discarded");

    sim.apply_config(&SimulatorConfig::passthrough());
    assert!(!sim.is_active());
    assert_eq!(sim.pending_packets(), 0);
}

#[test]
fn test_observer_receives_setter_warnings() {
    let observer = Arc::new(CollectingObserver::new());
    let mut sim = scripted_sim(4, vec![KEEP]).with_observer(observer.clone());

    sim.set_jitter(-1.0);
    sim.set_duplicates(f64::NAN);
    sim.set_packet_loss(50.0);

    let violations = observer.violations();
    assert_eq!(violations.len(), 2);
    assert!(violations
        .iter()
        .all(|v| v.severity == ViolationSeverity::Warning && v.kind == ViolationKind::Configuration));
    assert_eq!(violations[0].context["field"], "jitter_ms");
    assert_eq!(violations[1].context["field"], "duplicate_percent");
    assert_eq!(violations[0].virtual_time, Some(0.0));

    // NaN is never equal to zero, so the simulator counts as active.
    assert!(sim.is_active());
}

#[test]
fn test_from_config_with_observer_reports_every_lint() {
    let observer = Arc::new(CollectingObserver::new());
    let config = SimulatorConfig::builder()
        .latency_ms(-5.0)
        .packet_loss_percent(120.0)
        .seed(8)
        .build();
    let sim = NetworkSimulator::from_config_with_observer(&config, observer.clone()).unwrap();

    assert_eq!(sim.packet_loss_percent(), 120.0);
    assert_eq!(
        observer.violations_of_kind(ViolationKind::Configuration).len(),
        config.lint().len()
    );
    assert_eq!(config.lint().len(), 2);
}

#[test]
fn test_infinite_jitter_at_send_reaches_observer() {
    init_tracing();
    let observer = Arc::new(CollectingObserver::new());
    let mut sim = scripted_sim(4, vec![KEEP]).with_observer(observer.clone());
    sim.set_jitter(f64::INFINITY);
    let before = observer.len();

    sim.send_packet(Destination::SERVER, b"x");

    let violations = observer.violations();
    assert_eq!(violations.len(), before + 1);
    let reported = &violations[before];
    assert_eq!(reported.severity, ViolationSeverity::Error);
    assert_eq!(reported.kind, ViolationKind::Configuration);

    // Sent without jitter, so it arrives as soon as time moves.
    sim.advance_time(0.01);
    let received = sim.receive_packets(4);
    assert_eq!(received.len(), 1);
}

#[cfg(feature = "json")]
#[test]
fn test_json_profile_drives_simulator() {
    let config = SimulatorConfig::from_json_str(
        r#"{ "capacity": 32, "latency_ms": 100.0, "seed": 1 }"#,
    )
    .unwrap();
    let mut sim = NetworkSimulator::from_config(&config).unwrap();
    assert_eq!(sim.capacity(), 32);

    sim.send_packet(Destination::SERVER, b"json");
    sim.advance_time(0.11);
    assert_eq!(sim.receive_packets(32).len(), 1);
}

#[cfg(feature = "json")]
#[test]
fn test_violation_serializes_to_json() {
    let observer = Arc::new(CollectingObserver::new());
    let mut sim = scripted_sim(4, vec![KEEP]).with_observer(observer.clone());
    sim.set_latency(-3.0);

    let json = observer.violations()[0].to_json().unwrap();
    assert!(json.contains(r#""kind":"configuration""#));
    assert!(json.contains(r#""field":"latency_ms""#));
}
