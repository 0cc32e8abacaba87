//! Delivery timing against the virtual clock.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use crate::common::{drain_until, init_tracing, scripted_sim, seeded_sim, KEEP};
use fortress_netsim::rng::ScriptedRng;
use fortress_netsim::{Destination, NetworkSimulator};

#[test]
fn test_packet_arrives_strictly_after_latency() {
    let _guard = init_tracing();

    let mut sim = NetworkSimulator::new(10, 0.0).unwrap();
    sim.set_latency(100.0);
    sim.send_packet(Destination::new(1), b"Hello, world!");

    sim.advance_time(0.10);
    assert_eq!(sim.receive_packets(10).len(), 0);

    sim.advance_time(0.11);
    let received = sim.receive_packets(10);
    assert_eq!(received.len(), 1);
    assert_eq!(received.payloads[0], b"Hello, world!");
    assert_eq!(received.destinations[0], Destination::new(1));

    // Nothing is delivered twice.
    assert!(sim.receive_packets(10).is_empty());
}

#[test]
fn test_delivery_is_relative_to_send_time() {
    let mut sim = scripted_sim(8, vec![KEEP]);
    sim.set_latency(50.0);

    sim.advance_time(10.0);
    sim.send_packet(Destination::SERVER, b"late");

    sim.advance_time(10.04);
    assert!(sim.receive_packets(8).is_empty());
    sim.advance_time(10.06);
    assert_eq!(sim.receive_packets(8).len(), 1);
}

#[test]
fn test_initial_time_is_respected() {
    let mut sim = NetworkSimulator::with_rng(4, 100.0, ScriptedRng::constant(KEEP)).unwrap();
    sim.set_latency(10.0);
    sim.send_packet(Destination::SERVER, b"x");

    let entry = sim.pending_entries().next().unwrap();
    assert!((entry.delivery_time() - 100.01).abs() < 1e-9);
}

#[test]
fn test_negative_latency_is_due_immediately() {
    let mut sim = scripted_sim(4, vec![KEEP]);
    sim.set_latency(-20.0);
    sim.send_packet(Destination::new(5), b"early");

    // Still strictly later than the delivery time, without advancing.
    let received = sim.receive_packets(4);
    assert_eq!(received.len(), 1);
}

#[test]
fn test_mixed_destinations_are_routed() {
    let mut sim = scripted_sim(8, vec![KEEP]);
    sim.set_latency(5.0);
    for peer in 0..4 {
        sim.send_packet(Destination::new(peer), format!("to {peer}").as_bytes());
    }

    sim.advance_time(1.0);
    for (destination, payload) in sim.receive_packets(8) {
        assert_eq!(payload, format!("to {}", destination.as_usize()).into_bytes());
    }
}

#[test]
fn test_steady_stream_drains_completely() {
    let mut sim = seeded_sim(64, 11);
    sim.set_latency(30.0);
    sim.set_jitter(10.0);

    let mut sent = 0u32;
    let mut received = 0usize;
    let mut now = 0.0;
    for _ in 0..300 {
        sim.send_packet(Destination::SERVER, &sent.to_le_bytes());
        sent += 1;
        now += 1.0 / 60.0;
        sim.advance_time(now);
        received += sim.receive_packets(sim.capacity()).len();
    }

    received += drain_until(&mut sim, now + 1.0, 0.01)
        .iter()
        .map(|(_, batch)| batch.len())
        .sum::<usize>();

    // 300 sends at 60Hz with at most 40ms delay keep far fewer than 64 in flight.
    assert_eq!(received, sent as usize);
    assert_eq!(sim.stats().packets_overwritten, 0);
    assert_eq!(sim.pending_packets(), 0);
}

#[test]
fn test_inactive_simulator_returns_nothing() {
    let mut sim = scripted_sim(4, vec![KEEP]);
    assert!(!sim.is_active());
    sim.send_packet(Destination::SERVER, b"ignored");
    sim.advance_time(100.0);
    assert!(sim.receive_packets(4).is_empty());
}
