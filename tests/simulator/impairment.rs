//! Loss, duplication and jitter over seeded runs.
//!
//! Bounds are several standard deviations wide so they hold for any seed.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use crate::common::{drain_until, scripted_sim, seeded_sim, HIT, KEEP};
use fortress_netsim::Destination;

const SENDS: u64 = 10_000;

#[test]
fn test_loss_rate_matches_configuration() {
    for seed in [1, 2, 3] {
        let mut sim = seeded_sim(16, seed);
        sim.set_packet_loss(10.0);
        for i in 0..SENDS {
            sim.send_packet(Destination::SERVER, &i.to_le_bytes());
        }

        let stats = sim.stats();
        assert_eq!(stats.packets_sent, SENDS);
        // mean 1000, sd 30
        assert!(
            (800..=1200).contains(&stats.packets_dropped),
            "seed {seed}: {stats}"
        );
        assert!((0.08..=0.12).contains(&stats.loss_ratio()));
    }
}

#[test]
fn test_duplicate_rate_matches_configuration() {
    let mut sim = seeded_sim(16, 99);
    sim.set_duplicates(5.0);
    for i in 0..SENDS {
        sim.send_packet(Destination::SERVER, &i.to_le_bytes());
    }

    let stats = sim.stats();
    assert_eq!(stats.packets_dropped, 0);
    // mean 500, sd 22
    assert!((350..=650).contains(&stats.packets_duplicated), "{stats}");
}

#[test]
fn test_full_loss_drops_everything() {
    let mut sim = seeded_sim(16, 5);
    sim.set_packet_loss(100.0);
    sim.set_duplicates(100.0);
    for i in 0..100u32 {
        sim.send_packet(Destination::SERVER, &i.to_le_bytes());
    }
    assert_eq!(sim.pending_packets(), 0);
    assert_eq!(sim.stats().packets_dropped, 100);
    assert_eq!(sim.stats().packets_duplicated, 0);
}

#[test]
fn test_loss_above_hundred_percent_drops_everything() {
    let mut sim = seeded_sim(16, 5);
    sim.set_packet_loss(250.0);
    for i in 0..100u32 {
        sim.send_packet(Destination::SERVER, &i.to_le_bytes());
    }
    assert_eq!(sim.stats().packets_dropped, 100);
}

#[test]
fn test_duplicate_arrives_within_one_second_after_original() {
    // keep, duplicate, extra delay 0.75s
    let mut sim = scripted_sim(4, vec![KEEP, HIT, 0.75]);
    sim.set_latency(20.0);
    sim.set_duplicates(100.0);
    sim.send_packet(Destination::new(2), b"dup");

    let batches = drain_until(&mut sim, 2.0, 0.01);
    assert_eq!(batches.len(), 2);

    let (first_at, first) = &batches[0];
    let (second_at, second) = &batches[1];
    assert_eq!(first.payloads, second.payloads);
    assert_eq!(first.destinations, vec![Destination::new(2)]);
    assert!(*first_at > 0.02 && *first_at < 0.04);
    assert!(*second_at > 0.77 && *second_at < 0.79);
}

#[test]
fn test_jitter_reorders_packets() {
    let mut sim = seeded_sim(1024, 2024);
    sim.set_latency(100.0);
    sim.set_jitter(50.0);

    let mut now = 0.0;
    for i in 0..500u32 {
        sim.send_packet(Destination::SERVER, &i.to_le_bytes());
        now += 0.002;
        sim.advance_time(now);
    }

    let mut order = Vec::new();
    for (_, batch) in drain_until(&mut sim, now + 1.0, 0.001) {
        for payload in batch.payloads {
            order.push(u32::from_le_bytes(payload.try_into().unwrap()));
        }
    }

    assert_eq!(order.len(), 500);
    assert!(
        order.windows(2).any(|pair| pair[0] > pair[1]),
        "100ms of jitter on 2ms spacing should reorder something"
    );
}

#[test]
fn test_jitter_stays_within_amplitude() {
    let mut sim = seeded_sim(2048, 77);
    sim.set_latency(80.0);
    sim.set_jitter(30.0);
    for i in 0..2000u32 {
        sim.send_packet(Destination::SERVER, &i.to_le_bytes());
    }

    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for entry in sim.pending_entries() {
        min = min.min(entry.delivery_time());
        max = max.max(entry.delivery_time());
    }
    assert!(min >= 0.05 - 1e-9, "min delay {min}");
    assert!(max < 0.11, "max delay {max}");
    // Both ends of the range should actually be exercised.
    assert!(min < 0.055 && max > 0.105);
}
