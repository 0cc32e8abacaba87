//! A ring-buffer network simulator driven by virtual time.
//!
//! [`NetworkSimulator`] sits between a sender and its transport. Outbound packets go in
//! through [`send_packet`](NetworkSimulator::send_packet), where they may be dropped
//! or duplicated and are stamped with a delivery time. The caller then moves virtual
//! time forward with [`advance_time`](NetworkSimulator::advance_time) and collects due
//! packets with [`receive_packets`](NetworkSimulator::receive_packets).
//!
//! # Example
//!
//! ```rust
//! use fortress_netsim::{Destination, NetworkSimulator};
//!
//! let mut sim = NetworkSimulator::new(10, 0.0).unwrap();
//! sim.set_latency(100.0);
//!
//! sim.send_packet(Destination::new(1), b"Hello, world!");
//!
//! sim.advance_time(0.10); // in seconds, so 0.10 = 100ms
//! assert!(sim.receive_packets(10).is_empty());
//!
//! sim.advance_time(0.11);
//! let received = sim.receive_packets(10);
//! assert_eq!(received.payloads, vec![b"Hello, world!".to_vec()]);
//! assert_eq!(received.destinations, vec![Destination::new(1)]);
//! ```
//!
//! # Ring buffer semantics
//!
//! - The buffer never grows. Each write lands on the slot under the write cursor and
//!   replaces whatever is there, delivered or not.
//! - [`receive_packets`](NetworkSimulator::receive_packets) scans from slot 0, not from
//!   the cursor, and its argument limits how many slots are *examined*.
//! - A packet is due once its delivery time is strictly before the current time.
//! - While inactive (all impairments zero) nothing is ever returned; callers are
//!   expected to bypass the simulator entirely.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::{ConfigField, ConfigWarning, ImpairmentField, SimulatorConfig};
use crate::error::NetSimError;
use crate::network::stats::SimulatorStats;
use crate::rng::{Pcg32, Rng, SeedableRng};
use crate::telemetry::{
    report_to_observer, InvariantChecker, InvariantViolation, SpecViolation, ViolationKind,
    ViolationObserver, ViolationSeverity,
};
use crate::{debug_check_invariants, report_violation_to, Destination};

/// A packet waiting in the ring buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketEntry {
    destination: Destination,
    delivery_time: f64,
    payload: Vec<u8>,
}

impl PacketEntry {
    /// Peer the packet is addressed to.
    #[must_use]
    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Virtual time after which the packet may be returned.
    #[must_use]
    pub fn delivery_time(&self) -> f64 {
        self.delivery_time
    }

    /// The simulator's private copy of the payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Packets returned by [`NetworkSimulator::receive_packets`].
///
/// `payloads[i]` is addressed to `destinations[i]`; both vectors always have the
/// same length and are in slot-scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "received packets are removed from the simulator and lost if ignored"]
pub struct ReceivedPackets {
    /// Payloads, in slot-scan order.
    pub payloads: Vec<Vec<u8>>,
    /// Destination of each payload.
    pub destinations: Vec<Destination>,
}

impl ReceivedPackets {
    /// Number of packets received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Returns `true` if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Iterates over `(destination, payload)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Destination, &[u8])> {
        self.destinations
            .iter()
            .copied()
            .zip(self.payloads.iter().map(Vec::as_slice))
    }

    fn push(&mut self, entry: PacketEntry) {
        self.destinations.push(entry.destination);
        self.payloads.push(entry.payload);
    }
}

impl IntoIterator for ReceivedPackets {
    type Item = (Destination, Vec<u8>);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<Destination>, std::vec::IntoIter<Vec<u8>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.destinations.into_iter().zip(self.payloads)
    }
}

/// Simulates latency, jitter, packet loss and duplication over a fixed-size ring buffer.
///
/// # Type Parameters
///
/// - `R`: The random source for loss, duplicate and jitter decisions. Defaults to
///   [`Pcg32`]; inject a seeded or scripted source with [`NetworkSimulator::with_rng`]
///   for reproducible runs.
///
/// # Thread Safety
///
/// The simulator is a plain owned value with no internal locking. Give each peer its
/// own instance, or wrap a shared one in a mutex.
pub struct NetworkSimulator<R: Rng = Pcg32> {
    slots: Vec<Option<PacketEntry>>,
    write_cursor: usize,
    current_time: f64,

    latency_ms: f64,
    jitter_ms: f64,
    packet_loss_percent: f64,
    duplicate_percent: f64,
    active: bool,

    rng: R,
    stats: SimulatorStats,
    observer: Option<Arc<dyn ViolationObserver>>,
}

impl NetworkSimulator<Pcg32> {
    /// Creates an inactive simulator with `capacity` slots, starting at `initial_time`
    /// (seconds), using an entropy-seeded [`Pcg32`].
    ///
    /// # Errors
    ///
    /// Returns [`NetSimError::InvalidConfiguration`] if `capacity` is zero.
    pub fn new(capacity: usize, initial_time: f64) -> Result<Self, NetSimError> {
        Self::with_rng(capacity, initial_time, Pcg32::from_entropy())
    }

    /// Builds a simulator from a [`SimulatorConfig`].
    ///
    /// Uses a [`Pcg32`] seeded from `config.seed` when present. Values flagged by
    /// [`SimulatorConfig::lint`] are accepted and reported as `Configuration`
    /// warnings through tracing.
    pub fn from_config(config: &SimulatorConfig) -> Result<Self, NetSimError> {
        Self::build_from_config(config, None)
    }

    /// Like [`from_config`](Self::from_config), but lint warnings and later
    /// violations go to `observer` instead of tracing.
    pub fn from_config_with_observer(
        config: &SimulatorConfig,
        observer: Arc<dyn ViolationObserver>,
    ) -> Result<Self, NetSimError> {
        Self::build_from_config(config, Some(observer))
    }

    fn build_from_config(
        config: &SimulatorConfig,
        observer: Option<Arc<dyn ViolationObserver>>,
    ) -> Result<Self, NetSimError> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(Pcg32::from_entropy, Pcg32::seed_from_u64);

        let mut sim = Self::with_rng(config.capacity, config.initial_time, rng)?;
        sim.observer = observer;

        for warning in config.lint() {
            sim.report_config_warning(&warning);
        }

        sim.latency_ms = config.latency_ms;
        sim.jitter_ms = config.jitter_ms;
        sim.packet_loss_percent = config.packet_loss_percent;
        sim.duplicate_percent = config.duplicate_percent;
        sim.update_active();
        Ok(sim)
    }
}

impl<R: Rng> NetworkSimulator<R> {
    /// Creates an inactive simulator drawing all randomness from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`NetSimError::InvalidConfiguration`] if `capacity` is zero, since a
    /// zero-length ring has no slot to write into.
    pub fn with_rng(capacity: usize, initial_time: f64, rng: R) -> Result<Self, NetSimError> {
        if capacity == 0 {
            return Err(NetSimError::InvalidConfiguration {
                info: "capacity must be greater than zero".to_owned(),
            });
        }

        debug!(capacity, initial_time, "created network simulator");

        Ok(Self {
            slots: vec![None; capacity],
            write_cursor: 0,
            current_time: initial_time,
            latency_ms: 0.0,
            jitter_ms: 0.0,
            packet_loss_percent: 0.0,
            duplicate_percent: 0.0,
            active: false,
            rng,
            stats: SimulatorStats::default(),
            observer: None,
        })
    }

    /// Routes violations to `observer` instead of tracing.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ViolationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns `true` if any impairment is configured.
    ///
    /// When this is `false`, send packets over the real path instead:
    /// [`receive_packets`](Self::receive_packets) returns nothing while inactive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Sets the base latency in milliseconds.
    pub fn set_latency(&mut self, ms: f64) {
        self.set_impairment(ImpairmentField::Latency, ms);
    }

    /// Sets the jitter amplitude in milliseconds.
    pub fn set_jitter(&mut self, ms: f64) {
        self.set_impairment(ImpairmentField::Jitter, ms);
    }

    /// Sets the packet loss chance in percent.
    pub fn set_packet_loss(&mut self, percent: f64) {
        self.set_impairment(ImpairmentField::PacketLoss, percent);
    }

    /// Sets the duplicate chance in percent.
    pub fn set_duplicates(&mut self, percent: f64) {
        self.set_impairment(ImpairmentField::Duplicates, percent);
    }

    /// Applies the four impairment scalars from `config`.
    ///
    /// Capacity, initial time and seed only matter at construction and are ignored.
    /// If the result is inactive while the simulator was active, buffered packets
    /// are discarded, exactly as with the individual setters.
    pub fn apply_config(&mut self, config: &SimulatorConfig) {
        for warning in config.lint() {
            if let ConfigField::Impairment(_) = warning.field {
                self.report_config_warning(&warning);
            }
        }
        self.latency_ms = config.latency_ms;
        self.jitter_ms = config.jitter_ms;
        self.packet_loss_percent = config.packet_loss_percent;
        self.duplicate_percent = config.duplicate_percent;
        self.update_active();
    }

    fn set_impairment(&mut self, field: ImpairmentField, value: f64) {
        if let Some(warning) = ConfigWarning::check(field, value) {
            self.report_config_warning(&warning);
        }
        match field {
            ImpairmentField::Latency => self.latency_ms = value,
            ImpairmentField::Jitter => self.jitter_ms = value,
            ImpairmentField::PacketLoss => self.packet_loss_percent = value,
            ImpairmentField::Duplicates => self.duplicate_percent = value,
        }
        self.update_active();
    }

    fn update_active(&mut self) {
        let previous = self.active;
        self.active = self.latency_ms != 0.0
            || self.jitter_ms != 0.0
            || self.packet_loss_percent != 0.0
            || self.duplicate_percent != 0.0;

        if previous != self.active {
            debug!(active = self.active, "network simulator activity changed");
        }
        if previous && !self.active {
            self.discard_packets();
        }

        debug_check_invariants!(self, &self.observer, "after configuration change");
    }

    fn report_config_warning(&self, warning: &ConfigWarning) {
        let violation = SpecViolation::new(
            ViolationSeverity::Warning,
            ViolationKind::Configuration,
            warning.to_string(),
            concat!(file!(), ":", line!()),
        )
        .with_virtual_time(self.current_time)
        .with_context("field", warning.field.as_str())
        .with_context("value", warning.value.to_string());
        report_to_observer(self.observer.as_ref(), &violation);
    }

    /// Enqueues a copy of `payload` for `destination`.
    ///
    /// The packet is dropped if a roll in `[0, 100)` is at most the loss percentage.
    /// Otherwise it is written into the slot under the write cursor with a delivery
    /// time of `current_time + latency ± jitter`, overwriting any packet still there.
    /// A second roll at most the duplicate percentage writes one more copy into the
    /// next slot, delayed by an extra uniform `[0, 1)` seconds.
    pub fn send_packet(&mut self, destination: Destination, payload: &[u8]) {
        self.stats.packets_sent += 1;

        if self.roll_percent() <= self.packet_loss_percent {
            self.stats.packets_dropped += 1;
            trace!(%destination, len = payload.len(), "dropped packet");
            return;
        }

        let mut delay = self.latency_ms / 1000.0;
        if self.jitter_ms > 0.0 {
            delay += self.draw_jitter_ms() / 1000.0;
        }
        let delivery_time = self.current_time + delay;
        self.write_slot(destination, payload, delivery_time);

        if self.roll_percent() <= self.duplicate_percent {
            let extra = self.rng.gen_f64();
            self.write_slot(destination, payload, delivery_time + extra);
            self.stats.packets_duplicated += 1;
            trace!(%destination, extra, "duplicated packet");
        }

        debug_check_invariants!(self, &self.observer, "after send_packet");
    }

    fn roll_percent(&mut self) -> f64 {
        self.rng.gen_range_f64(0.0, 100.0)
    }

    /// Draws a jitter offset in `[-jitter, jitter)`. An infinite amplitude has no
    /// usable range, so it is reported and contributes no offset.
    fn draw_jitter_ms(&mut self) -> f64 {
        let amplitude = self.jitter_ms;
        if !amplitude.is_finite() {
            report_violation_to!(
                &self.observer,
                ViolationSeverity::Error,
                ViolationKind::Configuration,
                "jitter range [{}, {}) is not finite, sending without jitter",
                -amplitude,
                amplitude
            );
            return 0.0;
        }
        self.rng.gen_range_f64(-amplitude, amplitude)
    }

    fn write_slot(&mut self, destination: Destination, payload: &[u8], delivery_time: f64) {
        let index = self.write_cursor;
        let slot = &mut self.slots[index];
        if let Some(old) = slot.as_ref() {
            self.stats.packets_overwritten += 1;
            trace!(
                slot = index,
                destination = %old.destination,
                "overwrote undelivered packet"
            );
        }
        *slot = Some(PacketEntry {
            destination,
            delivery_time,
            payload: payload.to_vec(),
        });
        self.write_cursor = (index + 1) % self.slots.len();
    }

    /// Removes and returns every due packet among the first `max_to_scan` slots.
    ///
    /// Returns nothing while inactive. Slots are examined from index 0, so packets
    /// sitting past `max_to_scan` are not returned even if due.
    pub fn receive_packets(&mut self, max_to_scan: usize) -> ReceivedPackets {
        let mut received = ReceivedPackets::default();
        if !self.active {
            return received;
        }

        let now = self.current_time;
        let scan = self.slots.len().min(max_to_scan);
        for slot in &mut self.slots[..scan] {
            if let Some(entry) = slot.take_if(|entry| entry.delivery_time < now) {
                received.push(entry);
            }
        }

        self.stats.packets_delivered += received.len() as u64;
        if !received.is_empty() {
            trace!(count = received.len(), time = now, "delivered packets");
        }
        received
    }

    /// Sets the current virtual time in seconds.
    ///
    /// Time is expected to be non-decreasing but is not checked.
    pub fn advance_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Drops every buffered packet.
    pub fn discard_packets(&mut self) {
        let discarded = self.discard_where(|_| true);
        debug!(discarded, "discarded all packets");
    }

    /// Drops every buffered packet addressed to `destination`, leaving others in place.
    pub fn discard_client_packets(&mut self, destination: Destination) {
        let discarded = self.discard_where(|entry| entry.destination == destination);
        debug!(%destination, discarded, "discarded client packets");
    }

    fn discard_where(&mut self, mut predicate: impl FnMut(&PacketEntry) -> bool) -> usize {
        let mut discarded = 0;
        for slot in &mut self.slots {
            if slot.take_if(|entry| predicate(&*entry)).is_some() {
                discarded += 1;
            }
        }
        self.stats.packets_discarded += discarded as u64;
        discarded
    }

    /// Number of ring buffer slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The current virtual time in seconds.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Base latency in milliseconds.
    #[must_use]
    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    /// Jitter amplitude in milliseconds.
    #[must_use]
    pub fn jitter_ms(&self) -> f64 {
        self.jitter_ms
    }

    /// Packet loss chance in percent.
    #[must_use]
    pub fn packet_loss_percent(&self) -> f64 {
        self.packet_loss_percent
    }

    /// Duplicate chance in percent.
    #[must_use]
    pub fn duplicate_percent(&self) -> f64 {
        self.duplicate_percent
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn pending_packets(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Number of occupied slots addressed to `destination`.
    #[must_use]
    pub fn pending_packets_for(&self, destination: Destination) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|entry| entry.destination == destination)
            .count()
    }

    /// Iterates over buffered packets in slot order.
    pub fn pending_entries(&self) -> impl Iterator<Item = &PacketEntry> {
        self.slots.iter().flatten()
    }

    /// Returns statistics about what the simulator has done so far.
    pub fn stats(&self) -> SimulatorStats {
        self.stats
    }

    /// Resets statistics counters.
    pub fn reset_stats(&mut self) {
        self.stats = SimulatorStats::default();
    }

    /// Returns a reference to the random source.
    #[must_use]
    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Returns a mutable reference to the random source.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

impl<R: Rng> InvariantChecker for NetworkSimulator<R> {
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.slots.is_empty() {
            return Err(InvariantViolation::new(
                "NetworkSimulator",
                "ring buffer has no slots",
            ));
        }

        if self.write_cursor >= self.slots.len() {
            return Err(
                InvariantViolation::new("NetworkSimulator", "write cursor out of bounds")
                    .with_details(format!(
                        "cursor={}, capacity={}",
                        self.write_cursor,
                        self.slots.len()
                    )),
            );
        }

        let expected_active = self.latency_ms != 0.0
            || self.jitter_ms != 0.0
            || self.packet_loss_percent != 0.0
            || self.duplicate_percent != 0.0;
        if self.active != expected_active {
            return Err(
                InvariantViolation::new("NetworkSimulator", "active flag out of date")
                    .with_details(format!(
                        "active={}, expected={}",
                        self.active, expected_active
                    )),
            );
        }

        Ok(())
    }
}

impl<R: Rng> std::fmt::Debug for NetworkSimulator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSimulator")
            .field("capacity", &self.slots.len())
            .field("pending", &self.pending_packets())
            .field("write_cursor", &self.write_cursor)
            .field("current_time", &self.current_time)
            .field("latency_ms", &self.latency_ms)
            .field("jitter_ms", &self.jitter_ms)
            .field("packet_loss_percent", &self.packet_loss_percent)
            .field("duplicate_percent", &self.duplicate_percent)
            .field("active", &self.active)
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}
