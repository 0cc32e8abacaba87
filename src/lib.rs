//! # Fortress NetSim
//!
//! An in-process network impairment simulator for testing netcode.
//!
//! Outbound packets are pushed into a fixed-size ring buffer instead of onto the wire.
//! On the way in they may be dropped, duplicated, or delayed by a base latency plus
//! random jitter. The host drives a virtual clock and periodically pulls back the
//! packets whose delivery time has passed, then hands them to the real transport.
//!
//! ```rust
//! use fortress_netsim::prelude::*;
//!
//! let config = SimulatorConfig::poor_network();
//! let mut sim = NetworkSimulator::from_config(&config)?;
//!
//! let mut now = 0.0;
//! for tick in 0..120u32 {
//!     sim.send_packet(Destination::SERVER, &tick.to_le_bytes());
//!
//!     now += 1.0 / 60.0;
//!     sim.advance_time(now);
//!     for (destination, payload) in sim.receive_packets(sim.capacity()) {
//!         // socket.send_to(&payload, peers[destination.as_usize()]) ...
//!         let _ = (destination, payload);
//!     }
//! }
//! # Ok::<(), fortress_netsim::NetSimError>(())
//! ```
//!
//! When no impairment is configured the simulator is *inactive* and returns
//! nothing; check [`NetworkSimulator::is_active`] and send directly instead.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use config::{SimulatorConfig, SimulatorConfigBuilder};
pub use error::NetSimError;
pub use network::simulator::{NetworkSimulator, PacketEntry, ReceivedPackets};
pub use network::stats::SimulatorStats;

pub mod config;
/// Errors returned when a simulator cannot be constructed or configured.
pub mod error;
pub mod prelude;
/// Random number generation based on PCG32, plus a scripted source for tests.
///
/// See the module documentation for usage details.
pub mod rng;
pub mod telemetry;

/// The simulator itself and the counters it keeps.
pub mod network {
    pub mod simulator;
    /// Traffic counters kept by the simulator.
    pub mod stats;
}

// #############
// #  STRUCTS  #
// #############

/// Identifies the peer a packet is addressed to.
///
/// The simulator never interprets the value; it is carried alongside the payload
/// and handed back on delivery so the caller can route it. [`Destination::SERVER`]
/// (index 0) is the conventional address of the server in a client/server setup.
///
/// # Examples
///
/// ```
/// use fortress_netsim::Destination;
///
/// let client = Destination::new(3);
/// assert_eq!(client.as_usize(), 3);
/// assert!(!client.is_server());
/// assert!(Destination::SERVER.is_server());
/// assert_eq!(Destination::from(3usize), client);
/// ```
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Destination(usize);

impl Destination {
    /// The server's address.
    pub const SERVER: Self = Self(0);

    /// Creates a new `Destination` from a peer index.
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying peer index.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Returns `true` if this is [`Destination::SERVER`].
    #[inline]
    #[must_use]
    pub const fn is_server(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Destination {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<Destination> for usize {
    #[inline]
    fn from(destination: Destination) -> Self {
        destination.0
    }
}
