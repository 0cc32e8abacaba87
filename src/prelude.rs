//! Convenient re-exports for common usage.
//!
//! ```rust
//! use fortress_netsim::prelude::*;
//! ```
//!
//! # What's Included
//!
//! - **Simulator**: [`NetworkSimulator`], [`ReceivedPackets`], [`PacketEntry`], [`Destination`]
//! - **Configuration**: [`SimulatorConfig`], [`SimulatorConfigBuilder`]
//! - **Statistics**: [`SimulatorStats`]
//! - **Error handling**: [`NetSimError`]
//! - **Randomness**: [`Pcg32`], [`Rng`], [`SeedableRng`]
//!
//! Telemetry observers and [`ScriptedRng`](crate::rng::ScriptedRng) are not included;
//! import them from [`telemetry`](crate::telemetry) and [`rng`](crate::rng).

pub use crate::config::{SimulatorConfig, SimulatorConfigBuilder};
pub use crate::error::NetSimError;
pub use crate::network::simulator::{NetworkSimulator, PacketEntry, ReceivedPackets};
pub use crate::network::stats::SimulatorStats;
pub use crate::rng::{Pcg32, Rng, SeedableRng};
pub use crate::Destination;
