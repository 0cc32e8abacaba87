//! Configuration for [`NetworkSimulator`](crate::NetworkSimulator).
//!
//! [`SimulatorConfig`] bundles the construction parameters (capacity, initial time,
//! seed) with the four impairment scalars so a whole network profile can be named,
//! stored and shared between peers.
//!
//! # Example
//!
//! ```rust
//! use fortress_netsim::{NetworkSimulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::builder()
//!     .capacity(64)
//!     .latency_ms(50.0)
//!     .jitter_ms(25.0)
//!     .packet_loss_percent(10.0)
//!     .duplicate_percent(5.0)
//!     .seed(42) // Deterministic for testing
//!     .build();
//!
//! let sim = NetworkSimulator::from_config(&config).unwrap();
//! assert!(sim.is_active());
//! assert_eq!(sim.capacity(), 64);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::NetSimError;

/// Ring buffer size used when none is given.
pub const DEFAULT_CAPACITY: usize = 100;

/// Configuration for network impairment simulation.
///
/// Use [`SimulatorConfig::builder()`] for a fluent configuration API.
/// All impairments default to zero (no effect). Values are deliberately not
/// clamped: a loss percentage above 100 drops everything, a negative latency
/// delivers early. [`SimulatorConfig::lint`] lists such values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of ring buffer slots (default: [`DEFAULT_CAPACITY`]). Must be nonzero.
    pub capacity: usize,

    /// Virtual time the simulator starts at, in seconds (default: 0.0).
    pub initial_time: f64,

    /// Base latency added to every packet, in milliseconds (default: 0.0).
    pub latency_ms: f64,

    /// Maximum random jitter in milliseconds (default: 0.0).
    /// Actual jitter is uniformly distributed in `[-jitter, +jitter]`.
    pub jitter_ms: f64,

    /// Chance of dropping a packet on send, in percent (default: 0.0).
    pub packet_loss_percent: f64,

    /// Chance of duplicating a packet on send, in percent (default: 0.0).
    pub duplicate_percent: f64,

    /// Random seed for deterministic behavior (default: random).
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            initial_time: 0.0,
            latency_ms: 0.0,
            jitter_ms: 0.0,
            packet_loss_percent: 0.0,
            duplicate_percent: 0.0,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Creates a new builder for fluent configuration.
    pub fn builder() -> SimulatorConfigBuilder {
        SimulatorConfigBuilder::new()
    }

    /// Creates a config with no impairment.
    ///
    /// A simulator built from this is inactive; callers should send directly.
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Creates a config with a fixed latency and nothing else.
    pub fn high_latency(latency_ms: f64) -> Self {
        Self {
            latency_ms,
            ..Default::default()
        }
    }

    /// Creates a config with packet loss and nothing else.
    pub fn lossy(packet_loss_percent: f64) -> Self {
        Self {
            packet_loss_percent,
            ..Default::default()
        }
    }

    /// Creates a config simulating typical poor network conditions.
    pub fn poor_network() -> Self {
        Self {
            latency_ms: 50.0,
            jitter_ms: 25.0,
            packet_loss_percent: 10.0,
            duplicate_percent: 5.0,
            ..Default::default()
        }
    }

    /// Creates a config simulating very bad network conditions.
    pub fn terrible_network() -> Self {
        Self {
            latency_ms: 250.0,
            jitter_ms: 100.0,
            packet_loss_percent: 15.0,
            duplicate_percent: 2.0,
            ..Default::default()
        }
    }

    /// Returns `true` if any impairment is configured.
    #[must_use]
    pub fn is_impaired(&self) -> bool {
        self.latency_ms != 0.0
            || self.jitter_ms != 0.0
            || self.packet_loss_percent != 0.0
            || self.duplicate_percent != 0.0
    }

    /// Checks the values that would make construction impossible.
    ///
    /// Only a zero capacity is rejected; everything else is simulated as given.
    pub fn validate(&self) -> Result<(), NetSimError> {
        if self.capacity == 0 {
            return Err(NetSimError::InvalidConfiguration {
                info: "capacity must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }

    /// Lists values that are accepted but probably not what the caller meant.
    #[must_use]
    pub fn lint(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if !self.initial_time.is_finite() {
            warnings.push(ConfigWarning {
                field: ConfigField::InitialTime,
                value: self.initial_time,
                reason: "is not finite",
            });
        }
        warnings.extend(ConfigWarning::check(ImpairmentField::Latency, self.latency_ms));
        warnings.extend(ConfigWarning::check(ImpairmentField::Jitter, self.jitter_ms));
        warnings.extend(ConfigWarning::check(
            ImpairmentField::PacketLoss,
            self.packet_loss_percent,
        ));
        warnings.extend(ConfigWarning::check(
            ImpairmentField::Duplicates,
            self.duplicate_percent,
        ));
        warnings
    }

    /// Parses a config from JSON. Missing fields take their default values.
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self, NetSimError> {
        serde_json::from_str(json).map_err(|e| NetSimError::SerializationError {
            context: e.to_string(),
        })
    }

    /// Serializes this config to JSON.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, NetSimError> {
        serde_json::to_string(self).map_err(|e| NetSimError::SerializationError {
            context: e.to_string(),
        })
    }
}

/// One of the four impairment scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpairmentField {
    /// Base latency in milliseconds.
    Latency,
    /// Jitter amplitude in milliseconds.
    Jitter,
    /// Loss chance in percent.
    PacketLoss,
    /// Duplicate chance in percent.
    Duplicates,
}

impl ImpairmentField {
    /// Field name as it appears in [`SimulatorConfig`].
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Latency => "latency_ms",
            Self::Jitter => "jitter_ms",
            Self::PacketLoss => "packet_loss_percent",
            Self::Duplicates => "duplicate_percent",
        }
    }

    const fn is_percentage(self) -> bool {
        matches!(self, Self::PacketLoss | Self::Duplicates)
    }
}

/// A [`SimulatorConfig`] field that [`SimulatorConfig::lint`] can flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// The starting virtual time. Only read at construction.
    InitialTime,
    /// One of the impairment scalars, which can also change at runtime.
    Impairment(ImpairmentField),
}

impl ConfigField {
    /// Field name as it appears in [`SimulatorConfig`].
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InitialTime => "initial_time",
            Self::Impairment(field) => field.as_str(),
        }
    }
}

impl From<ImpairmentField> for ConfigField {
    fn from(field: ImpairmentField) -> Self {
        Self::Impairment(field)
    }
}

/// A configuration value that is accepted but degenerate.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    /// The offending field.
    pub field: ConfigField,
    /// The value as given.
    pub value: f64,
    /// Why the value is suspicious.
    pub reason: &'static str,
}

impl ConfigWarning {
    /// Checks a single impairment scalar.
    #[must_use]
    pub fn check(field: ImpairmentField, value: f64) -> Option<Self> {
        let reason = if !value.is_finite() {
            "is not finite"
        } else if value < 0.0 {
            "is negative"
        } else if field.is_percentage() && value > 100.0 {
            "exceeds 100 percent"
        } else {
            return None;
        };
        Some(Self {
            field: field.into(),
            value,
            reason,
        })
    }
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (got {})",
            self.field.as_str(),
            self.reason,
            self.value
        )
    }
}

/// Builder for [`SimulatorConfig`].
#[derive(Debug, Clone, Default)]
pub struct SimulatorConfigBuilder {
    config: SimulatorConfig,
}

impl SimulatorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of ring buffer slots.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Sets the starting virtual time in seconds.
    pub fn initial_time(mut self, time: f64) -> Self {
        self.config.initial_time = time;
        self
    }

    /// Sets the base latency in milliseconds.
    pub fn latency_ms(mut self, ms: f64) -> Self {
        self.config.latency_ms = ms;
        self
    }

    /// Sets the maximum jitter in milliseconds.
    pub fn jitter_ms(mut self, ms: f64) -> Self {
        self.config.jitter_ms = ms;
        self
    }

    /// Sets the packet loss chance in percent.
    pub fn packet_loss_percent(mut self, percent: f64) -> Self {
        self.config.packet_loss_percent = percent;
        self
    }

    /// Sets the duplicate chance in percent.
    pub fn duplicate_percent(mut self, percent: f64) -> Self {
        self.config.duplicate_percent = percent;
        self
    }

    /// Sets the random seed for deterministic behavior.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> SimulatorConfig {
        self.config
    }
}
