/// Counters describing what a [`NetworkSimulator`] has done to the traffic passed through it.
///
/// [`NetworkSimulator`]: crate::NetworkSimulator
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[must_use = "SimulatorStats should be inspected or used after being queried"]
pub struct SimulatorStats {
    /// Number of `send_packet` calls, including ones that were dropped.
    pub packets_sent: u64,
    /// Packets silently dropped by the loss roll.
    pub packets_dropped: u64,
    /// Extra copies written by the duplicate roll.
    pub packets_duplicated: u64,
    /// Undelivered packets lost because the ring buffer wrapped onto their slot.
    pub packets_overwritten: u64,
    /// Packets handed back by `receive_packets`.
    pub packets_delivered: u64,
    /// Packets freed by a discard, including the implicit discard when the
    /// simulator becomes inactive.
    pub packets_discarded: u64,
}

impl SimulatorStats {
    /// Creates a new `SimulatorStats` instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of `send_packet` calls that were dropped, or `0.0` before any send.
    #[must_use]
    pub fn loss_ratio(&self) -> f64 {
        if self.packets_sent == 0 {
            0.0
        } else {
            self.packets_dropped as f64 / self.packets_sent as f64
        }
    }
}

impl std::fmt::Display for SimulatorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Destructure to ensure all fields are included when new fields are added.
        let Self {
            packets_sent,
            packets_dropped,
            packets_duplicated,
            packets_overwritten,
            packets_delivered,
            packets_discarded,
        } = self;

        write!(
            f,
            "SimulatorStats {{ sent: {}, dropped: {}, duplicated: {}, overwritten: {}, delivered: {}, discarded: {} }}",
            packets_sent,
            packets_dropped,
            packets_duplicated,
            packets_overwritten,
            packets_delivered,
            packets_discarded
        )
    }
}
