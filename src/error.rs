use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// This enum contains all error messages this library can return.
///
/// Packet loss, duplication and out-of-range impairment values are simulated *behavior*,
/// not failures, so the only fallible operations are constructing a simulator and
/// loading a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NetSimError {
    /// The simulator could not be built from the given parameters, usually because
    /// the ring buffer capacity was zero.
    InvalidConfiguration {
        /// Further specifies why the configuration was invalid.
        info: String,
    },
    /// Serialization or deserialization of a configuration failed.
    SerializationError {
        /// A description of what failed to serialize/deserialize.
        context: String,
    },
}

impl Display for NetSimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetSimError::InvalidConfiguration { info } => {
                write!(f, "Invalid configuration: {}", info)
            }
            NetSimError::SerializationError { context } => {
                write!(f, "Serialization error: {}", context)
            }
        }
    }
}

impl Error for NetSimError {}
