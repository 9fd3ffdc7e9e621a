//! Error types for netstack

use thiserror::Error;

/// Result type alias for netstack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for netstack
///
/// Every payload is either a static string or an integer, so building an
/// error never touches the heap.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A buffer shift or a stack push would exceed fixed capacity
    #[error("Capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded { requested: usize, available: usize },

    /// Malformed textual input (address, port)
    #[error("Parse error: {0}")]
    Parse(&'static str),

    /// Numeric value outside the range its field can carry
    #[error("Invalid {field}: {value} is out of range")]
    Validation { field: &'static str, value: u64 },

    /// A header on the wire failed a structural check
    #[error("Malformed header: {0}")]
    Format(&'static str),

    /// A protocol code with no mapping in this layer
    #[error("Unsupported {layer} protocol: {code:#06x}")]
    UnsupportedProtocol { layer: &'static str, code: u16 },
}

impl Error {
    /// Create a parse error with a static message
    pub fn parse(msg: &'static str) -> Self {
        Error::Parse(msg)
    }

    /// Create a format error with a static message
    pub fn format(msg: &'static str) -> Self {
        Error::Format(msg)
    }

    /// Create a validation error for a field
    pub fn validation(field: &'static str, value: u64) -> Self {
        Error::Validation { field, value }
    }

    /// Create a capacity error
    pub fn capacity(requested: usize, available: usize) -> Self {
        Error::CapacityExceeded {
            requested,
            available,
        }
    }

    /// Create an unsupported protocol error
    pub fn unsupported(layer: &'static str, code: u16) -> Self {
        Error::UnsupportedProtocol { layer, code }
    }

    /// Whether retrying with a larger buffer or stack could succeed
    pub fn is_capacity(&self) -> bool {
        matches!(self, Error::CapacityExceeded { .. })
    }
}
