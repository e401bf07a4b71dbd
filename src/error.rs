//! Errors of a logger session.
use crate::protocol as proto;

/// Represents all possible errors that can occur while talking to a logger.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The serial link could not be opened.
    #[error("Cannot open serial port {path}: {source}")]
    TransportUnavailable {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// Every attempt of the retry budget ended without a byte from the device.
    #[error("No response from device after {attempts} attempt(s)")]
    NoResponse { attempts: u32 },

    /// The data header holds no start time, so samples cannot be placed in time.
    #[error("Data header has no start time, sample timestamps cannot be computed")]
    MissingStartTime,

    /// The device stopped delivering samples before the announced count was reached.
    #[error("Incomplete sample series: expected {expected} samples, received {received}")]
    IncompleteSeries { expected: usize, received: usize },

    /// Wraps `proto::Error`.
    #[error(transparent)]
    Protocol(#[from] proto::Error),

    /// Wraps `std::io::Error` from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the device simply did not answer, as opposed to answering wrongly.
    pub fn is_no_response(&self) -> bool {
        matches!(self, Error::NoResponse { .. })
    }
}

/// The result type for logger operations.
pub type Result<T> = std::result::Result<T, Error>;
