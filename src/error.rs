//! Error types for configuration, batch I/O, export and gated mutations.
//!
//! Invalid *input data* never shows up here: bad records and bad files become
//! [`FieldError`](crate::FieldError) values. These enums cover faults a caller
//! has to handle as failures.

use crate::rate_limiter::Operation;
use thiserror::Error;

/// Inconsistent configuration, caught before any limiter or pipeline is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A limiter with a zero budget would deny every call.
    #[error("max_requests must be greater than 0")]
    ZeroMaxRequests,

    /// A zero-length window never holds a timestamp.
    #[error("window_ms must be greater than 0")]
    ZeroWindow,

    /// A batch ceiling of zero rejects every file.
    #[error("max_rows must be greater than 0")]
    ZeroMaxRows,

    /// The tag separator collides with CSV quoting or line structure.
    #[error("tag separator {0:?} cannot be a quote, a newline or whitespace")]
    InvalidTagSeparator(char),
}

/// Faults raised while reading a batch payload before parsing starts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    /// The underlying reader failed.
    #[error("failed to read import payload: {0}")]
    Io(#[from] std::io::Error),
}

/// Faults raised while writing leads back out as CSV.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// A tag contains the active separator and would split on re-import.
    #[error("tag {tag:?} contains the separator {separator:?} and cannot be exported unambiguously")]
    AmbiguousTag {
        /// The offending tag.
        tag: String,
        /// The separator in use.
        separator: char,
    },

    /// The CSV writer failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// The written bytes were not valid UTF-8.
    #[error("exported CSV is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Flushing the in-memory writer failed.
    #[error("failed to flush CSV writer: {0}")]
    Flush(String),
}

/// Failures reported by a caller-supplied transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// The backend store refused the call with its own rate-limit signal.
    #[error("backend rate limit reached")]
    RateLimited,

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the request.
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

/// Outcome of a gated mutation that did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    /// The local limiter denied the call. Nothing was sent.
    #[error("Rate limit exceeded. Please wait {wait_secs} seconds before trying again.")]
    RateLimitExceeded {
        /// Which operation budget ran out.
        operation: Operation,
        /// Estimated seconds until a retry may succeed.
        wait_secs: u64,
    },

    /// The call was sent and the backend answered with its own rate limit.
    #[error("Too many requests. Please wait before trying again.")]
    BackendRateLimited {
        /// Which operation the backend throttled.
        operation: Operation,
    },

    /// Any other transport failure.
    #[error("{operation} failed: {source}")]
    Transport {
        /// Which operation failed.
        operation: Operation,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },
}

impl GatewayError {
    /// `true` for either the local or the backend rate-limit path.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::BackendRateLimited { .. }
        )
    }
}
