//! # leadgate - Lead Intake Validation and Mutation Throttling
//!
//! Validates buyer leads coming in one at a time (a form submission) or in
//! bulk (a CSV upload), and throttles the create, update and import calls
//! that carry them to a backend store.
//!
//! ## Components
//!
//! ```text
//!     form JSON ──► RecordValidator ──┐
//!                                     ├──► Lead ──► MutationGateway ──► transport
//!     CSV file ──► BatchIngestion ────┘                  │
//!                  (≤ 200 rows,                           ▼
//!                   partial success)             RateLimiterRegistry
//!                                                 create  5 / 60 s
//!                                                 update 10 / 60 s
//!                                                 import  2 / 300 s
//! ```
//!
//! ## Quick Start
//!
//! ### Validating a form submission
//!
//! ```rust
//! use leadgate::{validate, Bhk};
//! use serde_json::json;
//!
//! let raw = json!({
//!     "fullName": "John Doe",
//!     "phone": "9876543210",
//!     "city": "Chandigarh",
//!     "propertyType": "Apartment",
//!     "bhk": "2",
//!     "purpose": "Buy",
//!     "budgetMin": 5000000,
//!     "timeline": "0-3m",
//!     "source": "Website",
//!     "tags": ["urgent"]
//! });
//!
//! let lead = validate(raw.as_object().unwrap()).unwrap();
//! assert_eq!(lead.bhk, Some(Bhk::Two));
//! ```
//!
//! ### Importing a CSV file
//!
//! ```rust
//! let csv = "fullName,phone,city,propertyType,bhk,purpose,timeline,source,tags\n\
//!            John Doe,9876543210,Chandigarh,Apartment,2,Buy,0-3m,Website,\"urgent, family, premium\"\n\
//!            Jane,123,Mohali,Plot,,Rent,3-6m,Call,\n";
//!
//! let report = leadgate::ingest(csv);
//! assert_eq!(report.accepted[0].tags, vec!["urgent", "family", "premium"]);
//! assert_eq!(report.rejected[0].field, "phone");
//! println!("{}", report.summary());
//! ```
//!
//! ### Throttling mutations
//!
//! ```rust
//! use leadgate::RateLimiterBuilder;
//!
//! let limiter = RateLimiterBuilder::new()
//!     .max_requests(3)
//!     .window_ms(1_000)
//!     .build();
//!
//! for _ in 0..3 {
//!     assert!(limiter.is_allowed("u1"));
//! }
//! assert!(!limiter.is_allowed("u1"));
//! assert!(limiter.is_allowed("u2"));
//! ```
//!
//! ## Validation
//!
//! Every field is checked and every failure reported; only when all fields
//! pass are the cross-field rules applied (BHK for Apartment and Villa, and
//! `budgetMax ≥ budgetMin`). Errors are [`FieldError`] values naming the
//! field, a message, and the raw input.
//!
//! ## Sliding Window
//!
//! Each limiter keeps the timestamps of admitted calls per key and counts
//! only those inside the trailing window, so there is no burst at a window
//! edge:
//!
//! ```text
//!     window = 1000ms, max = 3
//!
//!     t=0    t=100  t=200  t=300   t=1001
//!      ✓      ✓      ✓      ✗       ✓    (t=0 slid out)
//! ```
//!
//! ## Thread Safety
//!
//! The validator and the pipeline hold no mutable state. Limiters keep their
//! windows in a `DashMap`, and each check-and-record is atomic per key:
//! - `SlidingWindowLimiter` - share via `Arc<SlidingWindowLimiter>`
//! - `RateLimiterRegistry` - share via `Arc<RateLimiterRegistry>`
//!
//! ## Logging
//!
//! Events are emitted through `tracing`. The crate installs no subscriber.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rust_2018_idioms, unreachable_pub, missing_debug_implementations)]
#![forbid(unsafe_code)]

mod error;
mod gateway;
mod ingest;
mod lead;
mod rate_limiter;

// Public re-exports
pub use error::{ConfigError, ExportError, GatewayError, IngestError, TransportError};
pub use gateway::{caller_key, MutationGateway, MutationTransport, ANONYMOUS_CALLER};
pub use ingest::{
    ingest, ingest_reader, to_csv, to_csv_with, write_csv, BatchIngestionPipeline,
    IngestConfig, IngestReport, DEFAULT_MAX_ROWS,
};
pub use lead::{
    validate, validate_row, Bhk, City, FieldError, Lead, PropertyType, Purpose, RawRecord,
    RecordValidator, RowRef, Source, Status, TagSeparator, Timeline, UnknownVariant,
    ValidationErrors, FULL_NAME_MAX_CHARS, FULL_NAME_MIN_CHARS, MAX_BUDGET, NOTES_MAX_CHARS,
};
pub use rate_limiter::{
    current_time_ms, seconds_until, LimiterMetrics, Operation, OperationBudgets,
    RateLimiterConfig, RateLimiterRegistry, RegistryStats, SlidingWindowLimiter,
    DEFAULT_RETRY_AFTER_SECS,
};

/// A limiter registry wrapped in `Arc` for sharing across request handlers.
pub type SharedRegistry = std::sync::Arc<RateLimiterRegistry>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum supported Rust version.
///
/// 1.80 is the first release with `std::sync::LazyLock`.
pub const MSRV: &str = "1.80.0";

/// Common imports.
///
/// ```rust
/// use leadgate::prelude::*;
///
/// let registry = RateLimiterRegistry::default();
/// assert!(registry.is_allowed(Operation::Create, "u1"));
/// ```
pub mod prelude {
    pub use crate::{
        validate, validate_row, BatchIngestionPipeline, FieldError, GatewayError,
        IngestConfig, IngestReport, Lead, MutationGateway, MutationTransport, Operation,
        OperationBudgets, RateLimiterConfig, RateLimiterRegistry, RecordValidator, RowRef,
        SharedRegistry, SlidingWindowLimiter, TagSeparator, TransportError, ValidationErrors,
    };
}

/// Fluent construction of a single [`SlidingWindowLimiter`].
///
/// ```rust
/// use leadgate::{ConfigError, RateLimiterBuilder};
///
/// let limiter = RateLimiterBuilder::new()
///     .max_requests(5)
///     .window_ms(60_000)
///     .build();
/// assert_eq!(limiter.remaining_requests("u1"), 5);
///
/// let result = RateLimiterBuilder::new().max_requests(0).try_build();
/// assert_eq!(result.err(), Some(ConfigError::ZeroMaxRequests));
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiterBuilder {
    config: RateLimiterConfig,
}

impl RateLimiterBuilder {
    /// Starts from [`RateLimiterConfig::default`] (10 calls per 60 s).
    pub fn new() -> Self {
        Self {
            config: RateLimiterConfig::default(),
        }
    }

    /// Calls admitted per window per key (must be > 0).
    pub fn max_requests(mut self, max_requests: u32) -> Self {
        self.config.max_requests = max_requests;
        self
    }

    /// Window length in milliseconds (must be > 0).
    pub fn window_ms(mut self, window_ms: u64) -> Self {
        self.config.window_ms = window_ms;
        self
    }

    /// # Panics
    ///
    /// Panics on an invalid configuration. Use [`try_build`](Self::try_build)
    /// to handle it instead.
    pub fn build(self) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(self.config)
    }

    /// # Errors
    ///
    /// Returns the [`ConfigError`] for a zero budget or window.
    pub fn try_build(self) -> Result<SlidingWindowLimiter, ConfigError> {
        SlidingWindowLimiter::try_new(self.config)
    }
}

impl Default for RateLimiterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
