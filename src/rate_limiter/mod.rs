//! # Rate Limiter Module
//!
//! Sliding-window admission control for mutating operations.
//!
//! ## Module Structure
//!
//! ```text
//!     rate_limiter/
//!     ├── mod.rs          (module organization)
//!     ├── config.rs       (budgets, operations, validation)
//!     ├── core.rs         (per-key sliding window)
//!     ├── registry.rs     (one limiter per operation)
//!     ├── metrics.rs      (admission counters)
//!     └── utils.rs        (clock, retry arithmetic)
//! ```
//!
//! ## Architecture Flow
//!
//! ```text
//!     Mutating call (caller key, operation)
//!          │
//!          ▼
//!     ┌──────────┐
//!     │ Registry │ ◄── picks the operation's limiter
//!     └────┬─────┘
//!          ▼
//!     ┌──────────┐
//!     │  Core    │ ◄── prune, count, admit/deny
//!     └────┬─────┘
//!          ▼
//!     ┌──────────┐
//!     │  Utils   │ ◄── clock, seconds until reset
//!     └──────────┘
//! ```

mod config;
mod core;
mod metrics;
mod registry;
mod utils;

/// Budgets and operation categories
pub use config::{Operation, OperationBudgets, RateLimiterConfig, DEFAULT_RETRY_AFTER_SECS};

/// Per-key sliding-window limiter
pub use core::SlidingWindowLimiter;

/// Admission counters
pub use metrics::LimiterMetrics;

/// Per-operation limiter set
pub use registry::{RateLimiterRegistry, RegistryStats};

/// Clock and retry helpers
pub use utils::{current_time_ms, seconds_until};
