//! # Rate Limiter Configuration
//!
//! Settings for the sliding-window limiters and the per-operation budgets
//! the registry is built from.
//!
//! ## Sliding Window Parameters
//!
//! ```text
//!     window_ms = 60_000, max_requests = 5
//!
//!     now - 60s                                   now
//!        │◄──────────────── window ───────────────►│
//!        │    t1      t2   t3        t4     t5      │  5 admitted → deny
//!        │                                          │
//!     t1 falls out of the window ──► one slot frees up
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Fallback wait, in seconds, reported to a denied caller when no reset
/// time is known for its key.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Configuration for a single sliding-window limiter.
///
/// ## Examples
///
/// ```rust
/// use leadgate::RateLimiterConfig;
///
/// // 5 calls per minute
/// let config = RateLimiterConfig::per_minute(5);
/// assert_eq!(config.window_ms, 60_000);
///
/// // 2 calls per 5 minutes
/// let config = RateLimiterConfig::new(2, 300_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum admitted calls per key inside one window.
    pub max_requests: u32,

    /// Length of the trailing window in milliseconds.
    pub window_ms: u64,
}

impl Default for RateLimiterConfig {
    /// 10 calls per 60 seconds.
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_ms: 60_000,
        }
    }
}

impl RateLimiterConfig {
    /// Creates a configuration admitting `max_requests` per `window_ms`.
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }

    /// Creates a configuration with a one-second window.
    pub fn per_second(max_requests: u32) -> Self {
        Self::new(max_requests, 1_000)
    }

    /// Creates a configuration with a one-minute window.
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, 60_000)
    }

    /// Replaces the window length.
    pub fn with_window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Checks that the limiter can ever admit a call.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroMaxRequests`] if `max_requests` is 0
    /// - [`ConfigError::ZeroWindow`] if `window_ms` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::ZeroMaxRequests);
        }
        if self.window_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }

    /// Sustained admission rate, for display.
    ///
    /// ```rust
    /// use leadgate::RateLimiterConfig;
    ///
    /// let config = RateLimiterConfig::new(2, 300_000);
    /// assert!((config.effective_rate_per_minute() - 0.4).abs() < f64::EPSILON);
    /// ```
    pub fn effective_rate_per_minute(&self) -> f64 {
        if self.window_ms == 0 {
            0.0
        } else {
            (self.max_requests as f64 * 60_000.0) / self.window_ms as f64
        }
    }
}

/// Mutating operation categories. Each one gets its own limiter and key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Creating a single lead.
    Create,
    /// Updating an existing lead.
    Update,
    /// Bulk CSV import.
    Import,
}

impl Operation {
    /// All operations, in registry order.
    pub const ALL: [Operation; 3] = [Operation::Create, Operation::Update, Operation::Import];

    /// Lowercase name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Import => "import",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budgets for every mutating operation.
///
/// ```rust
/// use leadgate::{Operation, OperationBudgets};
///
/// let budgets = OperationBudgets::default();
/// assert_eq!(budgets.get(Operation::Create).max_requests, 5);
/// assert_eq!(budgets.get(Operation::Import).window_ms, 300_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationBudgets {
    /// Budget for single-lead creation.
    pub create: RateLimiterConfig,
    /// Budget for lead updates.
    pub update: RateLimiterConfig,
    /// Budget for bulk imports.
    pub import: RateLimiterConfig,
}

impl Default for OperationBudgets {
    /// create 5/60s, update 10/60s, import 2/300s.
    fn default() -> Self {
        Self {
            create: RateLimiterConfig::per_minute(5),
            update: RateLimiterConfig::per_minute(10),
            import: RateLimiterConfig::new(2, 300_000),
        }
    }
}

impl OperationBudgets {
    /// Budget for one operation.
    pub fn get(&self, operation: Operation) -> RateLimiterConfig {
        match operation {
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Import => self.import,
        }
    }

    /// Replaces the budget for one operation.
    pub fn with(mut self, operation: Operation, config: RateLimiterConfig) -> Self {
        match operation {
            Operation::Create => self.create = config,
            Operation::Update => self.update = config,
            Operation::Import => self.import = config,
        }
        self
    }

    /// Validates every budget.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for op in Operation::ALL {
            self.get(op).validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(RateLimiterConfig::default().validate().is_ok());

        let zero_max = RateLimiterConfig::new(0, 1000);
        assert_eq!(zero_max.validate(), Err(ConfigError::ZeroMaxRequests));

        let zero_window = RateLimiterConfig::new(3, 0);
        assert_eq!(zero_window.validate(), Err(ConfigError::ZeroWindow));
        assert_eq!(zero_window.effective_rate_per_minute(), 0.0);
    }

    #[test]
    fn test_config_builders() {
        let config = RateLimiterConfig::per_second(3);
        assert_eq!(config.max_requests, 3);
        assert_eq!(config.window_ms, 1000);
        assert_eq!(config.effective_rate_per_minute(), 180.0);

        let config = RateLimiterConfig::per_minute(5).with_window_ms(120_000);
        assert_eq!(config.window_ms, 120_000);
    }

    #[test]
    fn test_default_budgets() {
        let budgets = OperationBudgets::default();
        assert_eq!(budgets.create, RateLimiterConfig::new(5, 60_000));
        assert_eq!(budgets.update, RateLimiterConfig::new(10, 60_000));
        assert_eq!(budgets.import, RateLimiterConfig::new(2, 300_000));
        assert!(budgets.validate().is_ok());
    }

    #[test]
    fn test_budget_override() {
        let budgets =
            OperationBudgets::default().with(Operation::Import, RateLimiterConfig::new(0, 1));
        assert_eq!(budgets.validate(), Err(ConfigError::ZeroMaxRequests));
        assert_eq!(budgets.get(Operation::Create).max_requests, 5);
    }

    #[test]
    fn test_budgets_from_json() {
        let json = r#"{ "import": { "max_requests": 1, "window_ms": 1000 } }"#;
        let budgets: OperationBudgets = serde_json::from_str(json).unwrap();
        assert_eq!(budgets.import, RateLimiterConfig::new(1, 1000));
        assert_eq!(budgets.create, RateLimiterConfig::per_minute(5));
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::Create.to_string(), "create");
        assert_eq!(Operation::ALL.len(), 3);
    }
}
