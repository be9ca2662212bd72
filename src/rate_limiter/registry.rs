//! # Operation Limiter Registry
//!
//! One [`SlidingWindowLimiter`] per mutating operation, built once at start-up
//! and handed by reference to whatever issues mutating calls.
//!
//! ```text
//!     caller "u1" ──┬─► create  (5 / 60s)   ─► window["u1"]
//!                   ├─► update  (10 / 60s)  ─► window["u1"]
//!                   └─► import  (2 / 300s)  ─► window["u1"]
//! ```
//!
//! Each limiter owns a disjoint key space, so exhausting the create budget
//! leaves the same caller's update and import budgets untouched.

use super::{
    config::{Operation, OperationBudgets},
    core::SlidingWindowLimiter,
    metrics::LimiterMetrics,
};
use crate::error::ConfigError;
use tracing::info;

/// Per-operation limiters with explicit lifetime and configuration.
///
/// ## Usage
///
/// ```rust
/// use leadgate::{Operation, RateLimiterRegistry};
/// use std::sync::Arc;
///
/// // Built once, shared with request handlers.
/// let registry = Arc::new(RateLimiterRegistry::default());
///
/// fn handle_create(registry: &RateLimiterRegistry, caller: &str) -> bool {
///     registry.is_allowed(Operation::Create, caller)
/// }
///
/// for _ in 0..5 {
///     assert!(handle_create(&registry, "u1"));
/// }
/// assert!(!handle_create(&registry, "u1"));
/// assert!(registry.is_allowed(Operation::Update, "u1"));
/// ```
#[derive(Debug)]
pub struct RateLimiterRegistry {
    create: SlidingWindowLimiter,
    update: SlidingWindowLimiter,
    import: SlidingWindowLimiter,
    budgets: OperationBudgets,
}

impl RateLimiterRegistry {
    /// Builds limiters for every operation.
    ///
    /// # Errors
    ///
    /// Returns the first invalid budget's [`ConfigError`].
    pub fn new(budgets: OperationBudgets) -> Result<Self, ConfigError> {
        let registry = Self {
            create: SlidingWindowLimiter::try_new(budgets.create)?,
            update: SlidingWindowLimiter::try_new(budgets.update)?,
            import: SlidingWindowLimiter::try_new(budgets.import)?,
            budgets,
        };
        info!(
            create = %format_budget(&budgets, Operation::Create),
            update = %format_budget(&budgets, Operation::Update),
            import = %format_budget(&budgets, Operation::Import),
            "rate limiter registry ready"
        );
        Ok(registry)
    }

    /// The limiter guarding `operation`.
    #[inline]
    pub fn limiter(&self, operation: Operation) -> &SlidingWindowLimiter {
        match operation {
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::Import => &self.import,
        }
    }

    /// Budgets this registry was built from.
    pub fn budgets(&self) -> &OperationBudgets {
        &self.budgets
    }

    /// Admits or denies one `operation` call for `key`.
    #[inline]
    pub fn is_allowed(&self, operation: Operation, key: &str) -> bool {
        self.limiter(operation).is_allowed(key)
    }

    /// Remaining `operation` calls for `key` in the current window.
    #[inline]
    pub fn remaining_requests(&self, operation: Operation, key: &str) -> u32 {
        self.limiter(operation).remaining_requests(key)
    }

    /// Estimated seconds before `key` may retry `operation`.
    #[inline]
    pub fn retry_after_secs(&self, operation: Operation, key: &str) -> u64 {
        self.limiter(operation).retry_after_secs(key)
    }

    /// Snapshot of every limiter's counters.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            create: self.create.metrics(),
            update: self.update.metrics(),
            import: self.import.metrics(),
        }
    }

    /// Drops every window in every limiter.
    pub fn clear(&self) {
        for op in Operation::ALL {
            self.limiter(op).clear();
        }
    }
}

impl Default for RateLimiterRegistry {
    /// Registry with [`OperationBudgets::default`].
    fn default() -> Self {
        let budgets = OperationBudgets::default();
        Self {
            create: SlidingWindowLimiter::new(budgets.create),
            update: SlidingWindowLimiter::new(budgets.update),
            import: SlidingWindowLimiter::new(budgets.import),
            budgets,
        }
    }
}

fn format_budget(budgets: &OperationBudgets, operation: Operation) -> String {
    let config = budgets.get(operation);
    format!("{}/{}ms", config.max_requests, config.window_ms)
}

/// Counters for every operation limiter.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryStats {
    /// Create limiter counters.
    pub create: LimiterMetrics,
    /// Update limiter counters.
    pub update: LimiterMetrics,
    /// Import limiter counters.
    pub import: LimiterMetrics,
}

impl RegistryStats {
    /// Counters for one operation.
    pub fn get(&self, operation: Operation) -> &LimiterMetrics {
        match operation {
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::Import => &self.import,
        }
    }

    /// Denials across all operations.
    pub fn total_denied(&self) -> u64 {
        Operation::ALL
            .iter()
            .map(|op| self.get(*op).total_denied)
            .sum()
    }

    /// Human-readable report.
    pub fn summary(&self) -> String {
        format!(
            "Rate Limiter Registry Stats:\n\
             ├─ create: {}\n\
             ├─ update: {}\n\
             └─ import: {}",
            self.create, self.update, self.import
        )
    }
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RateLimiterConfig;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_default_budgets_per_operation() {
        let registry = RateLimiterRegistry::default();
        assert_eq!(registry.limiter(Operation::Create).config().max_requests, 5);
        assert_eq!(registry.limiter(Operation::Update).config().max_requests, 10);
        assert_eq!(registry.limiter(Operation::Import).config().window_ms, 300_000);
    }

    #[test]
    fn test_operations_have_disjoint_key_spaces() {
        let registry = RateLimiterRegistry::default();
        for _ in 0..2 {
            assert!(registry.is_allowed(Operation::Import, "u1"));
        }
        assert!(!registry.is_allowed(Operation::Import, "u1"));
        assert!(registry.is_allowed(Operation::Create, "u1"));
        assert_eq!(registry.remaining_requests(Operation::Update, "u1"), 10);
        assert_eq!(registry.remaining_requests(Operation::Import, "u1"), 0);
        assert!(registry.retry_after_secs(Operation::Import, "u1") > 290);
    }

    #[test]
    fn test_invalid_budget_rejected() {
        let budgets =
            OperationBudgets::default().with(Operation::Update, RateLimiterConfig::new(3, 0));
        assert_eq!(
            RateLimiterRegistry::new(budgets).err(),
            Some(ConfigError::ZeroWindow)
        );
    }

    #[test]
    fn test_stats() {
        let registry = RateLimiterRegistry::default();
        for _ in 0..7 {
            registry.is_allowed(Operation::Create, "u1");
        }
        let stats = registry.stats();
        assert_eq!(stats.create.total_admitted, 5);
        assert_eq!(stats.create.total_denied, 2);
        assert_eq!(stats.total_denied(), 2);
        assert_eq!(stats.get(Operation::Update).total_requests(), 0);
        assert!(stats.summary().contains("create: admitted=5 denied=2"));
    }

    #[test]
    fn test_clear() {
        let registry = RateLimiterRegistry::default();
        registry.is_allowed(Operation::Create, "u1");
        registry.is_allowed(Operation::Update, "u2");
        registry.clear();
        assert_eq!(registry.limiter(Operation::Create).tracked_keys(), 0);
        assert_eq!(registry.limiter(Operation::Update).tracked_keys(), 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = Arc::new(RateLimiterRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let key = format!("user-{}", i % 2);
                    (0..5)
                        .filter(|_| registry.is_allowed(Operation::Update, &key))
                        .count()
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // Two identities, 10 updates each.
        assert_eq!(total, 20);
    }
}
