//! # Mutation Gateway
//!
//! Puts the operation limiters in front of whatever actually talks to the
//! lead store.
//!
//! ```text
//!     create / update / import (caller)
//!          │
//!          ▼
//!     ┌──────────┐  denied  ─► GatewayError::RateLimitExceeded { wait_secs }
//!     │ registry │            (transport never called)
//!     └────┬─────┘
//!          ▼ admitted
//!     ┌──────────┐  429     ─► GatewayError::BackendRateLimited
//!     │transport │  other   ─► GatewayError::Transport
//!     └──────────┘
//! ```
//!
//! Leads are handed to the transport as JSON bodies using the wire spelling
//! of every enumeration ([`Lead::to_wire_json`]).

use crate::error::{GatewayError, TransportError};
use crate::lead::Lead;
use crate::rate_limiter::{Operation, RateLimiterRegistry};
use serde_json::Value;
use std::borrow::Borrow;
use tracing::{debug, warn};

/// Limiter key for callers without an identity.
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// The caller's key, or [`ANONYMOUS_CALLER`].
pub fn caller_key(identity: Option<&str>) -> &str {
    match identity {
        Some(id) if !id.is_empty() => id,
        _ => ANONYMOUS_CALLER,
    }
}

/// Sends mutations to the lead store.
///
/// Implementations own the network side: endpoints, authentication, timeouts.
/// A backend "too many requests" answer must be reported as
/// [`TransportError::RateLimited`] so callers can tell it apart from the
/// local limiter.
pub trait MutationTransport {
    /// What a successful call returns.
    type Output;

    /// Stores a new lead.
    fn create(&self, body: &Value) -> Result<Self::Output, TransportError>;

    /// Replaces the lead `id`.
    fn update(&self, id: &str, body: &Value) -> Result<Self::Output, TransportError>;

    /// Stores a batch of leads.
    fn import(&self, bodies: &[Value]) -> Result<Self::Output, TransportError>;
}

/// Rate-limited front for a [`MutationTransport`].
///
/// `R` is anything that borrows a registry: an owned [`RateLimiterRegistry`],
/// a `&RateLimiterRegistry`, or an `Arc<RateLimiterRegistry>`.
///
/// ```rust
/// use leadgate::{GatewayError, MutationGateway, MutationTransport, RateLimiterRegistry,
///                TransportError};
/// use serde_json::Value;
///
/// struct Echo;
///
/// impl MutationTransport for Echo {
///     type Output = ();
///     fn create(&self, _: &Value) -> Result<(), TransportError> { Ok(()) }
///     fn update(&self, _: &str, _: &Value) -> Result<(), TransportError> { Ok(()) }
///     fn import(&self, _: &[Value]) -> Result<(), TransportError> { Ok(()) }
/// }
///
/// let registry = RateLimiterRegistry::default();
/// let gateway = MutationGateway::new(&registry, Echo);
///
/// for _ in 0..2 {
///     gateway.import("u1", &[]).unwrap();
/// }
/// let err = gateway.import("u1", &[]).unwrap_err();
/// assert!(matches!(err, GatewayError::RateLimitExceeded { wait_secs, .. } if wait_secs > 0));
/// ```
#[derive(Debug)]
pub struct MutationGateway<R, T> {
    registry: R,
    transport: T,
}

impl<R, T> MutationGateway<R, T>
where
    R: Borrow<RateLimiterRegistry>,
    T: MutationTransport,
{
    pub fn new(registry: R, transport: T) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &RateLimiterRegistry {
        self.registry.borrow()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Creates `lead` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::RateLimitExceeded`] when the create budget is spent,
    /// otherwise whatever the transport reports.
    pub fn create(&self, caller: &str, lead: &Lead) -> Result<T::Output, GatewayError> {
        self.admit(Operation::Create, caller)?;
        let result = self.transport.create(&lead.to_wire_json());
        self.finish(Operation::Create, caller, result)
    }

    /// Replaces lead `id` with `lead` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn update(&self, caller: &str, id: &str, lead: &Lead) -> Result<T::Output, GatewayError> {
        self.admit(Operation::Update, caller)?;
        let result = self.transport.update(id, &lead.to_wire_json());
        self.finish(Operation::Update, caller, result)
    }

    /// Sends an accepted batch on behalf of `caller`. One call costs one
    /// unit of the import budget regardless of batch size.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn import(&self, caller: &str, leads: &[Lead]) -> Result<T::Output, GatewayError> {
        self.admit(Operation::Import, caller)?;
        let bodies: Vec<Value> = leads.iter().map(Lead::to_wire_json).collect();
        let result = self.transport.import(&bodies);
        self.finish(Operation::Import, caller, result)
    }

    fn admit(&self, operation: Operation, caller: &str) -> Result<(), GatewayError> {
        let limiter = self.registry().limiter(operation);
        if limiter.is_allowed(caller) {
            return Ok(());
        }
        let wait_secs = limiter.retry_after_secs(caller);
        debug!(%operation, caller, wait_secs, "mutation_denied");
        Err(GatewayError::RateLimitExceeded {
            operation,
            wait_secs,
        })
    }

    fn finish(
        &self,
        operation: Operation,
        caller: &str,
        result: Result<T::Output, TransportError>,
    ) -> Result<T::Output, GatewayError> {
        result.map_err(|source| match source {
            TransportError::RateLimited => {
                warn!(%operation, caller, "backend_rate_limited");
                GatewayError::BackendRateLimited { operation }
            }
            source => {
                warn!(%operation, caller, error = %source, "mutation_failed");
                GatewayError::Transport { operation, source }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{City, PropertyType, Purpose, Source, Status, Timeline};
    use crate::rate_limiter::{OperationBudgets, RateLimiterConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recording {
        calls: AtomicUsize,
        bodies: Mutex<Vec<Value>>,
        fail_with: Option<TransportError>,
    }

    impl Recording {
        fn failing(error: TransportError) -> Self {
            Self {
                fail_with: Some(error),
                ..Self::default()
            }
        }

        fn reply(&self, body: Value) -> Result<usize, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.bodies.lock().unwrap().push(body);
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(n),
            }
        }
    }

    impl MutationTransport for Recording {
        type Output = usize;

        fn create(&self, body: &Value) -> Result<usize, TransportError> {
            self.reply(body.clone())
        }

        fn update(&self, id: &str, body: &Value) -> Result<usize, TransportError> {
            let mut body = body.clone();
            body["id"] = Value::from(id);
            self.reply(body)
        }

        fn import(&self, bodies: &[Value]) -> Result<usize, TransportError> {
            self.reply(Value::Array(bodies.to_vec()))
        }
    }

    fn lead() -> Lead {
        Lead {
            full_name: "Asha Rao".into(),
            email: None,
            phone: "9876543210".into(),
            city: City::Panchkula,
            property_type: PropertyType::Office,
            bhk: None,
            purpose: Purpose::Rent,
            budget_min: None,
            budget_max: None,
            timeline: Timeline::ThreeToSixMonths,
            source: Source::WalkIn,
            notes: None,
            tags: Vec::new(),
            status: Status::New,
        }
    }

    #[test]
    fn test_admitted_calls_reach_transport_with_wire_values() {
        let registry = RateLimiterRegistry::default();
        let gateway = MutationGateway::new(&registry, Recording::default());

        assert_eq!(gateway.create("u1", &lead()).unwrap(), 1);
        assert_eq!(gateway.update("u1", "b-7", &lead()).unwrap(), 2);

        let bodies = gateway.transport().bodies.lock().unwrap();
        assert_eq!(bodies[0]["timeline"], "THREE_TO_SIX_MONTHS");
        assert_eq!(bodies[0]["source"], "Walk_in");
        assert_eq!(bodies[1]["id"], "b-7");
    }

    #[test]
    fn test_denied_call_skips_transport() {
        let budgets = OperationBudgets::default()
            .with(Operation::Create, RateLimiterConfig::new(1, 60_000));
        let gateway =
            MutationGateway::new(RateLimiterRegistry::new(budgets).unwrap(), Recording::default());

        gateway.create("u1", &lead()).unwrap();
        let err = gateway.create("u1", &lead()).unwrap_err();
        match err {
            GatewayError::RateLimitExceeded {
                operation,
                wait_secs,
            } => {
                assert_eq!(operation, Operation::Create);
                assert!((59..=60).contains(&wait_secs));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gateway.transport().calls.load(Ordering::SeqCst), 1);

        // Other callers and other operations are unaffected.
        assert!(gateway.create("u2", &lead()).is_ok());
        assert!(gateway.update("u1", "b-1", &lead()).is_ok());
    }

    #[test]
    fn test_backend_rate_limit_is_distinct() {
        let registry = Arc::new(RateLimiterRegistry::default());
        let gateway =
            MutationGateway::new(registry.clone(), Recording::failing(TransportError::RateLimited));

        let err = gateway.import("u1", &[lead()]).unwrap_err();
        assert_eq!(
            err,
            GatewayError::BackendRateLimited {
                operation: Operation::Import
            }
        );
        assert_eq!(err.to_string(), "Too many requests. Please wait before trying again.");
        // The admitted call still spent budget.
        assert_eq!(registry.remaining_requests(Operation::Import, "u1"), 1);
    }

    #[test]
    fn test_other_transport_failures() {
        let gateway = MutationGateway::new(
            RateLimiterRegistry::default(),
            Recording::failing(TransportError::Unavailable("connection refused".into())),
        );
        let err = gateway.create("u1", &lead()).unwrap_err();
        assert!(!err.is_rate_limited());
        assert!(matches!(
            err,
            GatewayError::Transport {
                operation: Operation::Create,
                source: TransportError::Unavailable(_)
            }
        ));
    }

    #[test]
    fn test_import_sends_every_lead_as_one_call() {
        let gateway = MutationGateway::new(RateLimiterRegistry::default(), Recording::default());
        gateway.import("u1", &[lead(), lead(), lead()]).unwrap();
        let bodies = gateway.transport().bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_caller_key() {
        assert_eq!(caller_key(Some("u1")), "u1");
        assert_eq!(caller_key(Some("")), ANONYMOUS_CALLER);
        assert_eq!(caller_key(None), "anonymous");
    }
}
