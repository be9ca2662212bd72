//! Basic usage: validating a form and throttling the calls that save it.
//!
//! Run with `RUST_LOG=debug cargo run --example basic` to see limiter events.

use leadgate::{
    caller_key, validate, GatewayError, MutationGateway, MutationTransport, Operation,
    RateLimiterBuilder, RateLimiterRegistry, TransportError,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== leadgate basics ===\n");

    // Example 1: Form validation
    form_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 2: A single sliding window
    sliding_window_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 3: Per-operation budgets behind a gateway
    gateway_example();
}

fn form_example() {
    println!("1. Form validation:");

    let submission = json!({
        "fullName": "J",
        "email": "john@",
        "phone": "98765",
        "city": "Chandigarh",
        "propertyType": "Villa",
        "purpose": "Buy",
        "budgetMin": 8000000,
        "budgetMax": 6000000,
        "timeline": "3-6m",
        "source": "Walk-in"
    });
    let Value::Object(raw) = submission else { return };

    match validate(&raw) {
        Ok(lead) => println!("   accepted: {}", lead.full_name),
        Err(errors) => {
            println!("   structural errors ({}):", errors.len());
            for error in &errors {
                println!("   - {}: {}", error.field, error.message);
            }
        }
    }

    // Fix the structural problems; the cross-field rules run next.
    let mut fixed = raw.clone();
    fixed.insert("fullName".into(), json!("John Doe"));
    fixed.insert("email".into(), json!("john@example.com"));
    fixed.insert("phone".into(), json!("9876543210"));
    if let Err(errors) = validate(&fixed) {
        println!("   refinement errors ({}):", errors.len());
        for error in &errors {
            println!("   - {}: {}", error.field, error.message);
        }
    }

    fixed.insert("bhk".into(), json!("3"));
    fixed.insert("budgetMax".into(), json!(9000000));
    match validate(&fixed) {
        Ok(lead) => println!(
            "   accepted: {} ({}, {} BHK, timeline {})",
            lead.full_name,
            lead.property_type,
            lead.bhk.map(|b| b.label()).unwrap_or("-"),
            lead.timeline.display_name()
        ),
        Err(errors) => println!("   still invalid: {errors}"),
    }
}

fn sliding_window_example() {
    println!("2. Sliding window (3 calls per second):");

    let limiter = RateLimiterBuilder::new()
        .max_requests(3)
        .window_ms(1_000)
        .build();

    for i in 1..=5 {
        if limiter.is_allowed("u1") {
            println!("   Request {} - allowed ({} left)", i, limiter.remaining_requests("u1"));
        } else {
            println!(
                "   Request {} - limited, retry in {}s",
                i,
                limiter.retry_after_secs("u1")
            );
        }
    }

    println!("   u2 unaffected: {}", limiter.is_allowed("u2"));

    println!("   Waiting for the window to slide...");
    thread::sleep(Duration::from_millis(1_050));
    println!("   u1 after window: {}", limiter.is_allowed("u1"));
    println!("   {}", limiter.metrics());
}

/// Stands in for the HTTP client; every fourth call is throttled upstream.
#[derive(Debug, Default)]
struct DemoTransport {
    calls: AtomicU32,
}

impl MutationTransport for DemoTransport {
    type Output = u32;

    fn create(&self, body: &Value) -> Result<u32, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if n % 4 == 0 {
            return Err(TransportError::RateLimited);
        }
        println!("   -> POST /buyers {}", body["fullName"]);
        Ok(n)
    }

    fn update(&self, id: &str, _body: &Value) -> Result<u32, TransportError> {
        println!("   -> PUT /buyers/{id}");
        Ok(self.calls.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn import(&self, bodies: &[Value]) -> Result<u32, TransportError> {
        println!("   -> POST /buyers/import ({} leads)", bodies.len());
        Ok(self.calls.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

fn gateway_example() {
    println!("3. Gateway with default budgets:");

    let registry = RateLimiterRegistry::default();
    let gateway = MutationGateway::new(&registry, DemoTransport::default());
    let caller = caller_key(Some("agent-42"));

    let raw = json!({
        "fullName": "Asha Rao", "phone": "9876543210", "city": "Mohali",
        "propertyType": "Plot", "purpose": "Buy", "timeline": ">6m", "source": "Referral"
    });
    let Value::Object(raw) = raw else { return };
    let Ok(lead) = validate(&raw) else { return };

    for i in 1..=7 {
        match gateway.create(caller, &lead) {
            Ok(n) => println!("   create {i}: stored (call #{n})"),
            Err(err @ GatewayError::BackendRateLimited { .. }) => {
                println!("   create {i}: backend said no: {err}")
            }
            Err(err) => println!("   create {i}: {err}"),
        }
    }

    println!(
        "   update still has {} calls left",
        registry.remaining_requests(Operation::Update, caller)
    );
    let _ = gateway.update(caller, "b-1", &lead);

    println!("\n{}", registry.stats());
}
