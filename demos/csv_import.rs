//! CSV import: partial success, error listing, and export.
//!
//! ```text
//! cargo run --example csv_import                 # built-in sample
//! cargo run --example csv_import -- leads.csv    # your own file
//! ```

use leadgate::{to_csv, BatchIngestionPipeline, IngestConfig, RowRef};
use std::fs::File;
use std::io::BufReader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SAMPLE: &str = "\
fullName,email,phone,city,propertyType,bhk,purpose,budgetMin,budgetMax,timeline,source,notes,tags,status
John Doe,john@example.com,9876543210,Chandigarh,Apartment,2,Buy,5000000,7000000,0-3m,Website,\"Looking for 2BHK\",\"urgent, family, premium\",New
Priya Sharma,,9123456780,Mohali,Villa,,Buy,9000000,12000000,3-6m,Referral,,,Qualified
R,not-an-email,12345,Delhi,Plot,,Buy,abc,,someday,Website,,,
Karan Mehta,karan@example.in,9988776655,Zirakpur,Office,,Rent,50000,40000,Exploring,Call,,,

Neha Gupta,neha@example.com,9090909090,Panchkula,Plot,,Buy,,,>6m,Walk-in,\"Corner plot, park facing\",investor,Contacted
";

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pipeline = match BatchIngestionPipeline::new(IngestConfig::default()) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("bad configuration: {err}");
            std::process::exit(1);
        }
    };

    let report = match std::env::args().nth(1) {
        Some(path) => {
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(err) => {
                    eprintln!("cannot open {path}: {err}");
                    std::process::exit(1);
                }
            };
            match pipeline.ingest_reader(BufReader::new(file)) {
                Ok(report) => report,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        }
        None => pipeline.ingest(SAMPLE),
    };

    println!("=== Import report ===");
    println!("{}\n", report.summary());

    if let Some(file_error) = report.file_rejection() {
        println!("File rejected: {} ({})", file_error.message, file_error.value);
        return;
    }

    println!("Accepted:");
    for lead in &report.accepted {
        println!(
            "  {:<16} {:<10} {:<9} {:<10} tags={:?}",
            lead.full_name,
            lead.city,
            lead.property_type,
            lead.timeline.display_name(),
            lead.tags
        );
    }

    if !report.is_clean() {
        println!("\nRejected:");
        for error in &report.rejected {
            let row = match error.row {
                Some(RowRef::Data(n)) => format!("row {n}"),
                Some(RowRef::File) | None => "file".to_string(),
            };
            println!("  {:<7} {:<12} {} (got {})", row, error.field, error.message, error.value);
        }
        println!("\nOnly valid rows will be imported.");
    }

    match to_csv(&report.accepted) {
        Ok(csv) => println!("\n=== Export ===\n{csv}"),
        Err(err) => eprintln!("export failed: {err}"),
    }

    match serde_json::to_string_pretty(&report.rejected) {
        Ok(json) => println!("=== Errors as JSON ===\n{json}"),
        Err(err) => eprintln!("cannot serialize errors: {err}"),
    }
}
