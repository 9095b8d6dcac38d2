//! SegmentForge: RFM customer segmentation CLI
//!
//! Loads transactions, classifies every customer into a segment, prints the
//! segment report and optionally writes the customer table and a chart.

use anyhow::{Context, Result};
use clap::Parser;
use segmentforge::{
    create_segment_chart, load_transactions, report, segment_counts, segment_customers,
    summarize, write_customer_table, Args,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_target(false)
        .init();

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = args.resolve_config().context("failed to load configuration")?;

    println!("=== RFM Segmentation ===\n");
    tracing::debug!(input = %args.input.display(), date_order = ?config.date_order, "loading transactions");

    let transactions = load_transactions(&args.input, &config)?;
    println!("✓ Data loaded: {} transactions", transactions.len());

    if args.summary {
        let summary = summarize(&transactions)?;
        report::print_summary(&summary);
    }

    let rows = segment_customers(&transactions)?;
    println!("✓ Customers segmented: {}", rows.len());

    let counts = segment_counts(&rows);
    report::print_segment_report(&counts);

    if let Some(output) = &args.output {
        write_customer_table(&rows, output)?;
        println!("\nCustomer table saved to: {}", output.display());
    }

    if let Some(chart) = &args.chart {
        if counts.is_empty() {
            tracing::warn!("no customers, skipping chart");
        } else {
            create_segment_chart(&counts, chart)?;
            println!("Segment chart saved to: {}", chart.display());
        }
    }

    println!(
        "\nTotal processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
