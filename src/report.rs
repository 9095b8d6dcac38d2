//! Segment counts, dataset summary and tabular output

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use polars::prelude::*;

use crate::data::{transactions_frame, Transaction};
use crate::segment::{CustomerSegment, Segment};

/// Number of customers resolved to one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentCount {
    pub segment: Segment,
    pub customers: usize,
}

/// Count customers per segment, largest first
///
/// Segments with no customers are omitted. Equal counts keep rule priority
/// order, with the catch-all segment last.
pub fn segment_counts(rows: &[CustomerSegment]) -> Vec<SegmentCount> {
    let mut counts: Vec<SegmentCount> = Segment::ALL
        .iter()
        .map(|&segment| SegmentCount {
            segment,
            customers: rows.iter().filter(|r| r.segment == segment).count(),
        })
        .filter(|c| c.customers > 0)
        .collect();
    counts.sort_by(|a, b| b.customers.cmp(&a.customers).then(a.segment.cmp(&b.segment)));
    counts
}

/// Write the per-customer classification table as CSV
pub fn write_customer_table(rows: &[CustomerSegment], output_path: &Path) -> crate::Result<()> {
    let mut frame = df!(
        "customer_id" => rows.iter().map(|r| r.customer_id.as_str()).collect::<Vec<_>>(),
        "recency" => rows.iter().map(|r| r.recency).collect::<Vec<_>>(),
        "frequency" => rows.iter().map(|r| r.frequency).collect::<Vec<_>>(),
        "monetary" => rows.iter().map(|r| r.monetary).collect::<Vec<_>>(),
        "rfm_score" => rows.iter().map(|r| r.triplet().to_string()).collect::<Vec<_>>(),
        "segment" => rows.iter().map(|r| r.segment.label()).collect::<Vec<_>>()
    )?;

    let mut file = File::create(output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    tracing::info!(rows = rows.len(), path = %output_path.display(), "wrote customer table");
    Ok(())
}

/// Revenue attributed to one value of a descriptive column
#[derive(Debug, Clone, PartialEq)]
pub struct Revenue {
    pub key: String,
    pub revenue: f64,
}

/// Exploratory aggregates over the raw transactions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSummary {
    pub transactions: usize,
    pub orders: usize,
    pub customers: usize,
    pub total_sales: f64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub by_product_line: Vec<Revenue>,
    pub by_country: Vec<Revenue>,
}

/// Label used for transactions without a descriptive value
pub const UNKNOWN_KEY: &str = "(unknown)";

/// Summarize a transaction set
pub fn summarize(transactions: &[Transaction]) -> crate::Result<DatasetSummary> {
    if transactions.is_empty() {
        return Ok(DatasetSummary::default());
    }

    let frame = transactions_frame(transactions)?;
    Ok(DatasetSummary {
        transactions: transactions.len(),
        orders: frame.column("order_id")?.n_unique()?,
        customers: frame.column("customer_id")?.n_unique()?,
        total_sales: transactions.iter().map(|t| t.amount).sum(),
        first_date: transactions.iter().map(|t| t.date).min(),
        last_date: transactions.iter().map(|t| t.date).max(),
        by_product_line: revenue_by(&frame, "product_line")?,
        by_country: revenue_by(&frame, "country")?,
    })
}

/// Sum of amounts grouped by `column`, largest revenue first
fn revenue_by(frame: &DataFrame, column: &str) -> crate::Result<Vec<Revenue>> {
    let grouped = frame
        .clone()
        .lazy()
        .group_by([col(column)])
        .agg([col("amount").sum().alias("revenue")])
        .collect()?;

    let keys = grouped.column(column)?.str()?;
    let revenue = grouped.column("revenue")?.f64()?;
    let mut rows: Vec<Revenue> = keys
        .into_iter()
        .zip(revenue.into_iter())
        .map(|(key, revenue)| Revenue {
            key: key.unwrap_or(UNKNOWN_KEY).to_string(),
            revenue: revenue.unwrap_or_default(),
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.key.cmp(&b.key)));
    Ok(rows)
}

/// Print customer counts per segment with their share of all customers
pub fn print_segment_report(counts: &[SegmentCount]) {
    let total: usize = counts.iter().map(|c| c.customers).sum();

    println!("\n=== Customer Segments ===");
    println!("  {:<28} | {:>9} | {:>6}", "Segment", "Customers", "Share");
    println!("  {:-<28}-|-{:->9}-|-{:->6}", "", "", "");
    for count in counts {
        let share = if total == 0 {
            0.0
        } else {
            count.customers as f64 / total as f64 * 100.0
        };
        println!(
            "  {:<28} | {:>9} | {:>5.1}%",
            count.segment.label(),
            count.customers,
            share
        );
    }
    println!("  Total customers: {}", total);
}

/// Print the dataset summary
pub fn print_summary(summary: &DatasetSummary) {
    println!("\n=== Dataset Summary ===");
    println!("Transactions: {}", summary.transactions);
    println!("Orders: {}", summary.orders);
    println!("Customers: {}", summary.customers);
    println!("Total sales: {:.2}", summary.total_sales);
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("Date range: {} to {}", first, last);
    }

    for (title, rows) in [
        ("Revenue by product line", &summary.by_product_line),
        ("Revenue by country", &summary.by_country),
    ] {
        println!("\n{}:", title);
        for row in rows {
            println!("  {:<24} {:>14.2}", row.key, row.revenue);
        }
    }
}
