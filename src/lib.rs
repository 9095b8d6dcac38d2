//! SegmentForge: customer segmentation by RFM quartile scoring
//!
//! Transactions are grouped per customer into Recency, Frequency and Monetary
//! aggregates, each dimension is split into quartile scores, and the score
//! triplet (e.g. `433`) is mapped to a named segment through an ordered rule
//! table.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod segment;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::{ColumnMapping, DateOrder, SegmentConfig};
pub use data::{aggregate_customers, load_transactions, parse_date, CustomerAggregate, Transaction};
pub use error::RfmError;
pub use model::{score_customers, Quartile, RfmScore, ScoredCustomer, Triplet};
pub use report::{segment_counts, summarize, write_customer_table, DatasetSummary, SegmentCount};
pub use segment::{
    classify, classify_code, segment_customers, CustomerSegment, Segment, SegmentRule,
    SEGMENT_RULES,
};
pub use viz::create_segment_chart;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
