//! Transaction loading and per-customer RFM aggregation using Polars

use std::path::Path;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, NaiveTime};
use polars::prelude::*;

use crate::config::{DateOrder, SegmentConfig};
use crate::error::RfmError;

/// One sales record
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub order_id: String,
    pub customer_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub product_line: Option<String>,
    pub country: Option<String>,
}

impl Transaction {
    /// Transaction without descriptive fields
    pub fn new(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            amount,
            date,
            product_line: None,
            country: None,
        }
    }
}

/// Recency, frequency and monetary totals for one customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerAggregate {
    pub customer_id: String,
    /// Days between this customer's latest order and the dataset's latest order
    pub recency: i64,
    /// Distinct orders placed
    pub frequency: u64,
    /// Sum of amounts, rounded to the nearest integer
    pub monetary: i64,
    pub last_order: NaiveDate,
}

/// Parse a `DD/MM/YY` or `DD/MM/YYYY` date (or the month-first variants).
///
/// The year width selects the format, so `03` is never read as year 3.
/// A trailing time of day such as `0:00` is accepted and ignored.
pub fn parse_date(value: &str, order: DateOrder) -> Option<NaiveDate> {
    let mut parts = value.split_whitespace();
    let date = parts.next()?;
    if let Some(time) = parts.next() {
        let is_time = NaiveTime::parse_from_str(time, "%H:%M").is_ok()
            || NaiveTime::parse_from_str(time, "%H:%M:%S").is_ok();
        if !is_time {
            return None;
        }
    }
    if parts.next().is_some() {
        return None;
    }

    let year = date.rsplit('/').next()?;
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year_spec = match year.len() {
        2 => "%y",
        4 => "%Y",
        _ => return None,
    };
    let format = match order {
        DateOrder::DayFirst => format!("%d/%m/{year_spec}"),
        DateOrder::MonthFirst => format!("%m/%d/{year_spec}"),
    };
    NaiveDate::parse_from_str(date, &format).ok()
}

/// Load and validate transactions from a CSV file
///
/// Every column is read as text and validated here, so a malformed record
/// fails the load with its row number instead of being dropped.
pub fn load_transactions(path: &Path, config: &SegmentConfig) -> crate::Result<Vec<Transaction>> {
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read CSV file {}", path.display()))?;

    tracing::debug!(
        rows = frame.height(),
        columns = frame.width(),
        "read transaction file"
    );
    transactions_from_frame(&frame, config)
}

/// Validate a raw text frame into transactions
pub fn transactions_from_frame(
    frame: &DataFrame,
    config: &SegmentConfig,
) -> crate::Result<Vec<Transaction>> {
    let columns = &config.columns;
    let order_ids = required_text(frame, &columns.order_id)?;
    let customer_ids = required_text(frame, &columns.customer_id)?;
    let amounts = required_text(frame, &columns.amount)?;
    let dates = required_text(frame, &columns.date)?;
    let product_lines = optional_text(frame, &columns.product_line)?;
    let countries = optional_text(frame, &columns.country)?;

    let mut transactions = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        let row = i + 1;

        let customer_id = non_blank(&customer_ids[i]).ok_or(RfmError::MissingCustomer { row })?;
        let order_id = non_blank(&order_ids[i]).ok_or(RfmError::MissingOrder { row })?;

        let raw_amount = amounts[i].as_deref().unwrap_or_default();
        let amount = raw_amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .ok_or_else(|| RfmError::InvalidAmount {
                row,
                value: raw_amount.to_string(),
            })?;

        let raw_date = dates[i].as_deref().unwrap_or_default();
        let date = parse_date(raw_date, config.date_order).ok_or_else(|| {
            RfmError::MalformedDate {
                row,
                value: raw_date.to_string(),
            }
        })?;

        transactions.push(Transaction {
            order_id,
            customer_id,
            amount,
            date,
            product_line: product_lines.as_ref().and_then(|v| non_blank(&v[i])),
            country: countries.as_ref().and_then(|v| non_blank(&v[i])),
        });
    }

    Ok(transactions)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn optional_text(frame: &DataFrame, name: &str) -> crate::Result<Option<Vec<Option<String>>>> {
    let Ok(series) = frame.column(name) else {
        return Ok(None);
    };
    let series = series.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(Some(values))
}

fn required_text(frame: &DataFrame, name: &str) -> crate::Result<Vec<Option<String>>> {
    optional_text(frame, name)?.ok_or_else(|| RfmError::MissingColumn(name.to_string()).into())
}

/// Build the typed transaction frame shared by aggregation and the summary.
///
/// Dates are stored as day numbers so the lazy aggregations stay integral.
pub(crate) fn transactions_frame(transactions: &[Transaction]) -> crate::Result<DataFrame> {
    let frame = df!(
        "customer_id" => transactions.iter().map(|t| t.customer_id.as_str()).collect::<Vec<_>>(),
        "order_id" => transactions.iter().map(|t| t.order_id.as_str()).collect::<Vec<_>>(),
        "amount" => transactions.iter().map(|t| t.amount).collect::<Vec<_>>(),
        "day" => transactions.iter().map(|t| t.date.num_days_from_ce()).collect::<Vec<_>>(),
        "product_line" => transactions.iter().map(|t| t.product_line.as_deref()).collect::<Vec<_>>(),
        "country" => transactions.iter().map(|t| t.country.as_deref()).collect::<Vec<_>>()
    )?;
    Ok(frame)
}

/// Group transactions by customer and compute recency, frequency and monetary
///
/// Recency is measured against the latest date across all transactions.
/// The result is sorted by customer identifier; an empty input yields an
/// empty result.
pub fn aggregate_customers(transactions: &[Transaction]) -> crate::Result<Vec<CustomerAggregate>> {
    let Some(latest) = transactions.iter().map(|t| t.date).max() else {
        tracing::warn!("no transactions to aggregate");
        return Ok(Vec::new());
    };

    let grouped = transactions_frame(transactions)?
        .lazy()
        .group_by([col("customer_id")])
        .agg([
            col("amount").sum().alias("monetary"),
            col("order_id").n_unique().alias("frequency"),
            col("day").max().alias("last_day"),
        ])
        .collect()?;

    let ids = grouped.column("customer_id")?.str()?;
    let monetary = grouped.column("monetary")?.f64()?;
    let frequency = grouped.column("frequency")?.cast(&DataType::UInt64)?;
    let frequency = frequency.u64()?;
    let last_day = grouped.column("last_day")?.i32()?;

    let latest_day = latest.num_days_from_ce();
    let mut customers = Vec::with_capacity(grouped.height());
    for i in 0..grouped.height() {
        let (Some(id), Some(total), Some(orders), Some(day)) =
            (ids.get(i), monetary.get(i), frequency.get(i), last_day.get(i))
        else {
            anyhow::bail!("customer aggregation produced a null value at row {}", i);
        };
        let last_order = NaiveDate::from_num_days_from_ce_opt(day)
            .with_context(|| format!("day number {} is out of range", day))?;

        customers.push(CustomerAggregate {
            customer_id: id.to_string(),
            recency: i64::from(latest_day - day),
            frequency: orders,
            monetary: total.round() as i64,
            last_order,
        });
    }
    customers.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));

    tracing::info!(
        customers = customers.len(),
        transactions = transactions.len(),
        latest = %latest,
        "aggregated customers"
    );
    Ok(customers)
}
