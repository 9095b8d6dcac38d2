//! Configuration file support
//!
//! An optional TOML file maps the dataset's column names onto transaction
//! fields and selects the date field order. Every field has a default that
//! matches the classic `sales_data_sample.csv` export, so an absent file or an
//! empty one both work. CLI flags take precedence over file values.
//!
//! ```toml
//! date_order = "day_first"
//!
//! [columns]
//! order_id = "ORDERNUMBER"
//! customer_id = "CUSTOMERNAME"
//! amount = "SALES"
//! date = "ORDERDATE"
//! product_line = "PRODUCTLINE"
//! country = "COUNTRY"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Order of the day and month fields in a date such as `03/04/2004`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `DD/MM/YY` or `DD/MM/YYYY`
    #[default]
    DayFirst,
    /// `MM/DD/YY` or `MM/DD/YYYY`
    MonthFirst,
}

/// Column names of the input CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub order_id: String,
    pub customer_id: String,
    pub amount: String,
    pub date: String,
    /// Optional descriptive column, only used by the dataset summary
    pub product_line: String,
    /// Optional descriptive column, only used by the dataset summary
    pub country: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            order_id: "ORDERNUMBER".to_string(),
            customer_id: "CUSTOMERNAME".to_string(),
            amount: "SALES".to_string(),
            date: "ORDERDATE".to_string(),
            product_line: "PRODUCTLINE".to_string(),
            country: "COUNTRY".to_string(),
        }
    }
}

/// Loader configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentConfig {
    pub columns: ColumnMapping,
    pub date_order: DateOrder,
}

impl SegmentConfig {
    /// Load a config file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse a config from TOML text
    pub fn from_toml(raw: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Required column names must be non-empty and distinct
    pub fn validate(&self) -> crate::Result<()> {
        let c = &self.columns;
        let required = [
            ("order_id", &c.order_id),
            ("customer_id", &c.customer_id),
            ("amount", &c.amount),
            ("date", &c.date),
        ];

        for (field, name) in &required {
            if name.trim().is_empty() {
                anyhow::bail!("columns.{} must not be empty", field);
            }
        }
        for (i, (field, name)) in required.iter().enumerate() {
            if let Some((other, _)) = required[i + 1..].iter().find(|(_, n)| n == name) {
                anyhow::bail!(
                    "columns.{} and columns.{} both map to '{}'",
                    field,
                    other,
                    name
                );
            }
        }
        Ok(())
    }
}
