//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::config::{DateOrder, SegmentConfig};

/// Customer segmentation CLI using quartile-based RFM scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "sales_data.csv")]
    pub input: PathBuf,

    /// Write the per-customer segment table to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save a bar chart of customers per segment to this PNG file
    #[arg(short, long)]
    pub chart: Option<PathBuf>,

    /// TOML file with column names and date order
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Read dates as MM/DD/YY(YY) instead of DD/MM/YY(YY)
    #[arg(long)]
    pub month_first: bool,

    /// Print dataset totals and revenue breakdowns before segmenting
    #[arg(long)]
    pub summary: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Load the config file (if any) and apply CLI overrides
    pub fn resolve_config(&self) -> crate::Result<SegmentConfig> {
        let mut config = SegmentConfig::load(self.config.as_deref())?;
        if self.month_first {
            config.date_order = DateOrder::MonthFirst;
        }
        Ok(config)
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "segmentforge",
            "-i",
            "orders.csv",
            "-o",
            "segments.csv",
            "--month-first",
            "-v",
        ]);

        assert_eq!(args.input, PathBuf::from("orders.csv"));
        assert_eq!(args.output, Some(PathBuf::from("segments.csv")));
        assert_eq!(args.chart, None);
        assert!(args.month_first);
        assert!(!args.summary);
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["segmentforge"]);
        assert_eq!(args.input, PathBuf::from("sales_data.csv"));
        assert_eq!(args.log_filter(), "info");
        assert_eq!(args.resolve_config().unwrap(), SegmentConfig::default());
    }

    #[test]
    fn test_flag_overrides_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "date_order = \"day_first\"").unwrap();
        writeln!(file, "[columns]\ncustomer_id = \"CustomerID\"").unwrap();

        let path = file.path().to_str().unwrap();
        let args = Args::parse_from(["segmentforge", "--config", path, "--month-first"]);
        let config = args.resolve_config().unwrap();

        assert_eq!(config.date_order, DateOrder::MonthFirst);
        assert_eq!(config.columns.customer_id, "CustomerID");
    }
}
