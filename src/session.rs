use crate::aggregate::{distinct, summarize, Dimension};
use crate::config::Config;
use crate::error::LoadError;
use crate::loader::{load_and_clean, LoadReport};
use crate::types::{Record, SummaryStats};
use tracing::{info, warn};

/// Everything a page needs, built once when the session starts and only
/// read afterwards.
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    records: Vec<Record>,
    report: LoadReport,
}

impl Session {
    pub fn open(config: Config) -> Result<Self, LoadError> {
        let (records, report) = load_and_clean(&config.data_path, config.row_policy)?;
        info!(
            path = %config.data_path.display(),
            rows = report.total_rows,
            kept = report.kept_rows,
            "dataset loaded"
        );
        if !report.row_errors.is_empty() {
            warn!(skipped = report.row_errors.len(), "rows skipped while cleaning");
        }
        Ok(Self {
            config,
            records,
            report,
        })
    }

    /// A session over records that are already clean.
    pub fn from_records(records: Vec<Record>) -> Self {
        let report = LoadReport {
            total_rows: records.len(),
            kept_rows: records.len(),
            row_errors: Vec::new(),
        };
        Self {
            config: Config::default(),
            records,
            report,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Region choices for the charts page, in first-seen order.
    pub fn regions(&self) -> Vec<String> {
        distinct(&self.records, Dimension::Region)
    }

    /// Earliest and latest order year; `None` for an empty dataset.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(Record::year).min()?;
        let max = self.records.iter().map(Record::year).max()?;
        Some((min, max))
    }

    pub fn summary(&self) -> SummaryStats {
        summarize(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawRow;

    fn record(region: &str, date: &str, profit: &str) -> Record {
        let raw = RawRow {
            order_id: "CA-1".into(),
            order_date: date.into(),
            customer_name: "Ann".into(),
            region: region.into(),
            category: "Furniture".into(),
            sub_category: "Chairs".into(),
            product_name: "Chair".into(),
            sales: "$10.00".into(),
            discount: "0".into(),
            profit: profit.into(),
        };
        crate::loader::clean_row(1, &raw).unwrap()
    }

    #[test]
    fn regions_and_years_follow_the_data() {
        let s = Session::from_records(vec![
            record("West", "3/1/2016", "$1.00"),
            record("East", "3/1/2014", "-$2.00"),
            record("West", "3/1/2017", "$1.00"),
        ]);
        assert_eq!(s.regions(), vec!["West", "East"]);
        assert_eq!(s.year_range(), Some((2014, 2017)));
        assert_eq!(s.load_report().kept_rows, 3);
        assert_eq!(s.summary().loss_lines, 1);
    }

    #[test]
    fn empty_session_has_no_year_range() {
        let s = Session::from_records(Vec::new());
        assert!(s.regions().is_empty());
        assert_eq!(s.year_range(), None);
    }
}
