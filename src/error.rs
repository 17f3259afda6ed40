use std::path::PathBuf;
use thiserror::Error;

/// A single field of a single row that could not be coerced.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {row} (order {order_id}): cannot parse {column} value {value:?}")]
pub struct ParseError {
    /// 1-based data row (the header is not counted).
    pub row: usize,
    pub order_id: String,
    pub column: &'static str,
    pub value: String,
}

/// Fatal errors raised while opening, reading or cleaning the source file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {} has no worksheet", .0.display())]
    NoWorksheet(PathBuf),

    #[error("{} is missing required column {column:?}", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("failed to clean {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Errors raised while building or exporting a page.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unknown region {0:?}")]
    UnknownRegion(String),

    #[error("year {year} is outside the dataset range {min}..={max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to draw chart {chart}: {message}")]
    Plot { chart: String, message: String },

    #[error("no builder registered for page {0}")]
    UnregisteredPage(&'static str),

    #[error("failed to serialize page: {0}")]
    Json(#[from] serde_json::Error),
}
