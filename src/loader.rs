use crate::config::RowPolicy;
use crate::error::{LoadError, ParseError};
use crate::types::{RawRow, Record, REQUIRED_COLUMNS};
use crate::util::{excel_serial_date, parse_currency, parse_fraction, parse_order_date};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions read as spreadsheet workbooks. Anything else is read as CSV.
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Column reported when a whole record cannot be decoded.
pub const RECORD_COLUMN: &str = "<record>";

/// A source row, or the reason it could not be decoded.
pub type SourceRow = Result<RawRow, ParseError>;

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Rows dropped under [`RowPolicy::Skip`]. Always empty under `Strict`.
    pub row_errors: Vec<ParseError>,
}

/// Read every row of the source file, in file order, without interpreting values.
///
/// Only a missing file, an unreadable file or header, and a missing required
/// column fail the read. A single row that cannot be decoded comes back as
/// an `Err` in its slot so the row policy can decide what to do with it.
pub fn load_raw(path: &Path) -> Result<Vec<SourceRow>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let rows = if is_workbook(path) {
        read_workbook(path)?
    } else {
        read_csv(path)?
    };
    debug!(rows = rows.len(), path = %path.display(), "read source rows");
    Ok(rows)
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

/// Check the header and return the position of the order id column.
fn check_columns(path: &Path, headers: &StringRecord) -> Result<usize, LoadError> {
    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|c| !headers.iter().any(|h| h == *c))
    {
        return Err(LoadError::MissingColumn {
            path: path.to_path_buf(),
            column,
        });
    }
    Ok(headers.iter().position(|h| h == "Order ID").unwrap_or(0))
}

fn decode(row: usize, headers: &StringRecord, order_col: usize, record: &StringRecord) -> SourceRow {
    record.deserialize::<RawRow>(Some(headers)).map_err(|e| ParseError {
        row,
        order_id: record.get(order_col).unwrap_or_default().to_string(),
        column: RECORD_COLUMN,
        value: e.to_string(),
    })
}

fn read_csv(path: &Path) -> Result<Vec<SourceRow>, LoadError> {
    let unreadable = |source| LoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(unreadable)?;

    let headers = rdr.headers().map_err(unreadable)?.clone();
    let order_col = check_columns(path, &headers)?;

    let mut rows = Vec::new();
    for (idx, result) in rdr.byte_records().enumerate() {
        let bytes = result.map_err(unreadable)?;
        let row = idx + 1;
        let decoded = match StringRecord::from_byte_record(bytes) {
            Ok(record) => decode(row, &headers, order_col, &record),
            Err(e) => {
                let value = e.to_string();
                let bytes = e.into_byte_record();
                Err(ParseError {
                    row,
                    order_id: bytes
                        .get(order_col)
                        .map(|b| String::from_utf8_lossy(b).into_owned())
                        .unwrap_or_default(),
                    column: RECORD_COLUMN,
                    value,
                })
            }
        };
        rows.push(decoded);
    }
    Ok(rows)
}

/// Read the first worksheet. The first row is the header.
fn read_workbook(path: &Path) -> Result<Vec<SourceRow>, LoadError> {
    let workbook_error = |source| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet(path.to_path_buf()))?
        .map_err(workbook_error)?;

    let mut cells = range.rows();
    let headers: StringRecord = cells
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    let order_col = check_columns(path, &headers)?;
    let date_col = headers.iter().position(|h| h == "Order Date");

    Ok(cells
        .enumerate()
        .map(|(idx, r)| {
            let record: StringRecord = r
                .iter()
                .enumerate()
                .map(|(col, c)| if Some(col) == date_col { date_text(c) } else { cell_text(c) })
                .collect();
            decode(idx + 1, &headers, order_col, &record)
        })
        .collect())
}

/// Text form of a cell, in a shape the cleaner's parsers accept.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| v.to_string()),
        Data::DateTimeIso(v) | Data::DurationIso(v) => v.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

/// Order dates may arrive as date cells or as bare serial day numbers.
fn date_text(cell: &Data) -> String {
    let date = match cell {
        Data::DateTime(v) => v.as_datetime().map(|dt| dt.date()),
        Data::Float(v) => excel_serial_date(*v),
        Data::Int(v) => excel_serial_date(*v as f64),
        _ => None,
    };
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => cell_text(cell),
    }
}

/// Turn one raw row into a typed [`Record`]. `row` is the 1-based data row.
pub fn clean_row(row: usize, raw: &RawRow) -> Result<Record, ParseError> {
    let fail = |column: &'static str, value: &str| ParseError {
        row,
        order_id: raw.order_id.clone(),
        column,
        value: value.to_string(),
    };

    let sales = parse_currency(&raw.sales).ok_or_else(|| fail("Sales", &raw.sales))?;
    let profit = parse_currency(&raw.profit).ok_or_else(|| fail("Profit", &raw.profit))?;
    let discount = parse_fraction(&raw.discount).ok_or_else(|| fail("Discount", &raw.discount))?;
    let order_date =
        parse_order_date(&raw.order_date).ok_or_else(|| fail("Order Date", &raw.order_date))?;
    let order_month = NaiveDate::from_ymd_opt(order_date.year(), order_date.month(), 1)
        .ok_or_else(|| fail("Order Date", &raw.order_date))?;

    Ok(Record {
        order_id: raw.order_id.clone(),
        order_date,
        customer_name: raw.customer_name.clone(),
        region: raw.region.clone(),
        category: raw.category.clone(),
        sub_category: raw.sub_category.clone(),
        product_name: raw.product_name.clone(),
        sales,
        discount,
        profit,
        is_loss: profit < 0.0,
        order_month,
    })
}

/// Clean all rows under the given policy.
///
/// `Strict` stops at the first bad row. `Skip` drops bad rows, logs each one
/// and returns them alongside the kept records.
pub fn clean(raw: &[RawRow], policy: RowPolicy) -> Result<(Vec<Record>, Vec<ParseError>), ParseError> {
    clean_rows(raw.iter().map(Ok), policy)
}

fn clean_rows<'a, I>(rows: I, policy: RowPolicy) -> Result<(Vec<Record>, Vec<ParseError>), ParseError>
where
    I: IntoIterator<Item = Result<&'a RawRow, ParseError>>,
{
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (idx, row) in rows.into_iter().enumerate() {
        match row.and_then(|raw| clean_row(idx + 1, raw)) {
            Ok(r) => records.push(r),
            Err(e) => match policy {
                RowPolicy::Strict => return Err(e),
                RowPolicy::Skip => {
                    warn!(row = e.row, order_id = %e.order_id, column = e.column, value = %e.value, "skipping unparsable row");
                    skipped.push(e);
                }
            },
        }
    }
    Ok((records, skipped))
}

pub fn load_and_clean(path: &Path, policy: RowPolicy) -> Result<(Vec<Record>, LoadReport), LoadError> {
    let rows = load_raw(path)?;
    let (records, row_errors) = clean_rows(rows.iter().map(|r| r.as_ref().map_err(|e| e.clone())), policy)
        .map_err(|source| LoadError::Parse {
            path: PathBuf::from(path),
            source,
        })?;
    let report = LoadReport {
        total_rows: rows.len(),
        kept_rows: records.len(),
        row_errors,
    };
    Ok((records, report))
}
