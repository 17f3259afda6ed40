// Parsing and formatting helpers.
//
// Everything that touches the text representation of the source file lives
// here so the rest of the crate works with typed values only.
use chrono::{Days, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Date layouts seen in Superstore exports, tried in order.
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// Parse a locale-formatted currency value such as `$1,234.50`, `-$10.00`
/// or `($10.00)`.
///
/// - Trims whitespace and strips `$` and `,`.
/// - Rejects alphabetic characters, so `inf`/`NaN` never sneak through.
/// - Returns `None` for anything that is not a finite number.
pub fn parse_currency(s: &str) -> Option<f64> {
    let s = s.trim();
    let (negated, body) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let cleaned: String = body.chars().filter(|c| *c != '$' && *c != ',').collect();
    let v = parse_plain(&cleaned)?;
    Some(if negated { -v } else { v })
}

/// Parse a discount. Plain fractions pass through; `35%` becomes `0.35`.
pub fn parse_fraction(s: &str) -> Option<f64> {
    let s = s.trim();
    match s.strip_suffix('%') {
        Some(pct) => parse_plain(pct).map(|v| v / 100.0),
        None => parse_plain(s),
    }
}

fn parse_plain(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_order_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Spreadsheet serial day number (1900 date system) to a calendar date.
/// The time-of-day fraction is dropped.
pub fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals, then `num-format` for the thousands separators of the
    // integer part.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_val: i64 = parts.next().unwrap_or("0").parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// `$1,234.50` / `-$10.00`.
pub fn format_currency(n: f64) -> String {
    let s = format_number(n, 2);
    match s.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", s),
    }
}

/// Fractions are stored as 0.0–1.0 and only turned into percentages here.
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, fraction * 100.0)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
