// Terminal rendering and file export of finished pages.
//
// This is the display host: it takes a `PageView` and turns it into text
// for the console, a JSON document an external renderer can pick up, and
// one SVG per chart.

use crate::charts::{ChartKind, ChartSpec, Key, TableSpec, ValueFormat};
use crate::error::ReportError;
use crate::narrative::TextBlock;
use crate::pages::{Block, PageView};
use crate::plot;
use crate::util::{format_currency, format_int, format_number, format_percent};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};
use tracing::debug;

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `<dir>/<page>.json` and return its path.
pub fn export_page(dir: &Path, view: &PageView) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(format!("{}.json", view.page.slug()));
    write_json(&path, view)?;
    Ok(path)
}

/// Draw every chart of the page to `<dir>/<page>-<chart>.svg`. Charts in
/// their no-data state are drawn too, showing the message.
pub fn export_charts(dir: &Path, view: &PageView) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::new();
    for chart in view.charts() {
        let path = dir.join(format!("{}-{}.svg", view.page.slug(), chart.id));
        let svg = plot::render_svg(chart)?;
        std::fs::write(&path, svg).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "chart exported");
        written.push(path);
    }
    Ok(written)
}

pub fn render_page(view: &PageView) -> String {
    let mut out = String::new();
    for block in &view.blocks {
        let rendered = match block {
            Block::Text(t) => render_text(t),
            Block::Chart(c) => render_chart(c),
            Block::Table(t) => render_table(t),
        };
        out.push_str(&rendered);
        out.push_str("\n\n");
    }
    out
}

pub fn render_text(block: &TextBlock) -> String {
    match block {
        TextBlock::Heading { level, text } => {
            format!("{} {}", "#".repeat((*level).max(1) as usize), text)
        }
        TextBlock::Markdown { body } => body.clone(),
        TextBlock::Metric { label, value } => format!("{}: **{}**", label, value),
        TextBlock::Warning { message } => format!("Warning: {}", message),
    }
}

pub fn render_table(table: &TableSpec) -> String {
    if table.rows.is_empty() {
        return format!("{}\n(no rows)", table.title);
    }
    let mut builder = Builder::default();
    builder.push_record(table.columns.iter().cloned());
    for row in &table.rows {
        builder.push_record(row.iter().cloned());
    }
    let mut rendered = builder.build();
    rendered.with(Style::markdown());
    format!("{}\n{}", table.title, rendered)
}

pub fn format_value(v: f64, format: ValueFormat) -> String {
    match format {
        ValueFormat::Currency => format_currency(v),
        ValueFormat::Percent => format_percent(v, 1),
        ValueFormat::Count => format_int(v.round() as i64),
        ValueFormat::Number | ValueFormat::Label => format_number(v, 2),
    }
}

fn format_key(key: &Key, format: ValueFormat) -> String {
    match key {
        Key::Label(s) => s.clone(),
        Key::Number(n) => format_value(*n, format),
    }
}

/// Text summary of a chart: one row per key, one column per series.
/// Scatter charts list each series' point count and ranges instead.
/// The drawn chart goes to SVG through [`export_charts`].
pub fn render_chart(chart: &ChartSpec) -> String {
    let mut out = format!("== {} ==\n", chart.title);
    if let Some(msg) = &chart.no_data {
        out.push_str(&format!("({})", msg));
        return out;
    }
    let table = match chart.kind {
        ChartKind::Scatter => scatter_summary(chart),
        _ => series_table(chart),
    };
    out.push_str(&render_table(&table));
    for line in &chart.reference_lines {
        let axis = if line.on_key_axis { &chart.key_axis } else { &chart.value_axis };
        out.push_str(&format!(
            "\n-- {} at {}",
            line.label.as_deref().unwrap_or("reference"),
            format_value(line.at, axis.format)
        ));
    }
    out
}

fn series_table(chart: &ChartSpec) -> TableSpec {
    let mut keys: Vec<&Key> = Vec::new();
    for p in chart.series.iter().flat_map(|s| s.points.iter()) {
        if !keys.contains(&&p.key) {
            keys.push(&p.key);
        }
    }
    let columns = std::iter::once(chart.key_axis.label.clone())
        .chain(chart.series.iter().map(|s| s.name.clone()))
        .collect();
    let rows = keys
        .into_iter()
        .map(|key| {
            std::iter::once(format_key(key, chart.key_axis.format))
                .chain(chart.series.iter().map(|s| {
                    s.points
                        .iter()
                        .find(|p| &p.key == key)
                        .map(|p| format_value(p.value, chart.value_axis.format))
                        .unwrap_or_default()
                }))
                .collect()
        })
        .collect();
    TableSpec {
        title: format!("{} by {}", chart.value_axis.label, chart.key_axis.label),
        columns,
        rows,
        gradient: None,
    }
}

fn scatter_summary(chart: &ChartSpec) -> TableSpec {
    let span = |values: Vec<f64>, format: ValueFormat| {
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo.is_finite() && hi.is_finite() {
            format!("{} to {}", format_value(lo, format), format_value(hi, format))
        } else {
            String::new()
        }
    };
    let rows = chart
        .series
        .iter()
        .map(|s| {
            let xs = s
                .points
                .iter()
                .filter_map(|p| match p.key {
                    Key::Number(x) => Some(x),
                    Key::Label(_) => None,
                })
                .collect();
            let ys = s.points.iter().map(|p| p.value).collect();
            vec![
                if s.name.is_empty() { "all".to_string() } else { s.name.clone() },
                format_int(s.points.len()),
                span(xs, chart.key_axis.format),
                span(ys, chart.value_axis.format),
            ]
        })
        .collect();
    TableSpec {
        title: format!("{} vs {}", chart.key_axis.label, chart.value_axis.label),
        columns: vec![
            "Series".to_string(),
            "Points".to_string(),
            chart.key_axis.label.clone(),
            chart.value_axis.label.clone(),
        ],
        rows,
        gradient: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{Axis, Point, Series};

    fn chart(kind: ChartKind, points: Vec<Point>) -> ChartSpec {
        ChartSpec::new("c", "Chart", kind)
            .axes(Axis::new("Category", ValueFormat::Label), Axis::new("Sales", ValueFormat::Currency))
            .series(Series {
                name: "Sales".to_string(),
                points,
            })
            .finish()
    }

    #[test]
    fn bar_summary_lists_keys_with_formatted_values() {
        let c = chart(
            ChartKind::Bar,
            vec![
                Point { key: Key::Label("Technology".into()), value: 200.0 },
                Point { key: Key::Label("Furniture".into()), value: -100.0 },
            ],
        );
        let out = render_chart(&c);
        assert!(out.starts_with("== Chart ==\n"));
        assert!(out.contains("| Category   | Sales    |"));
        assert!(out.contains("| Technology | $200.00  |"));
        assert!(out.contains("| Furniture  | -$100.00 |"));
    }

    #[test]
    fn no_data_chart_prints_message() {
        let out = render_chart(&chart(ChartKind::Line, Vec::new()));
        assert!(out.contains(crate::charts::NO_DATA));
    }

    #[test]
    fn scatter_summary_counts_points_per_series() {
        let c = ChartSpec::new("s", "Scatter", ChartKind::Scatter)
            .axes(Axis::new("Discount", ValueFormat::Percent), Axis::new("Profit", ValueFormat::Currency))
            .series(Series {
                name: "Furniture".into(),
                points: vec![
                    Point { key: Key::Number(0.0), value: 10.0 },
                    Point { key: Key::Number(0.5), value: -10.0 },
                ],
            })
            .value_line(0.0, None)
            .finish();
        let out = render_chart(&c);
        assert!(out.contains("| Furniture | 2      | 0.0% to 50.0% | -$10.00 to $10.00 |"));
        assert!(out.ends_with("-- reference at $0.00"));
    }

    #[test]
    fn tables_render_as_markdown() {
        let t = TableSpec {
            title: "Regions with losses".into(),
            columns: vec!["Region".into(), "Profit".into()],
            rows: vec![vec!["Central".into(), "-$56,499.00".into()]],
            gradient: None,
        };
        let out = render_table(&t);
        assert!(out.starts_with("Regions with losses\n"));
        assert!(out.contains("| Central | -$56,499.00 |"));
        let empty = TableSpec { rows: Vec::new(), ..t };
        assert!(render_table(&empty).ends_with("(no rows)"));
    }

    #[test]
    fn export_writes_page_json() {
        let dir = tempfile::tempdir().unwrap();
        let session = crate::session::Session::from_records(Vec::new());
        let view = crate::pages::render(&session, crate::pages::Page::Home, &Default::default()).unwrap();
        let path = export_page(&dir.path().join("pages"), &view).unwrap();
        assert!(path.ends_with("home.json"));
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["page"], "home");
        assert_eq!(json["blocks"][0]["type"], "text");
        assert_eq!(json["blocks"][0]["content"]["kind"], "markdown");
    }

    #[test]
    fn export_draws_one_svg_per_chart() {
        let dir = tempfile::tempdir().unwrap();
        let session = crate::session::Session::from_records(Vec::new());
        let view = crate::pages::render(&session, crate::pages::Page::Charts, &Default::default()).unwrap();
        let paths = export_charts(dir.path(), &view).unwrap();
        assert_eq!(paths.len(), view.charts().count());
        assert!(paths[0].ends_with("charts-category_sales.svg"));
        let svg = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(svg.starts_with("<svg"));
    }
}
