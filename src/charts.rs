// Chart and table descriptions handed to the display host.
//
// Nothing here draws anything. A `ChartSpec` says what kind of chart to
// draw, which values go on which axis and how to label them; the host
// decides how to render it.

use crate::aggregate::{loss_label, Aggregate, Dimension, Histogram};
use crate::types::Record;
use serde::Serialize;
use tabled::Tabled;

pub const NO_DATA: &str = "No data for the current selection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    GroupedBar,
    Line,
    Scatter,
    Histogram,
}

/// Which way the value axis runs for bar charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Label,
    Number,
    Currency,
    Count,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub label: String,
    pub format: ValueFormat,
}

impl Axis {
    pub fn new(label: impl Into<String>, format: ValueFormat) -> Self {
        Self {
            label: label.into(),
            format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Key {
    Label(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub key: Key,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn from_aggregate(name: impl Into<String>, agg: &Aggregate) -> Self {
        Self {
            name: name.into(),
            points: agg
                .groups
                .iter()
                .map(|g| Point {
                    key: Key::Label(g.key.clone()),
                    value: g.value,
                })
                .collect(),
        }
    }
}

/// A dashed guide line across the plot, e.g. zero profit or a mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    /// `true` for a line at a key-axis position, `false` for a value-axis position.
    pub on_key_axis: bool,
    pub at: f64,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub orientation: Orientation,
    pub key_axis: Axis,
    pub value_axis: Axis,
    pub palette: Option<String>,
    pub value_labels: bool,
    pub stacked: bool,
    pub series: Vec<Series>,
    pub reference_lines: Vec<ReferenceLine>,
    /// Set when there is nothing to plot; the host shows this instead.
    pub no_data: Option<String>,
}

impl ChartSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            orientation: Orientation::Vertical,
            key_axis: Axis::new("", ValueFormat::Label),
            value_axis: Axis::new("", ValueFormat::Number),
            palette: None,
            value_labels: false,
            stacked: false,
            series: Vec::new(),
            reference_lines: Vec::new(),
            no_data: None,
        }
    }

    pub fn axes(mut self, key: Axis, value: Axis) -> Self {
        self.key_axis = key;
        self.value_axis = value;
        self
    }

    pub fn horizontal(mut self) -> Self {
        self.orientation = Orientation::Horizontal;
        self
    }

    pub fn palette(mut self, palette: &str) -> Self {
        self.palette = Some(palette.to_string());
        self
    }

    pub fn with_value_labels(mut self) -> Self {
        self.value_labels = true;
        self
    }

    pub fn stacked(mut self) -> Self {
        self.stacked = true;
        self
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn value_line(mut self, at: f64, label: Option<String>) -> Self {
        self.reference_lines.push(ReferenceLine {
            on_key_axis: false,
            at,
            label,
        });
        self
    }

    pub fn key_line(mut self, at: f64, label: Option<String>) -> Self {
        self.reference_lines.push(ReferenceLine {
            on_key_axis: true,
            at,
            label,
        });
        self
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// Mark the chart empty if no series carries a point. Call last.
    pub fn finish(mut self) -> Self {
        if self.no_data.is_none() && self.point_count() == 0 {
            self.no_data = Some(NO_DATA.to_string());
        }
        self
    }

    pub fn mark_no_data(&mut self, message: &str) {
        self.no_data = Some(message.to_string());
    }
}

pub fn bar(id: &str, title: &str, agg: &Aggregate, key: Axis, value: Axis) -> ChartSpec {
    ChartSpec::new(id, title, ChartKind::Bar)
        .axes(key, value.clone())
        .series(Series::from_aggregate(value.label, agg))
}

pub fn grouped_bar(id: &str, title: &str, series: &[(&str, &Aggregate)], key: Axis, value: Axis) -> ChartSpec {
    series
        .iter()
        .fold(ChartSpec::new(id, title, ChartKind::GroupedBar).axes(key, value), |chart, (name, agg)| {
            chart.series(Series::from_aggregate(*name, agg))
        })
}

pub fn line(id: &str, title: &str, agg: &Aggregate, key: Axis, value: Axis) -> ChartSpec {
    ChartSpec::new(id, title, ChartKind::Line)
        .axes(key, value.clone())
        .series(Series::from_aggregate(value.label, agg))
}

/// One point per record; records for which `x` or `y` is undefined are left out.
/// With a `hue`, each distinct key of that dimension becomes its own series.
pub fn scatter<'a, I, X, Y>(
    id: &str,
    title: &str,
    rows: I,
    x: X,
    y: Y,
    hue: Option<Dimension>,
    axes: (Axis, Axis),
) -> ChartSpec
where
    I: IntoIterator<Item = &'a Record>,
    X: Fn(&Record) -> Option<f64>,
    Y: Fn(&Record) -> Option<f64>,
{
    let mut series: Vec<Series> = Vec::new();
    for r in rows {
        let (Some(px), Some(py)) = (x(r), y(r)) else {
            continue;
        };
        let name = hue.map(|d| d.key(r).into_owned()).unwrap_or_default();
        let point = Point {
            key: Key::Number(px),
            value: py,
        };
        match series.iter().position(|s| s.name == name) {
            Some(i) => series[i].points.push(point),
            None => series.push(Series {
                name,
                points: vec![point],
            }),
        }
    }
    let (key, value) = axes;
    series
        .into_iter()
        .fold(ChartSpec::new(id, title, ChartKind::Scatter).axes(key, value), ChartSpec::series)
}

/// Stacked histogram with one series per loss flag.
pub fn histogram(id: &str, title: &str, hist: &Histogram, key: Axis) -> ChartSpec {
    let split = |is_loss: bool| Series {
        name: loss_label(is_loss).to_string(),
        points: hist
            .buckets
            .iter()
            .map(|b| Point {
                key: Key::Number(b.start),
                value: (if is_loss { b.loss } else { b.profitable }) as f64,
            })
            .collect(),
    };
    ChartSpec::new(id, title, ChartKind::Histogram)
        .axes(key, Axis::new("Frequency", ValueFormat::Count))
        .stacked()
        .series(split(false))
        .series(split(true))
}

/// A rendered table: header plus already-formatted cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Colour scale hint for the host, e.g. `Reds`.
    pub gradient: Option<String>,
}

impl TableSpec {
    pub fn from_rows<T: Tabled>(title: &str, rows: &[T]) -> Self {
        Self {
            title: title.to_string(),
            columns: T::headers().into_iter().map(|h| h.into_owned()).collect(),
            rows: rows
                .iter()
                .map(|r| r.fields().into_iter().map(|f| f.into_owned()).collect())
                .collect(),
            gradient: None,
        }
    }

    pub fn gradient(mut self, scale: &str) -> Self {
        self.gradient = Some(scale.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{discount_histogram, Group};
    use crate::types::RegionLossRow;

    fn agg(pairs: &[(&str, f64)]) -> Aggregate {
        Aggregate {
            dimension: Dimension::Category,
            groups: pairs
                .iter()
                .map(|(k, v)| Group {
                    key: k.to_string(),
                    value: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn bar_maps_groups_to_points() {
        let chart = bar(
            "sales",
            "Sales by category",
            &agg(&[("Furniture", 10.0), ("Technology", 20.0)]),
            Axis::new("Category", ValueFormat::Label),
            Axis::new("Sales", ValueFormat::Currency),
        )
        .horizontal()
        .finish();
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.orientation, Orientation::Horizontal);
        assert_eq!(chart.series[0].points.len(), 2);
        assert_eq!(chart.series[0].points[1].key, Key::Label("Technology".into()));
        assert!(chart.no_data.is_none());
    }

    #[test]
    fn empty_aggregate_marks_no_data() {
        let chart = line(
            "monthly",
            "Sales by month",
            &agg(&[]),
            Axis::new("Month", ValueFormat::Label),
            Axis::new("Sales", ValueFormat::Currency),
        )
        .finish();
        assert_eq!(chart.no_data.as_deref(), Some(NO_DATA));
    }

    #[test]
    fn empty_histogram_still_has_every_bucket() {
        let hist = discount_histogram(std::iter::empty::<&Record>(), 20, (0.0, 1.0));
        let chart = histogram("discounts", "Discounts", &hist, Axis::new("Discount", ValueFormat::Percent)).finish();
        assert_eq!(chart.series.len(), 2);
        assert!(chart.series.iter().all(|s| s.points.len() == 20));
        assert!(chart.series.iter().flat_map(|s| &s.points).all(|p| p.value == 0.0));
        assert!(chart.no_data.is_none());
    }

    #[test]
    fn table_from_tabled_rows() {
        let rows = vec![RegionLossRow {
            region: "Central".to_string(),
            profit: "-$56,499.00".to_string(),
        }];
        let table = TableSpec::from_rows("Regions", &rows).gradient("Reds");
        assert_eq!(table.columns, vec!["Region", "Profit"]);
        assert_eq!(table.rows, vec![vec!["Central".to_string(), "-$56,499.00".to_string()]]);
        assert_eq!(table.gradient.as_deref(), Some("Reds"));
    }
}
