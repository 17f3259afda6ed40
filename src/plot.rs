// SVG rendering of chart descriptions.
//
// Label keys sit at integer positions along the key axis, one slot per
// distinct label. Numeric keys (scatter points, histogram bucket starts) keep
// their own coordinates. Horizontal charts swap the two axes.
use crate::charts::{ChartKind, ChartSpec, Key, Orientation};
use crate::error::ReportError;
use crate::output::format_value;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

pub const SIZE: (u32, u32) = (960, 540);

/// Share of a label slot covered by bars.
const BAR_FILL: f64 = 0.8;

const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(214, 39, 40),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

pub fn render_svg(chart: &ChartSpec) -> Result<String, ReportError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        draw(&root, chart).map_err(|e| ReportError::Plot {
            chart: chart.id.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(svg)
}

struct Layout {
    /// Distinct label keys in first-seen order. Empty when keys are numeric.
    labels: Vec<String>,
    key_range: Range<f64>,
    value_range: Range<f64>,
    /// Bar width along the key axis, in key units.
    bar_width: f64,
}

impl Layout {
    fn of(chart: &ChartSpec) -> Self {
        let points = || chart.series.iter().flat_map(|s| s.points.iter());

        let mut labels: Vec<String> = Vec::new();
        for p in points() {
            if let Key::Label(l) = &p.key {
                if !labels.contains(l) {
                    labels.push(l.clone());
                }
            }
        }

        let (key_range, bar_width) = if labels.is_empty() {
            let keys: Vec<f64> = points().map(|p| slot(&labels, &p.key)).collect();
            let width = if chart.kind == ChartKind::Scatter { 0.0 } else { smallest_gap(&keys) };
            let guides = chart.reference_lines.iter().filter(|l| l.on_key_axis).map(|l| l.at);
            let (lo, hi) = bounds(keys.iter().copied().chain(guides)).unwrap_or((0.0, 1.0));
            (padded(lo, hi + width), width)
        } else {
            (-0.5..labels.len() as f64 - 0.5, BAR_FILL)
        };

        let mut values: Vec<f64> = if chart.stacked {
            let mut totals: Vec<(f64, f64)> = Vec::new();
            for p in points() {
                let k = slot(&labels, &p.key);
                match totals.iter_mut().find(|(key, _)| *key == k) {
                    Some((_, total)) => *total += p.value,
                    None => totals.push((k, p.value)),
                }
            }
            totals.into_iter().map(|(_, v)| v).collect()
        } else {
            points().map(|p| p.value).collect()
        };
        if chart.kind != ChartKind::Scatter && chart.kind != ChartKind::Line {
            values.push(0.0);
        }
        values.extend(chart.reference_lines.iter().filter(|l| !l.on_key_axis).map(|l| l.at));
        let (lo, hi) = bounds(values.into_iter()).unwrap_or((0.0, 1.0));

        Self {
            labels,
            key_range,
            value_range: padded(lo, hi),
            bar_width,
        }
    }

    fn position(&self, key: &Key) -> f64 {
        slot(&self.labels, key)
    }

    /// Key-axis span of bar `index` out of `count` bars sharing a slot.
    fn bar_span(&self, at: f64, index: usize, count: usize) -> (f64, f64) {
        if self.labels.is_empty() {
            return (at, at + self.bar_width);
        }
        let width = self.bar_width / count.max(1) as f64;
        let start = at - self.bar_width / 2.0 + index as f64 * width;
        (start, start + width)
    }

    fn key_label(&self, v: f64, chart: &ChartSpec) -> String {
        if self.labels.is_empty() {
            return format_value(v, chart.key_axis.format);
        }
        let slot = v.round();
        if (v - slot).abs() > 1e-6 || slot < 0.0 {
            return String::new();
        }
        self.labels.get(slot as usize).cloned().unwrap_or_default()
    }
}

/// Key-axis coordinate of a key.
fn slot(labels: &[String], key: &Key) -> f64 {
    match key {
        Key::Label(l) => labels.iter().position(|x| x == l).unwrap_or(0) as f64,
        Key::Number(n) => *n,
    }
}

fn smallest_gap(keys: &[f64]) -> f64 {
    let mut sorted = keys.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted.dedup();
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(None, |min: Option<f64>, gap| Some(min.map_or(gap, |m| m.min(gap))))
        .unwrap_or(1.0)
}

fn bounds<I: Iterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn padded(lo: f64, hi: f64) -> Range<f64> {
    if hi > lo {
        let margin = (hi - lo) * 0.05;
        (lo - margin)..(hi + margin)
    } else {
        (lo - 1.0)..(hi + 1.0)
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartSpec,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    if let Some(message) = &chart.no_data {
        let (_, height) = root.dim_in_pixel();
        root.draw(&Text::new(chart.title.as_str(), (20, 20), ("sans-serif", 24).into_font()))?;
        root.draw(&Text::new(message.as_str(), (20, height as i32 / 2), ("sans-serif", 18).into_font()))?;
        return root.present();
    }

    let layout = Layout::of(chart);
    let horizontal = chart.orientation == Orientation::Horizontal && chart.kind != ChartKind::Scatter;
    let place = move |k: f64, v: f64| if horizontal { (v, k) } else { (k, v) };
    let (x_range, y_range) = if horizontal {
        (layout.value_range.clone(), layout.key_range.clone())
    } else {
        (layout.key_range.clone(), layout.value_range.clone())
    };

    let mut plot = ChartBuilder::on(root)
        .caption(chart.title.as_str(), ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(if horizontal { 180 } else { 80 })
        .build_cartesian_2d(x_range, y_range)?;

    let key_label = |v: &f64| layout.key_label(*v, chart);
    let value_label = |v: &f64| format_value(*v, chart.value_axis.format);
    let (x_fmt, y_fmt): (&dyn Fn(&f64) -> String, &dyn Fn(&f64) -> String) = if horizontal {
        (&value_label, &key_label)
    } else {
        (&key_label, &value_label)
    };
    let (x_desc, y_desc) = if horizontal {
        (&chart.value_axis.label, &chart.key_axis.label)
    } else {
        (&chart.key_axis.label, &chart.value_axis.label)
    };

    let mut mesh = plot.configure_mesh();
    mesh.disable_x_mesh()
        .x_desc(x_desc.as_str())
        .y_desc(y_desc.as_str())
        .x_label_formatter(x_fmt)
        .y_label_formatter(y_fmt);
    if !layout.labels.is_empty() {
        if horizontal {
            mesh.y_labels(layout.labels.len());
        } else {
            mesh.x_labels(layout.labels.len());
        }
    }
    mesh.draw()?;

    let with_legend = chart.series.len() > 1;
    let series_count = chart.series.len();
    let mut stack: Vec<(f64, f64)> = Vec::new();

    for (i, series) in chart.series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let anno = match chart.kind {
            ChartKind::Scatter => plot.draw_series(
                series
                    .points
                    .iter()
                    .map(|p| Circle::new(place(layout.position(&p.key), p.value), 3, color.mix(0.7).filled())),
            )?,
            ChartKind::Line => {
                let line: Vec<(f64, f64)> = series
                    .points
                    .iter()
                    .map(|p| place(layout.position(&p.key), p.value))
                    .collect();
                plot.draw_series(line.iter().map(|&at| Circle::new(at, 3, color.filled())))?;
                plot.draw_series(LineSeries::new(line, color.stroke_width(2)))?
            }
            ChartKind::Bar | ChartKind::GroupedBar | ChartKind::Histogram => {
                let (index, count) = if chart.kind == ChartKind::GroupedBar && !chart.stacked {
                    (i, series_count)
                } else {
                    (0, 1)
                };
                let mut bars = Vec::with_capacity(series.points.len());
                let mut tags = Vec::new();
                for p in &series.points {
                    let at = layout.position(&p.key);
                    let base = if chart.stacked {
                        match stack.iter_mut().find(|(k, _)| *k == at) {
                            Some((_, top)) => {
                                let base = *top;
                                *top += p.value;
                                base
                            }
                            None => {
                                stack.push((at, p.value));
                                0.0
                            }
                        }
                    } else {
                        0.0
                    };
                    let (start, end) = layout.bar_span(at, index, count);
                    let fill = if p.value < 0.0 && !with_legend { PALETTE[1] } else { color };
                    bars.push(Rectangle::new([place(start, base), place(end, base + p.value)], fill.filled()));
                    if chart.value_labels {
                        tags.push(Text::new(
                            format_value(p.value, chart.value_axis.format),
                            place((start + end) / 2.0, base + p.value),
                            ("sans-serif", 12).into_font(),
                        ));
                    }
                }
                plot.draw_series(tags)?;
                plot.draw_series(bars)?
            }
        };
        if with_legend {
            anno.label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    let mut guide_labels = false;
    for line in &chart.reference_lines {
        let ends = if line.on_key_axis {
            [place(line.at, layout.value_range.start), place(line.at, layout.value_range.end)]
        } else {
            [place(layout.key_range.start, line.at), place(layout.key_range.end, line.at)]
        };
        let anno = plot.draw_series(LineSeries::new(ends, BLACK.stroke_width(1)))?;
        if let Some(label) = &line.label {
            guide_labels = true;
            anno.label(label.as_str())
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 12, y)], BLACK.stroke_width(1)));
        }
    }

    if with_legend || guide_labels {
        plot.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    root.present()
}
