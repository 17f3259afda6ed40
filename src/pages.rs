// Page selection and the builders behind each page.
//
// Each page is a pure function of the session and the selectors. The host
// looks the page up in `PAGES`, calls the builder and renders whatever
// comes back; it never reaches into the dataset itself.

use crate::aggregate::{
    apply, count_by, count_distinct_orders_by, discount_histogram, loss_label, mean_by, smallest_records,
    sum_by, Dimension, Filter, Measure,
};
use crate::charts::{bar, grouped_bar, histogram, line, scatter, Axis, ChartSpec, TableSpec, ValueFormat};
use crate::error::ReportError;
use crate::narrative::{self, TextBlock};
use crate::session::Session;
use crate::types::{CustomerLossRow, LossLineRow, Record, RegionLossRow};
use crate::util::{format_currency, format_int, format_percent};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

pub const HISTOGRAM_BINS: usize = 20;
pub const DISCOUNT_DOMAIN: (f64, f64) = (0.0, 1.0);
const TOP_CUSTOMERS: usize = 10;
const TOP_LOSS_LINES: usize = 5;
const TOP_LOSS_SUB_CATEGORIES: usize = 10;
const TOP_LOSS_CUSTOMERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Charts,
    Losses,
    Conclusions,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::Charts, Page::Losses, Page::Conclusions];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Charts => "Charts",
            Page::Losses => "Losses",
            Page::Conclusions => "Conclusions",
        }
    }

    /// File-name friendly identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Charts => "charts",
            Page::Losses => "losses",
            Page::Conclusions => "conclusions",
        }
    }
}

/// Choices made on the charts page. Unset values fall back to the first
/// region and the earliest year. Other pages ignore them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selectors {
    pub region: Option<String>,
    pub year: Option<i32>,
}

/// The region and year actually used to filter the charts page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub region: Option<String>,
    pub year: Option<i32>,
}

impl Selection {
    pub fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(region) = &self.region {
            filters.push(Filter::Region(region.clone()));
        }
        if let Some(year) = self.year {
            filters.push(Filter::Year(year));
        }
        filters
    }

    fn caption(&self) -> String {
        let region = self.region.as_deref().unwrap_or("all regions");
        match self.year {
            Some(y) => format!("{}, {}", region, y),
            None => region.to_string(),
        }
    }
}

/// A filter combination that matched no rows. Not an error: the page still
/// renders, with every chart in its no-data state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyResultWarning {
    pub selection: Selection,
}

impl fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No orders match {}", self.selection.caption())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Block {
    Text(TextBlock),
    Chart(ChartSpec),
    Table(TableSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub page: Page,
    pub title: String,
    pub selection: Option<Selection>,
    pub blocks: Vec<Block>,
    pub warnings: Vec<EmptyResultWarning>,
}

impl PageView {
    fn new(page: Page, title: &str) -> Self {
        Self {
            page,
            title: title.to_string(),
            selection: None,
            blocks: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn text(&mut self, block: TextBlock) -> &mut Self {
        self.blocks.push(Block::Text(block));
        self
    }

    fn section(&mut self, name: &'static str) -> &mut Self {
        if let Some(block) = narrative::section(self.page, name) {
            self.blocks.push(Block::Text(block));
        }
        self
    }

    fn chart(&mut self, chart: ChartSpec) -> &mut Self {
        self.blocks.push(Block::Chart(chart.finish()));
        self
    }

    fn table(&mut self, table: TableSpec) -> &mut Self {
        self.blocks.push(Block::Table(table));
        self
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Chart(c) => Some(c),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSpec> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn chart_by_id(&self, id: &str) -> Option<&ChartSpec> {
        self.charts().find(|c| c.id == id)
    }
}

pub type PageBuilder = fn(&Session, &Selectors) -> Result<PageView, ReportError>;

/// Page dispatch table.
pub const PAGES: [(Page, PageBuilder); 4] = [
    (Page::Home, home),
    (Page::Charts, charts_page),
    (Page::Losses, losses),
    (Page::Conclusions, conclusions),
];

pub fn render(session: &Session, page: Page, selectors: &Selectors) -> Result<PageView, ReportError> {
    let (_, build) = PAGES
        .iter()
        .find(|(p, _)| *p == page)
        .ok_or(ReportError::UnregisteredPage(page.slug()))?;
    let view = build(session, selectors)?;
    debug!(page = page.slug(), blocks = view.blocks.len(), "page built");
    Ok(view)
}

/// Resolve the charts page selectors against the dataset.
pub fn resolve_selection(session: &Session, selectors: &Selectors) -> Result<Selection, ReportError> {
    let regions = session.regions();
    let region = match &selectors.region {
        Some(r) if regions.contains(r) => Some(r.clone()),
        Some(r) => return Err(ReportError::UnknownRegion(r.clone())),
        None => regions.into_iter().next(),
    };
    let year = match (selectors.year, session.year_range()) {
        (Some(year), Some((min, max))) if (min..=max).contains(&year) => Some(year),
        (Some(year), Some((min, max))) => return Err(ReportError::YearOutOfRange { year, min, max }),
        (Some(year), None) => Some(year),
        (None, range) => range.map(|(min, _)| min),
    };
    Ok(Selection { region, year })
}

fn money(label: &str) -> Axis {
    Axis::new(label, ValueFormat::Currency)
}

fn label(label: &str) -> Axis {
    Axis::new(label, ValueFormat::Label)
}

fn discount_axis() -> Axis {
    Axis::new("Discount (%)", ValueFormat::Percent)
}

fn discount_of(r: &Record) -> Option<f64> {
    Some(r.discount)
}

fn profit_of(r: &Record) -> Option<f64> {
    Some(r.profit)
}

fn home(_session: &Session, _selectors: &Selectors) -> Result<PageView, ReportError> {
    let mut view = PageView::new(Page::Home, "Home");
    view.section("intro");
    Ok(view)
}

fn charts_page(session: &Session, selectors: &Selectors) -> Result<PageView, ReportError> {
    let selection = resolve_selection(session, selectors)?;
    let rows = apply(session.records(), &selection.filters());
    let caption = selection.caption();

    let mut view = PageView::new(Page::Charts, "Sales and profit charts");
    view.text(TextBlock::heading(1, "Sales and profit charts"))
        .section("intro");

    let category_sales = sum_by(rows.iter().copied(), Dimension::Category, Measure::Sales).sorted_by_key();
    view.chart(
        bar("category_sales", &format!("Sales by category ({})", caption), &category_sales, label("Category"), money("Sales"))
            .horizontal()
            .palette("viridis")
            .with_value_labels(),
    );

    let category_profit = sum_by(rows.iter().copied(), Dimension::Category, Measure::Profit).sorted_by_key();
    view.chart(
        bar("category_profit", &format!("Profit by category ({})", caption), &category_profit, label("Category"), money("Profit"))
            .horizontal()
            .palette("coolwarm")
            .with_value_labels(),
    );

    let monthly = sum_by(rows.iter().copied(), Dimension::Month, Measure::Sales).sorted_by_key();
    view.chart(line("monthly_sales", &format!("Sales by month ({})", caption), &monthly, label("Month"), money("Sales")));

    view.chart(
        scatter(
            "discount_vs_profit",
            &format!("Discount vs profit ({})", caption),
            rows.iter().copied(),
            discount_of,
            profit_of,
            Some(Dimension::Category),
            (discount_axis(), money("Profit")),
        )
        .value_line(0.0, None),
    );

    let top_customers = count_by(rows.iter().copied(), Dimension::Customer).top_n(TOP_CUSTOMERS);
    view.chart(
        bar(
            "top_customers",
            &format!("Top {} customers by number of orders ({})", TOP_CUSTOMERS, caption),
            &top_customers,
            label("Customer"),
            Axis::new("Number of orders", ValueFormat::Count),
        )
        .horizontal()
        .palette("skyblue"),
    );

    if rows.is_empty() {
        let warning = EmptyResultWarning {
            selection: selection.clone(),
        };
        warn!(region = ?selection.region, year = ?selection.year, "filter matched no rows");
        let message = warning.to_string();
        for block in &mut view.blocks {
            if let Block::Chart(chart) = block {
                chart.mark_no_data(&message);
            }
        }
        view.blocks.insert(0, Block::Text(TextBlock::warning(message)));
        view.warnings.push(warning);
    }
    view.selection = Some(selection);
    Ok(view)
}

fn losses(session: &Session, _selectors: &Selectors) -> Result<PageView, ReportError> {
    let records = session.records();
    let loss_rows: Vec<&Record> = records.iter().filter(|r| r.is_loss).collect();

    let mut view = PageView::new(Page::Losses, "Loss-making orders");
    view.text(TextBlock::heading(1, "Loss-making orders analysis"))
        .text(TextBlock::metric("Loss-making orders", format_int(loss_rows.len())));

    let worst: Vec<LossLineRow> = smallest_records(loss_rows.iter().copied(), Measure::Profit, TOP_LOSS_LINES)
        .into_iter()
        .map(|r| LossLineRow {
            product_name: r.product_name.clone(),
            sales: format_currency(r.sales),
            profit: format_currency(r.profit),
            discount: format_percent(r.discount, 0),
        })
        .collect();
    view.table(TableSpec::from_rows(&format!("Top {} loss-making products", TOP_LOSS_LINES), &worst).gradient("Reds"))
        .section("hypotheses");

    let by_category = sum_by(loss_rows.iter().copied(), Dimension::Category, Measure::Profit);
    let by_category = by_category.bottom_n(by_category.len());
    view.chart(bar("loss_by_category", "Losses by category", &by_category, label("Category"), money("Total loss")).palette("Reds"));

    let by_sub_category = sum_by(loss_rows.iter().copied(), Dimension::SubCategory, Measure::Profit)
        .bottom_n(TOP_LOSS_SUB_CATEGORIES);
    view.chart(
        bar(
            "loss_by_sub_category",
            &format!("Top {} loss-making sub-categories", TOP_LOSS_SUB_CATEGORIES),
            &by_sub_category,
            label("Sub-Category"),
            money("Total loss"),
        )
        .palette("OrRd"),
    );

    let avg_discount = mean_by(records, Dimension::LossFlag, Measure::Discount).get(loss_label(true));
    let avg_text = avg_discount.map(|d| format_percent(d, 2)).unwrap_or_else(|| "n/a".to_string());
    view.text(TextBlock::metric("Average discount on loss-making orders", avg_text.clone()));

    let hist = discount_histogram(records, HISTOGRAM_BINS, DISCOUNT_DOMAIN);
    let mut hist_chart = histogram(
        "discount_distribution",
        "Discount distribution: profitable vs loss-making orders",
        &hist,
        discount_axis(),
    );
    if let Some(d) = avg_discount {
        hist_chart = hist_chart.key_line(d, Some(format!("Average discount on losses: {}", avg_text)));
    }
    view.chart(hist_chart);

    view.chart(
        scatter(
            "discount_vs_profit_ratio",
            "Discount vs profit ratio",
            loss_rows.iter().copied(),
            discount_of,
            Record::profit_ratio,
            None,
            (discount_axis(), Axis::new("Profit ratio (%)", ValueFormat::Percent)),
        )
        .value_line(0.0, None),
    );

    view.text(TextBlock::heading(2, "Customers and regions with losses"));
    let customers: Vec<CustomerLossRow> = sum_by(loss_rows.iter().copied(), Dimension::Customer, Measure::Profit)
        .bottom_n(TOP_LOSS_CUSTOMERS)
        .groups
        .into_iter()
        .map(|g| CustomerLossRow {
            customer_name: g.key,
            profit: format_currency(g.value),
        })
        .collect();
    view.table(TableSpec::from_rows("Top customers by losses", &customers).gradient("Reds"));

    let regions = sum_by(loss_rows.iter().copied(), Dimension::Region, Measure::Profit);
    let regions: Vec<RegionLossRow> = regions
        .bottom_n(regions.len())
        .groups
        .into_iter()
        .map(|g| RegionLossRow {
            region: g.key,
            profit: format_currency(g.value),
        })
        .collect();
    view.table(TableSpec::from_rows("Regions with losses", &regions).gradient("Reds"));
    Ok(view)
}

fn conclusions(session: &Session, _selectors: &Selectors) -> Result<PageView, ReportError> {
    let records = session.records();
    let mut view = PageView::new(Page::Conclusions, "Conclusions");
    view.text(TextBlock::heading(1, "Pet project: Superstore data analysis"))
        .section("goals");

    let sales = sum_by(records, Dimension::Category, Measure::Sales).sorted_by_key();
    let profit = sum_by(records, Dimension::Category, Measure::Profit).sorted_by_key();
    view.chart(
        grouped_bar(
            "category_sales_profit",
            "Sales and profit by category",
            &[("Sales", &sales), ("Profit", &profit)],
            label("Category"),
            money("Amount"),
        )
        .horizontal(),
    )
    .chart(bar("category_sales", "Sales by category", &sales, label("Category"), money("Sales")).horizontal())
    .section("categories");

    let region_profit = sum_by(records, Dimension::Region, Measure::Profit).sorted_by_key();
    view.chart(bar("region_profit", "Profit by region", &region_profit, label("Region"), money("Profit")).horizontal())
        .section("regions");

    let monthly = sum_by(records, Dimension::Month, Measure::Sales).sorted_by_key();
    view.chart(line("monthly_sales", "Sales by month", &monthly, label("Month"), money("Sales")))
        .section("seasonality");

    view.chart(
        scatter(
            "discount_vs_profit",
            "Discount vs profit",
            records,
            discount_of,
            profit_of,
            Some(Dimension::Category),
            (discount_axis(), money("Profit")),
        )
        .value_line(0.0, None),
    )
    .section("discounts");

    let top_customers = count_distinct_orders_by(records, Dimension::Customer).top_n(TOP_CUSTOMERS);
    view.chart(
        bar(
            "top_customers_orders",
            &format!("Top {} customers by number of orders", TOP_CUSTOMERS),
            &top_customers,
            label("Customer"),
            Axis::new("Unique orders", ValueFormat::Count),
        )
        .horizontal()
        .palette("skyblue"),
    )
    .section("customers")
    .section("key_findings")
    .table(TableSpec::from_rows("Hypotheses", &narrative::hypotheses()));
    Ok(view)
}
