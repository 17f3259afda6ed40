// Static commentary shown alongside the charts.
//
// These texts were written once against the full Superstore dataset and are
// emitted verbatim. They are keyed by page and section only and never read
// live data.

use crate::pages::Page;
use crate::types::HypothesisRow;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextBlock {
    Heading { level: u8, text: String },
    Markdown { body: String },
    Metric { label: String, value: String },
    Warning { message: String },
}

impl TextBlock {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        TextBlock::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn markdown(body: impl Into<String>) -> Self {
        TextBlock::Markdown { body: body.into() }
    }

    pub fn metric(label: impl Into<String>, value: impl Into<String>) -> Self {
        TextBlock::Metric {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        TextBlock::Warning {
            message: message.into(),
        }
    }
}

const HOME_INTRO: &str = "\
# Hi there!

This is a pet project analysing the **Tableau Superstore** dataset.

Inside you will find:
- sales and profit charts
- top customers
- seasonality
- interactive filters

Use the page menu to navigate.";

const CHARTS_INTRO: &str = "Pick a region and a year to filter the data.";

const LOSSES_HYPOTHESES: &str = "\
## Hypotheses

1. **Discounts above 50% almost always lead to a loss.**
   Example: the Cubify CubeX 3D Printer sold at a 70% discount for $4,500 lost $6,600.
2. **Losses cluster around 3D printers and binding systems.**
   For example: GBC DocuBind P400, Lexmark MX611dhe.
3. **Margins on some products cannot absorb such large discounts.**
   Profitability should be recalculated and either prices or the discount policy adjusted.
4. **Some customers or regions receive unjustifiably high discounts.**
   This can be checked by filtering the data by customer and region.";

const GOALS: &str = "\
## Project goal

Analyse the `Tableau Superstore` dataset in order to:
- understand the structure of sales
- find the categories and regions with the highest and lowest profit
- measure the effect of discounts on profit
- formulate hypotheses for improving the business";

const CATEGORIES: &str = "\
## What the charts show

**Total profit by category:**
- Technology is the most profitable category (~145,000)
- Office Supplies is second (~120,000)
- Furniture lags far behind (~20,000)

**Total sales by category:**
- Technology leads (~850,000)
- Office Supplies is second by volume (~720,000)
- Furniture also sells a lot (~750,000) but earns little

## Conclusions

**1. Sales versus profit.** Technology combines high sales with a high margin and is a stable source of \
income. Office Supplies sells slightly less than Technology and is moderately profitable. Furniture sells \
well but on a thin margin, which points at pricing or cost problems.

**2. Why Furniture earns so little.** Production or delivery costs may be high, deep discounts may be used \
to attract customers, and the pricing policy for the category may need a review.

**3. Technology as the key category.** High sales and profit, likely thanks to high-margin electronics. \
It may be worth investing more in this category.

**4. Office Supplies as the balance point.** A medium profit level, possibly due to a more competitive \
market or low-margin items.

## Hypotheses for further analysis

**How can Furniture become more profitable?**
- Raise prices on low-margin items.
- Optimise logistics and storage.
- Focus on the more expensive and profitable furniture sub-categories.

**Can Office Supplies sell more?**
- A/B test pricing strategies.
- Improve marketing campaigns for the category.
- Develop new products or services around office supplies.";

const REGIONS: &str = "\
## What the chart shows

**Sales by region:** West leads (~720,000), East is second (~680,000), Central third (~500,000) and South \
has the lowest sales (~400,000).

**Profit by region:** West is the most profitable (~105,000), East second (~90,000), Central third \
(~40,000) and South the least profitable (~45,000).

## Conclusions

**1. Strong regions.** West leads on both sales and profit, possibly thanks to population density, demand \
or effective marketing. East is second on both and seems to have a large, steady customer base.

**2. Weak regions.** South has low sales and low profit: fewer buyers, weaker demand or an ineffective \
pricing policy. Central sells more than South but earns less than East and West, which suggests high \
costs or low-margin goods.

**3. Sales versus profit.** West shows the best balance between volume and profit. East does well too. \
South and Central have low margins and need attention.

## Hypotheses for further analysis

**How can Central and South earn more?**
- Adjust pricing to widen margins.
- Improve logistics and cut costs.
- Focus on the most profitable product categories.

**Can East become more efficient?**
- A/B test pricing strategies.
- Invest more in marketing to attract new customers.
- Adopt the practices that work in West.";

const SEASONALITY: &str = "\
## What the chart shows

Monthly sales from 2013 to 2017 follow a seasonal pattern: growth towards the end of each year and a dip \
at the start of the next. Overall sales grow over time, with high volatility between peaks and troughs. \
The highest months fall at the end of the year (e.g. December), the lowest in January and February.

## Conclusions

**1. Seasonality.** The year-end rise is likely driven by the holiday season; the early-year dip may be \
customers buying ahead of the holidays or waiting for new products.

**2. Growth.** Sales rise steadily across the period, which indicates a growing business and customer base.

**3. Volatility.** Large swings may come from seasonal promotions, changes in logistics or short-lived \
discounts.";

const DISCOUNTS: &str = "\
## What the chart shows

The x axis is the discount given to the customer, the y axis the profit of the order line, and colours \
mark the product category. Points above the dashed zero line made money, points below it lost money.

## Conclusions

**1. Discount and profit are correlated.** Above a 0.4–0.5 discount profit falls; above 0.6 most points \
are below zero.

**2. Where losses begin.** Around 0.6–0.7 most points of every category cross the zero line: at \
discounts above 60–70% the company loses money.

**3. Categories differ.** Technology stays profitable even at high discounts. Furniture is the most \
sensitive and often loses money at medium discounts (0.4–0.5). Office Supplies behaves like Furniture \
but is less sensitive.

## Hypotheses to test

- The higher the discount, the more likely a loss.
- There is an optimal discount level beyond which profit drops sharply (perhaps 0–0.3).
- Each category has its own optimal discount level.
- Technology's higher margins let it absorb large discounts; other categories cannot.
- Very high discounts (> 0.7) always lead to a loss, with possible exceptions for a few products.";

const CUSTOMERS: &str = "\
## What the chart shows

**Key customers.** Emily Phan placed 17 orders, the most of any customer, and may be a corporate buyer \
or a frequent shopper. Others (Rick Bensley, Noel Staavos, Joel Eaton, ...) placed 12–13 orders each.

**Distribution.** Similar order counts across these customers suggest stable demand.

## Hypotheses for further analysis

**How do we keep key customers?**
- Personalised offers for top customers.
- A loyalty programme for frequent buyers.
- Service packages tailored to their needs.

**Can other customers order more often?**
- A/B test marketing strategies for active customers.
- Improve logistics and delivery.
- Special promotions for customers who order less often.";

const KEY_FINDINGS: &str = "\
## Key findings

1. **Technology** is the most profitable category (~$145,000).
2. **Furniture** sells well but earns little (~$20,000): its margin is too thin.
3. **West** is the most profitable region.
4. **Discounts above 60–70%** turn orders into losses.
5. **Emily Phan** leads by number of orders (17), which may indicate corporate activity.";

const HYPOTHESES: [&str; 5] = [
    "Losses start at discounts above 50%",
    "Furniture losses are driven by logistics and storage",
    "South can be made more profitable through marketing",
    "Tables and binding systems need a pricing review",
    "Year-end sales growth can be forecast and prepared for in advance",
];

static NARRATIVE: Lazy<HashMap<(Page, &'static str), &'static str>> = Lazy::new(|| {
    HashMap::from([
        ((Page::Home, "intro"), HOME_INTRO),
        ((Page::Charts, "intro"), CHARTS_INTRO),
        ((Page::Losses, "hypotheses"), LOSSES_HYPOTHESES),
        ((Page::Conclusions, "goals"), GOALS),
        ((Page::Conclusions, "categories"), CATEGORIES),
        ((Page::Conclusions, "regions"), REGIONS),
        ((Page::Conclusions, "seasonality"), SEASONALITY),
        ((Page::Conclusions, "discounts"), DISCOUNTS),
        ((Page::Conclusions, "customers"), CUSTOMERS),
        ((Page::Conclusions, "key_findings"), KEY_FINDINGS),
    ])
});

/// The fixed text of one section of a page, or `None` if the page has no such section.
pub fn section(page: Page, name: &'static str) -> Option<TextBlock> {
    NARRATIVE
        .get(&(page, name))
        .map(|body| TextBlock::markdown(*body))
}

pub fn hypotheses() -> Vec<HypothesisRow> {
    HYPOTHESES
        .iter()
        .enumerate()
        .map(|(i, h)| HypothesisRow {
            number: i + 1,
            hypothesis: h.to_string(),
        })
        .collect()
}
