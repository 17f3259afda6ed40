// Grouping, filtering and ranking over the cleaned dataset.
//
// Every function here is pure: it borrows records and returns a fresh
// result. Group order is always the order in which a key is first
// encountered, which is also the tie-break used by `Aggregate::top_n` and
// `Aggregate::bottom_n`.

use crate::types::{Record, SummaryStats};
use crate::util::mean as mean_of;
use serde::Serialize;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A predicate over records. A list of filters is conjunctive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Filter {
    Region(String),
    Year(i32),
}

impl Filter {
    pub fn matches(&self, r: &Record) -> bool {
        match self {
            Filter::Region(region) => r.region == *region,
            Filter::Year(year) => r.year() == *year,
        }
    }
}

/// Keep the records that satisfy every filter. An empty result is valid.
pub fn apply<'a, I>(rows: I, filters: &[Filter]) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    rows.into_iter()
        .filter(|r| filters.iter().all(|f| f.matches(r)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    Category,
    SubCategory,
    Region,
    Month,
    Customer,
    LossFlag,
}

impl Dimension {
    pub fn key<'r>(&self, r: &'r Record) -> Cow<'r, str> {
        match self {
            Dimension::Category => Cow::Borrowed(r.category.as_str()),
            Dimension::SubCategory => Cow::Borrowed(r.sub_category.as_str()),
            Dimension::Region => Cow::Borrowed(r.region.as_str()),
            Dimension::Month => Cow::Owned(r.month_label()),
            Dimension::Customer => Cow::Borrowed(r.customer_name.as_str()),
            Dimension::LossFlag => Cow::Borrowed(loss_label(r.is_loss)),
        }
    }
}

pub fn loss_label(is_loss: bool) -> &'static str {
    if is_loss {
        "Loss"
    } else {
        "Profit"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Measure {
    Sales,
    Profit,
    Discount,
}

impl Measure {
    pub fn value(&self, r: &Record) -> f64 {
        match self {
            Measure::Sales => r.sales,
            Measure::Profit => r.profit,
            Measure::Discount => r.discount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: String,
    pub value: f64,
}

/// Grouped numeric summary along one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub dimension: Dimension,
    pub groups: Vec<Group>,
}

impl Aggregate {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.groups.iter().find(|g| g.key == key).map(|g| g.value)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.key.as_str()).collect()
    }

    pub fn total(&self) -> f64 {
        self.groups.iter().map(|g| g.value).sum()
    }

    /// Largest `n` groups, descending. Ties keep encounter order.
    pub fn top_n(&self, n: usize) -> Aggregate {
        self.ranked(n, |a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal))
    }

    /// Smallest `n` groups, ascending. Ties keep encounter order.
    pub fn bottom_n(&self, n: usize) -> Aggregate {
        self.ranked(n, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Groups ordered by key: alphabetical for names, chronological for months.
    pub fn sorted_by_key(&self) -> Aggregate {
        let mut groups = self.groups.clone();
        groups.sort_by(|a, b| a.key.cmp(&b.key));
        Aggregate {
            dimension: self.dimension,
            groups,
        }
    }

    pub fn negated(&self) -> Aggregate {
        Aggregate {
            dimension: self.dimension,
            groups: self
                .groups
                .iter()
                .map(|g| Group {
                    key: g.key.clone(),
                    value: -g.value,
                })
                .collect(),
        }
    }

    fn ranked<F>(&self, n: usize, cmp: F) -> Aggregate
    where
        F: Fn(&f64, &f64) -> Ordering,
    {
        let mut groups = self.groups.clone();
        // `sort_by` is stable, which gives the encounter-order tie-break.
        groups.sort_by(|a, b| cmp(&a.value, &b.value));
        groups.truncate(n);
        Aggregate {
            dimension: self.dimension,
            groups,
        }
    }
}

/// Fold records into per-key accumulators, keeping first-encounter order.
fn fold_groups<'a, I, A, F>(rows: I, dimension: Dimension, mut fold: F) -> Vec<(String, A)>
where
    I: IntoIterator<Item = &'a Record>,
    A: Default,
    F: FnMut(&mut A, &'a Record),
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<(String, A)> = Vec::new();
    for r in rows {
        let key = dimension.key(r);
        let slot = match index.get(key.as_ref()) {
            Some(&i) => i,
            None => {
                let key = key.into_owned();
                index.insert(key.clone(), out.len());
                out.push((key, A::default()));
                out.len() - 1
            }
        };
        fold(&mut out[slot].1, r);
    }
    out
}

fn into_aggregate<A, F>(dimension: Dimension, folded: Vec<(String, A)>, finish: F) -> Aggregate
where
    F: Fn(A) -> f64,
{
    Aggregate {
        dimension,
        groups: folded
            .into_iter()
            .map(|(key, acc)| Group {
                key,
                value: finish(acc),
            })
            .collect(),
    }
}

pub fn sum_by<'a, I>(rows: I, dimension: Dimension, measure: Measure) -> Aggregate
where
    I: IntoIterator<Item = &'a Record>,
{
    let folded = fold_groups(rows, dimension, |acc: &mut f64, r| *acc += measure.value(r));
    into_aggregate(dimension, folded, |v| v)
}

/// Number of records (order lines) per group.
pub fn count_by<'a, I>(rows: I, dimension: Dimension) -> Aggregate
where
    I: IntoIterator<Item = &'a Record>,
{
    let folded = fold_groups(rows, dimension, |acc: &mut usize, _| *acc += 1);
    into_aggregate(dimension, folded, |n| n as f64)
}

/// Number of distinct order ids per group.
pub fn count_distinct_orders_by<'a, I>(rows: I, dimension: Dimension) -> Aggregate
where
    I: IntoIterator<Item = &'a Record>,
{
    let folded = fold_groups(rows, dimension, |acc: &mut HashSet<&'a str>, r| {
        acc.insert(r.order_id.as_str());
    });
    into_aggregate(dimension, folded, |ids| ids.len() as f64)
}

pub fn mean_by<'a, I>(rows: I, dimension: Dimension, measure: Measure) -> Aggregate
where
    I: IntoIterator<Item = &'a Record>,
{
    let folded = fold_groups(rows, dimension, |acc: &mut (f64, usize), r| {
        acc.0 += measure.value(r);
        acc.1 += 1;
    });
    // Groups only exist once a record has been folded in, so `n >= 1`.
    into_aggregate(dimension, folded, |(sum, n)| sum / n as f64)
}

/// Mean of a measure over all rows; `None` when there are none.
pub fn mean<'a, I>(rows: I, measure: Measure) -> Option<f64>
where
    I: IntoIterator<Item = &'a Record>,
{
    let values: Vec<f64> = rows.into_iter().map(|r| measure.value(r)).collect();
    mean_of(&values)
}

/// Distinct keys of a dimension in encounter order.
pub fn distinct<'a, I>(rows: I, dimension: Dimension) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    fold_groups(rows, dimension, |_: &mut (), _| ())
        .into_iter()
        .map(|(key, _)| key)
        .collect()
}

/// The `n` records with the smallest value of `measure`, ascending.
pub fn smallest_records<'a, I>(rows: I, measure: Measure, n: usize) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut rows: Vec<&Record> = rows.into_iter().collect();
    rows.sort_by(|a, b| {
        measure
            .value(a)
            .partial_cmp(&measure.value(b))
            .unwrap_or(Ordering::Equal)
    });
    rows.truncate(n);
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub start: f64,
    pub end: f64,
    pub profitable: usize,
    pub loss: usize,
}

impl Bucket {
    pub fn total(&self) -> usize {
        self.profitable + self.loss
    }
}

/// Fixed-bin discount distribution, split by the loss flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub domain: (f64, f64),
    pub buckets: Vec<Bucket>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.buckets.iter().map(Bucket::total).sum()
    }
}

/// Count discounts into `bins` equal-width buckets over `domain`.
///
/// Always returns exactly `bins` buckets (at least one). The last bucket is
/// closed on the right; values outside the domain are not counted.
pub fn discount_histogram<'a, I>(rows: I, bins: usize, domain: (f64, f64)) -> Histogram
where
    I: IntoIterator<Item = &'a Record>,
{
    let bins = bins.max(1);
    let (lo, hi) = domain;
    let span = hi - lo;
    let width = span / bins as f64;
    let mut buckets: Vec<Bucket> = (0..bins)
        .map(|i| Bucket {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            profitable: 0,
            loss: 0,
        })
        .collect();

    for r in rows {
        let v = r.discount;
        if !(lo..=hi).contains(&v) {
            continue;
        }
        let idx = if span > 0.0 {
            (((v - lo) / span * bins as f64).floor() as usize).min(bins - 1)
        } else {
            0
        };
        if r.is_loss {
            buckets[idx].loss += 1;
        } else {
            buckets[idx].profitable += 1;
        }
    }
    Histogram { domain, buckets }
}

pub fn summarize(data: &[Record]) -> SummaryStats {
    let orders: HashSet<&str> = data.iter().map(|r| r.order_id.as_str()).collect();
    let customers: HashSet<&str> = data.iter().map(|r| r.customer_name.as_str()).collect();
    let losses: Vec<&Record> = data.iter().filter(|r| r.is_loss).collect();
    SummaryStats {
        total_lines: data.len(),
        total_orders: orders.len(),
        total_customers: customers.len(),
        total_sales: data.iter().map(|r| r.sales).sum(),
        total_profit: data.iter().map(|r| r.profit).sum(),
        loss_lines: losses.len(),
        avg_loss_discount: mean(losses.iter().copied(), Measure::Discount),
        first_year: data.iter().map(Record::year).min(),
        last_year: data.iter().map(Record::year).max(),
    }
}
