use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Column names the source file must carry. Other columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "Order ID",
    "Order Date",
    "Customer Name",
    "Region",
    "Category",
    "Sub-Category",
    "Product Name",
    "Sales",
    "Discount",
    "Profit",
];

/// One row exactly as it appears in the source file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawRow {
    #[serde(rename = "Order ID")]
    pub order_id: String,
    #[serde(rename = "Order Date")]
    pub order_date: String,
    #[serde(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Sub-Category")]
    pub sub_category: String,
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Sales")]
    pub sales: String,
    #[serde(rename = "Discount")]
    pub discount: String,
    #[serde(rename = "Profit")]
    pub profit: String,
}

/// A cleaned transaction line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub customer_name: String,
    pub region: String,
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    pub sales: f64,
    pub discount: f64,
    pub profit: f64,
    pub is_loss: bool,
    /// First day of the order's calendar month.
    pub order_month: NaiveDate,
}

impl Record {
    pub fn year(&self) -> i32 {
        self.order_date.year()
    }

    /// `YYYY-MM` label of the order month.
    pub fn month_label(&self) -> String {
        self.order_month.format("%Y-%m").to_string()
    }

    /// Profit per unit of sales. Undefined for zero sales.
    pub fn profit_ratio(&self) -> Option<f64> {
        if self.sales == 0.0 {
            None
        } else {
            Some(self.profit / self.sales)
        }
    }

    /// Render the record back into source form using plain numbers and ISO dates.
    pub fn to_raw(&self) -> RawRow {
        RawRow {
            order_id: self.order_id.clone(),
            order_date: self.order_date.format("%Y-%m-%d").to_string(),
            customer_name: self.customer_name.clone(),
            region: self.region.clone(),
            category: self.category.clone(),
            sub_category: self.sub_category.clone(),
            product_name: self.product_name.clone(),
            sales: self.sales.to_string(),
            discount: self.discount.to_string(),
            profit: self.profit.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LossLineRow {
    #[serde(rename = "Product Name")]
    #[tabled(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Sales")]
    #[tabled(rename = "Sales")]
    pub sales: String,
    #[serde(rename = "Profit")]
    #[tabled(rename = "Profit")]
    pub profit: String,
    #[serde(rename = "Discount")]
    #[tabled(rename = "Discount")]
    pub discount: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CustomerLossRow {
    #[serde(rename = "Customer Name")]
    #[tabled(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Profit")]
    #[tabled(rename = "Profit")]
    pub profit: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionLossRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Profit")]
    #[tabled(rename = "Profit")]
    pub profit: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HypothesisRow {
    #[tabled(rename = "No.")]
    pub number: usize,
    #[tabled(rename = "Hypothesis")]
    pub hypothesis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_lines: usize,
    pub total_orders: usize,
    pub total_customers: usize,
    pub total_sales: f64,
    pub total_profit: f64,
    pub loss_lines: usize,
    pub avg_loss_discount: Option<f64>,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sales: f64, profit: f64) -> Record {
        let date = NaiveDate::from_ymd_opt(2016, 11, 8).unwrap();
        Record {
            order_id: "CA-2016-152156".to_string(),
            order_date: date,
            customer_name: "Claire Gute".to_string(),
            region: "South".to_string(),
            category: "Furniture".to_string(),
            sub_category: "Bookcases".to_string(),
            product_name: "Bush Somerset Collection Bookcase".to_string(),
            sales,
            discount: 0.0,
            profit,
            is_loss: profit < 0.0,
            order_month: NaiveDate::from_ymd_opt(2016, 11, 1).unwrap(),
        }
    }

    #[test]
    fn profit_ratio_excludes_zero_sales() {
        assert_eq!(record(200.0, 50.0).profit_ratio(), Some(0.25));
        assert_eq!(record(0.0, -3.0).profit_ratio(), None);
    }

    #[test]
    fn month_label_is_year_and_month() {
        assert_eq!(record(1.0, 1.0).month_label(), "2016-11");
        assert_eq!(record(1.0, 1.0).year(), 2016);
    }

    #[test]
    fn to_raw_uses_plain_numbers_and_iso_dates() {
        let raw = record(1234.5, -10.25).to_raw();
        assert_eq!(raw.sales, "1234.5");
        assert_eq!(raw.profit, "-10.25");
        assert_eq!(raw.order_date, "2016-11-08");
    }
}
