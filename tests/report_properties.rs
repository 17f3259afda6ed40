// End-to-end properties of the report, from CSV file to page views.
//
// Covered:
//   1. Cleaning idempotence over a whole file
//   2. Partition completeness for every grouping dimension
//   3. Top-N / bottom-N symmetry
//   4. Filter idempotence
//   5. Loss counting, including a file with no losses
//   6. The two-row Technology scenario
//   7. Empty-dataset histogram
//   8. Top-5 customers among single-order customers

use std::io::Write;
use superstore_report::aggregate::{
    apply, count_by, discount_histogram, sum_by, Aggregate, Dimension, Filter, Group, Measure,
};
use superstore_report::config::{Config, RowPolicy};
use superstore_report::error::LoadError;
use superstore_report::loader::{clean, load_and_clean, load_raw};
use superstore_report::pages::{render, Page, Selectors};
use superstore_report::session::Session;
use superstore_report::types::Record;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const HEADER: &str = "Row ID,Order ID,Order Date,Ship Date,Ship Mode,Customer ID,Customer Name,Segment,Region,Product ID,Category,Sub-Category,Product Name,Sales,Quantity,Discount,Profit";

/// A small slice shaped like the real Superstore export.
const ORDERS: &str = "\
1,CA-2016-152156,11/8/2016,11/11/2016,Second Class,CG-12520,Claire Gute,Consumer,South,FUR-BO-10001798,Furniture,Bookcases,Bush Somerset Collection Bookcase,$261.96,2,0,$41.91
2,CA-2016-152156,11/8/2016,11/11/2016,Second Class,CG-12520,Claire Gute,Consumer,South,FUR-CH-10000454,Furniture,Chairs,\"Hon Deluxe Fabric Upholstered Stacking Chairs, Rounded Back\",$731.94,3,0,$219.58
3,CA-2016-138688,6/12/2016,6/16/2016,Second Class,DV-13045,Darrin Van Huff,Corporate,West,OFF-LA-10000240,Office Supplies,Labels,Self-Adhesive Address Labels for Typewriters by Universal,$14.62,2,0,$6.87
4,US-2015-108966,10/11/2015,10/18/2015,Standard Class,SO-20335,Sean O'Donnell,Consumer,South,FUR-TA-10000577,Furniture,Tables,Bretford CR4500 Series Slim Rectangular Table,$957.58,5,0.45,-$383.03
5,US-2015-108966,10/11/2015,10/18/2015,Standard Class,SO-20335,Sean O'Donnell,Consumer,South,OFF-ST-10000760,Office Supplies,Storage,Eldon Fold 'N Roll Cart System,$22.37,2,0.2,$2.52
6,CA-2014-115812,6/9/2014,6/14/2014,Standard Class,BH-11710,Brosina Hoffman,Consumer,West,TEC-PH-10002275,Technology,Phones,Mitel 5320 IP Phone VoIP phone,$907.15,6,0.2,$90.72
7,CA-2017-114412,4/15/2017,4/20/2017,Standard Class,AA-10480,Andrew Allen,Consumer,Central,OFF-PA-10002365,Office Supplies,Paper,Xerox 1967,$15.55,3,0.2,$5.44
8,CA-2016-161389,12/5/2016,12/10/2016,Standard Class,IM-15070,Irene Maddox,Consumer,West,OFF-BI-10003656,Office Supplies,Binders,Fellowes PB200 Plastic Comb Binding Machine,$407.98,3,0.2,$132.59
9,CA-2017-134782,12/28/2017,1/3/2018,Standard Class,MD-17350,Maribeth Dona,Consumer,Central,OFF-BI-10000474,Office Supplies,Binders,\"GBC DocuBind P400 Electric Binding System\",\"$1,088.79\",3,0.8,\"-$1,850.95\"
10,CA-2016-108196,11/25/2016,12/2/2016,Standard Class,CS-12505,Cindy Stewart,Consumer,Central,TEC-MA-10000418,Technology,Machines,Cubify CubeX 3D Printer Double Head Print,\"$4,499.99\",5,0.7,\"-$6,599.98\"
";

fn write_csv(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "{}", HEADER).unwrap();
    write!(f, "{}", body).unwrap();
    f.flush().unwrap();
    f
}

fn load(body: &str) -> Vec<Record> {
    let f = write_csv(body);
    load_and_clean(f.path(), RowPolicy::Strict).unwrap().0
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ---------------------------------------------------------------------------
// 1. Idempotent cleaning
// ---------------------------------------------------------------------------

#[test]
fn cleaning_twice_matches_cleaning_once() {
    let f = write_csv(ORDERS);
    let raw: Vec<_> = load_raw(f.path()).unwrap().into_iter().map(Result::unwrap).collect();
    let (once, _) = clean(&raw, RowPolicy::Strict).unwrap();
    let re_raw: Vec<_> = once.iter().map(Record::to_raw).collect();
    let (twice, _) = clean(&re_raw, RowPolicy::Strict).unwrap();
    assert_eq!(once, twice);
}

// ---------------------------------------------------------------------------
// 2. Partition completeness
// ---------------------------------------------------------------------------

#[test]
fn grouped_sales_add_up_to_the_total() {
    let data = load(ORDERS);
    let total: f64 = data.iter().map(|r| r.sales).sum();
    for dim in [
        Dimension::Category,
        Dimension::SubCategory,
        Dimension::Region,
        Dimension::Month,
        Dimension::Customer,
        Dimension::LossFlag,
    ] {
        let agg = sum_by(&data, dim, Measure::Sales);
        assert!(approx(agg.total(), total), "{:?}: {} != {}", dim, agg.total(), total);
    }
}

// ---------------------------------------------------------------------------
// 3. Top-N / bottom-N symmetry
// ---------------------------------------------------------------------------

#[test]
fn bottom_n_of_negated_selects_like_top_n() {
    let data = load(ORDERS);
    let agg = sum_by(&data, Dimension::Customer, Measure::Profit);
    for n in 0..=agg.len() + 1 {
        assert_eq!(agg.negated().bottom_n(n).keys(), agg.top_n(n).keys());
    }
}

#[test]
fn bottom_n_is_top_n_reversed_for_distinct_values() {
    let agg = Aggregate {
        dimension: Dimension::Region,
        groups: ["West", "East", "Central", "South"]
            .iter()
            .zip([108418.45, 91522.78, 39706.36, 46749.43])
            .map(|(k, v)| Group { key: k.to_string(), value: v })
            .collect(),
    };
    let ranked = agg.top_n(agg.len());
    let mut top = ranked.keys();
    top.reverse();
    assert_eq!(agg.bottom_n(agg.len()).keys(), top);
}

// ---------------------------------------------------------------------------
// 4. Filter idempotence
// ---------------------------------------------------------------------------

#[test]
fn filtering_by_region_twice_is_the_same_as_once() {
    let data = load(ORDERS);
    let once = apply(&data, &[Filter::Region("South".into())]);
    let twice = apply(once.iter().copied(), &[Filter::Region("South".into())]);
    assert_eq!(once.len(), 4);
    assert_eq!(twice.len(), once.len());
    let doubled = apply(&data, &[Filter::Region("South".into()), Filter::Region("South".into())]);
    assert_eq!(doubled.len(), once.len());
}

// ---------------------------------------------------------------------------
// 5. Loss counting
// ---------------------------------------------------------------------------

#[test]
fn loss_count_matches_negative_profit() {
    let data = load(ORDERS);
    let expected = data.iter().filter(|r| r.profit < 0.0).count();
    assert_eq!(data.iter().filter(|r| r.is_loss).count(), expected);
    assert_eq!(expected, 3);

    let profitable: String = ORDERS.lines().filter(|l| !l.contains("-$")).map(|l| format!("{}\n", l)).collect();
    let data = load(&profitable);
    assert!(!data.is_empty());
    assert_eq!(data.iter().filter(|r| r.is_loss).count(), 0);
}

// ---------------------------------------------------------------------------
// 6. Technology scenario
// ---------------------------------------------------------------------------

#[test]
fn technology_sales_profit_and_losses() {
    let data = load(
        "1,CA-1,1/2/2017,1/5/2017,First Class,C-1,Ann,Consumer,West,TEC-1,Technology,Phones,Phone,$100.00,1,0,$20.00\n\
         2,CA-2,1/3/2017,1/6/2017,First Class,C-2,Bob,Consumer,West,TEC-2,Technology,Phones,Phone,$50.00,1,0,-$10.00\n",
    );
    assert_eq!(sum_by(&data, Dimension::Category, Measure::Sales).get("Technology"), Some(150.0));
    assert_eq!(sum_by(&data, Dimension::Category, Measure::Profit).get("Technology"), Some(10.0));
    assert_eq!(data.iter().filter(|r| r.is_loss).count(), 1);
}

// ---------------------------------------------------------------------------
// 7. Empty histogram
// ---------------------------------------------------------------------------

#[test]
fn empty_dataset_histogram_has_twenty_zero_buckets() {
    let data = load("");
    assert!(data.is_empty());
    let hist = discount_histogram(&data, 20, (0.0, 1.0));
    assert_eq!(hist.buckets.len(), 20);
    assert!(hist.buckets.iter().all(|b| b.total() == 0));
}

// ---------------------------------------------------------------------------
// 8. Top-5 customers with one order each
// ---------------------------------------------------------------------------

#[test]
fn top_five_single_order_customers_in_encounter_order() {
    let body: String = ["Ann", "Bob", "Cid", "Dee", "Eve", "Fay", "Gus"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                "{i},CA-{i},3/{d}/2017,3/9/2017,First Class,C-{i},{name},Consumer,East,OFF-{i},Office Supplies,Paper,Xerox {i},$10.00,1,0,$1.00\n",
                i = i + 1,
                d = i + 1,
                name = name
            )
        })
        .collect();
    let data = load(&body);
    let top = count_by(&data, Dimension::Customer).top_n(5);
    assert_eq!(top.keys(), vec!["Ann", "Bob", "Cid", "Dee", "Eve"]);
    assert!(top.groups.iter().all(|g| g.value == 1.0));
}

// ---------------------------------------------------------------------------
// Session and pages
// ---------------------------------------------------------------------------

#[test]
fn session_opens_file_and_serves_every_page() {
    let f = write_csv(ORDERS);
    let config = Config {
        data_path: f.path().to_path_buf(),
        ..Config::default()
    };
    let session = Session::open(config).unwrap();
    assert_eq!(session.records().len(), 10);
    assert_eq!(session.regions(), vec!["South", "West", "Central"]);
    assert_eq!(session.year_range(), Some((2014, 2017)));

    for page in Page::ALL {
        let view = render(&session, page, &Selectors::default()).unwrap();
        assert_eq!(view.page, page);
    }

    let selectors = Selectors {
        region: Some("Central".into()),
        year: Some(2016),
    };
    let charts = render(&session, Page::Charts, &selectors).unwrap();
    assert!(charts.warnings.is_empty());
    let sales = charts.chart_by_id("category_sales").unwrap();
    assert_eq!(sales.series[0].points.len(), 1);
    assert!(approx(sales.series[0].points[0].value, 4499.99));
}

#[test]
fn missing_file_fails_the_session() {
    let config = Config {
        data_path: "definitely/not/here.csv".into(),
        ..Config::default()
    };
    assert!(matches!(Session::open(config), Err(LoadError::NotFound(_))));
}

#[test]
fn skip_policy_surfaces_bad_rows() {
    let body = format!("{}11,CA-X,not a date,1/1/2017,First Class,C,Zed,Consumer,East,P,Furniture,Chairs,Chair,$1.00,1,0,$1.00\n", ORDERS);
    let f = write_csv(&body);
    assert!(matches!(load_and_clean(f.path(), RowPolicy::Strict), Err(LoadError::Parse { .. })));
    let (records, report) = load_and_clean(f.path(), RowPolicy::Skip).unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(report.total_rows, 11);
    assert_eq!(report.row_errors[0].row, 11);
    assert_eq!(report.row_errors[0].order_id, "CA-X");
}
