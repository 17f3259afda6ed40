// Superstore sales report.
//
// Loads the Superstore orders export, cleans it once per session and builds
// four report pages (home, filtered charts, loss analysis, conclusions) as
// plain data: chart specifications, tables and text blocks. The binary is a
// terminal host for those pages.

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod error;
pub mod loader;
pub mod narrative;
pub mod output;
pub mod pages;
pub mod plot;
pub mod session;
pub mod types;
pub mod util;
