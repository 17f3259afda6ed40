// Terminal host for the report.
//
// The session is loaded once at startup. After that the user picks a page
// from the menu; the charts page additionally asks for a region and a year.
// Every pick rebuilds the page from the session and prints it, and, when an
// output directory is configured, exports it as JSON with one SVG per chart.
use std::io::{self, Write};
use std::process::ExitCode;
use superstore_report::config::Config;
use superstore_report::output;
use superstore_report::pages::{self, Page, Selectors};
use superstore_report::session::Session;
use superstore_report::util;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(default_level: &str) {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(level))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Print `prompt` and read one trimmed line. `None` on end of input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn choose_page() -> Option<Option<Page>> {
    println!("Select page:");
    for (i, page) in Page::ALL.iter().enumerate() {
        println!("[{}] {}", i + 1, page.title());
    }
    println!("[0] Exit\n");
    loop {
        let choice = read_line("Enter choice: ")?;
        match choice.parse::<usize>() {
            Ok(0) => return Some(None),
            Ok(n) if n <= Page::ALL.len() => return Some(Some(Page::ALL[n - 1])),
            _ => println!("Invalid choice. Please enter 0-{}.", Page::ALL.len()),
        }
    }
}

/// Ask for the charts page region and year. Blank input keeps the default.
fn choose_selectors(session: &Session) -> Option<Selectors> {
    let mut selectors = Selectors::default();
    let regions = session.regions();
    if !regions.is_empty() {
        println!("Select region:");
        for (i, r) in regions.iter().enumerate() {
            println!("[{}] {}", i + 1, r);
        }
        loop {
            let choice = read_line(&format!("Enter choice [{}]: ", regions[0]))?;
            if choice.is_empty() {
                break;
            }
            match choice.parse::<usize>() {
                Ok(n) if (1..=regions.len()).contains(&n) => {
                    selectors.region = Some(regions[n - 1].clone());
                    break;
                }
                _ => println!("Invalid choice. Please enter 1-{}.", regions.len()),
            }
        }
    }
    if let Some((min, max)) = session.year_range() {
        loop {
            let choice = read_line(&format!("Select year {}-{} [{}]: ", min, max, min))?;
            if choice.is_empty() {
                break;
            }
            match choice.parse::<i32>() {
                Ok(y) if (min..=max).contains(&y) => {
                    selectors.year = Some(y);
                    break;
                }
                _ => println!("Invalid year. Please enter a year between {} and {}.", min, max),
            }
        }
    }
    Some(selectors)
}

fn show(session: &Session, page: Page, selectors: &Selectors) {
    let view = match pages::render(session, page, selectors) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            return;
        }
    };
    println!("\n{}", output::render_page(&view));
    if let Some(dir) = &session.config().output_dir {
        match output::export_page(dir, &view) {
            Ok(path) => println!("(Page exported to {})", path.display()),
            Err(e) => error!(error = %e, "page export failed"),
        }
        match output::export_charts(dir, &view) {
            Ok(paths) => println!("({} chart(s) drawn to {})\n", paths.len(), dir.display()),
            Err(e) => error!(error = %e, "chart export failed"),
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::from(1);
        }
    };
    init_tracing(&config.log_level);

    let session = match Session::open(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load file: {}", e);
            return ExitCode::from(2);
        }
    };

    let report = session.load_report();
    println!(
        "Processing dataset... ({} rows loaded, {} kept)",
        util::format_int(report.total_rows),
        util::format_int(report.kept_rows)
    );
    for e in &report.row_errors {
        println!("Warning: skipped {}", e);
    }
    println!();

    if let Some(dir) = &session.config().output_dir {
        let summary = session.summary();
        let written = std::fs::create_dir_all(dir)
            .map_err(|source| superstore_report::error::ReportError::Write {
                path: dir.clone(),
                source,
            })
            .and_then(|_| output::write_json(&dir.join("summary.json"), &summary));
        if let Err(e) = written {
            error!(error = %e, "summary export failed");
        }
    }

    loop {
        let page = match choose_page() {
            Some(Some(p)) => p,
            Some(None) | None => break,
        };
        let selectors = if page == Page::Charts {
            match choose_selectors(&session) {
                Some(s) => s,
                None => break,
            }
        } else {
            Selectors::default()
        };
        info!(page = page.slug(), "rendering page");
        show(&session, page, &selectors);
    }
    println!("Exiting the program.");
    ExitCode::SUCCESS
}
