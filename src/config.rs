use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATA_PATH: &str = "data/superstore.csv";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// What to do with a row whose currency, discount or date cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Fail the whole load.
    #[default]
    Strict,
    /// Drop the row and surface it as a warning.
    Skip,
}

impl FromStr for RowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(RowPolicy::Strict),
            "skip" => Ok(RowPolicy::Skip),
            other => Err(format!("unknown row policy {other:?} (expected strict or skip)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    /// Where rendered pages are exported as JSON. `None` disables export.
    pub output_dir: Option<PathBuf>,
    pub row_policy: RowPolicy,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            output_dir: None,
            row_policy: RowPolicy::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Resolve the configuration from the process: `.env`, environment
    /// variables, then the first CLI argument as the data path.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::resolve(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    /// Precedence: CLI argument, then `SUPERSTORE_*` variables, then defaults.
    pub fn resolve<F>(arg: Option<String>, var: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        if let Some(p) = var("SUPERSTORE_DATA").filter(|s| !s.trim().is_empty()) {
            cfg.data_path = PathBuf::from(p);
        }
        if let Some(p) = arg.filter(|s| !s.trim().is_empty()) {
            cfg.data_path = PathBuf::from(p);
        }
        cfg.output_dir = var("SUPERSTORE_OUTPUT_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        if let Some(p) = var("SUPERSTORE_ROW_POLICY") {
            cfg.row_policy = p.parse()?;
        }
        if let Some(level) = var("SUPERSTORE_LOG").filter(|s| !s.trim().is_empty()) {
            cfg.log_level = level;
        }
        Ok(cfg)
    }
}
