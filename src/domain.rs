use std::io::Error;
use std::path::PathBuf;

use clap::Parser;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::pagination::PAGE_SIZE_OPTIONS;
use crate::truncate::DEFAULT_MAX_LENGTH;

#[derive(Debug, Error)]
pub enum LeadTableError {
    #[error("io error: {0}")]
    Io(#[from] Error),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("unknown file type")]
    UnknownFileType,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("terminal error: {0}")]
    Terminal(String),
}

/// Command line of the viewer.
#[derive(Debug, Parser)]
#[command(name = "leadtable", version, about = "Page through follow-up records in the terminal")]
pub struct Cli {
    /// CSV, Parquet or Arrow file to open
    pub path: String,

    /// Records per page
    #[arg(long, default_value_t = PAGE_SIZE_OPTIONS[1])]
    pub page_size: usize,

    /// Default number of characters shown per cell before truncation
    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// Column holding the unique record id
    #[arg(long, default_value = "id")]
    pub id_column: String,

    /// Columns holding follow-up timestamps
    #[arg(long = "followup-column", default_values_t = ["follow_up".to_string(), "next_follow_up".to_string()])]
    pub followup_columns: Vec<String>,

    /// Event poll time in milliseconds
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    /// Where tracing output is written
    #[arg(long, default_value = "leadtable.log")]
    pub log_file: String,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub path: PathBuf,
    pub page_size: usize,
    pub max_length: usize,
    pub id_column: String,
    pub followup_columns: Vec<String>,
    pub event_poll_time: u64,
    pub log_file: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            page_size: PAGE_SIZE_OPTIONS[1],
            max_length: DEFAULT_MAX_LENGTH,
            id_column: "id".to_string(),
            followup_columns: vec!["follow_up".to_string(), "next_follow_up".to_string()],
            event_poll_time: 100,
            log_file: PathBuf::from("leadtable.log"),
        }
    }
}

impl TryFrom<Cli> for ViewerConfig {
    type Error = LeadTableError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.page_size == 0 {
            return Err(LeadTableError::InvalidConfig(
                "page size must be at least 1".into(),
            ));
        }
        if cli.poll_ms == 0 {
            return Err(LeadTableError::InvalidConfig(
                "poll time must be at least 1ms".into(),
            ));
        }
        Ok(Self {
            path: expand_path(&cli.path)?,
            page_size: cli.page_size,
            max_length: cli.max_length,
            id_column: cli.id_column,
            followup_columns: cli.followup_columns,
            event_poll_time: cli.poll_ms,
            log_file: expand_path(&cli.log_file)?,
        })
    }
}

fn expand_path(raw: &str) -> Result<PathBuf, LeadTableError> {
    shellexpand::full(raw)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| LeadTableError::InvalidConfig(format!("cannot expand {raw}: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Search,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    LargerPageSize,
    SmallerPageSize,
    ToggleSort,
    HideColumn,
    ShowAllColumns,
    Search,
    ClearSearch,
    CopyCell,
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
 leadtable

 Navigation
   ←↓↑→ / hjkl   move selection
   n / p         next / previous page
   g / G         first / last page
   + / -         larger / smaller page size

 Columns
   s             sort by column (asc ⇄ desc)
   x             hide column
   a             show all columns

 Records
   /             search
   c             clear search
   y             copy full cell text

   ?             this help
   Esc           close popup
   q             quit
";

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(page_size: usize, poll_ms: u64) -> Cli {
        Cli {
            path: "leads.csv".into(),
            page_size,
            max_length: 25,
            id_column: "id".into(),
            followup_columns: vec!["follow_up".into()],
            poll_ms,
            log_file: "leadtable.log".into(),
        }
    }

    #[test]
    fn config_from_valid_cli() {
        let config = ViewerConfig::try_from(cli(50, 100)).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.path, PathBuf::from("leads.csv"));
        assert_eq!(config.followup_columns, vec!["follow_up".to_string()]);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = ViewerConfig::try_from(cli(0, 100)).unwrap_err();
        assert!(matches!(err, LeadTableError::InvalidConfig(_)));
    }

    #[test]
    fn zero_poll_time_is_rejected() {
        assert!(ViewerConfig::try_from(cli(25, 0)).is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["leadtable", "leads.csv"]);
        assert_eq!(cli.page_size, 25);
        assert_eq!(cli.max_length, 25);
        assert_eq!(cli.followup_columns, vec!["follow_up", "next_follow_up"]);
    }
}
