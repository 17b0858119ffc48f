// Chipset History - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod record;
pub mod period;
pub mod history;
pub mod config;
pub mod comparator;
pub mod ingest;
pub mod present;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use error::{Error, Result};
pub use record::{ChipsetRecord, DEFAULT_IDENTIFIER_FIELD};
pub use period::PeriodKey;
pub use history::{ChipsetHistory, ManualEntry};
pub use config::{CompareOptions, Config, IngestOptions, RemovalScope};
pub use comparator::{compare, ChangeEvent, ChangeKind, ChangeReport, HistoryComparator};
pub use ingest::{load_history, load_period_file, read_period};
pub use present::{NumberedTable, ReportTables};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
