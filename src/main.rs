use anyhow::{bail, Context, Result};
use chipset_history::comparator::{ChangeKind, HistoryComparator};
use chipset_history::config::{Config, RemovalScope, CONFIG_ENV_VAR};
use chipset_history::history::{ChipsetHistory, ManualEntry};
use chipset_history::ingest::{csv_files_in, load_history};
use chipset_history::present::{NumberedTable, ReportTables};
use clap::{Args, Parser, Subcommand, ValueEnum};
// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
use chipset_history::ui::{run_ui, App};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Multi-year chipset comparison: added, removed and reappeared chipsets")]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify chipsets across the yearly CSV files
    Compare {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write added.csv, removed.csv and reappeared.csv into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Add a Year column with the period each change was observed in
        #[arg(long)]
        with_period: bool,
    },

    /// Show each year's records with serial numbers
    Preview {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Browse the datasets and results in the terminal
    #[cfg(feature = "tui")]
    View {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// CSV files (the year is taken from the last four characters of each name)
    /// or directories of CSV files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Column holding the chipset identifier
    #[arg(long)]
    identifier_field: Option<String>,

    /// Which removals survive reconciliation
    #[arg(long)]
    removal_scope: Option<RemovalScope>,

    /// Manual record: YEAR,CHIPSET_SP,CUSTOMER,PDM_NAME (repeatable)
    #[arg(short, long = "entry")]
    entries: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Csv,
    Json,
}

/// JSON output envelope
#[derive(Serialize)]
struct JsonOutput<'a> {
    generated_at: chrono::DateTime<chrono::Utc>,
    periods: Vec<String>,
    summary: String,
    #[serde(flatten)]
    tables: &'a ReportTables,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Compare {
            input,
            format,
            output_dir,
            with_period,
        } => {
            let history = prepare(&input, &mut config)?;
            run_compare(&history, &config, format, output_dir.as_deref(), with_period)
        }
        Command::Preview { input } => {
            let history = prepare(&input, &mut config)?;
            run_preview(&history, &config);
            Ok(())
        }
        #[cfg(feature = "tui")]
        Command::View { input } => {
            let history = prepare(&input, &mut config)?;
            run_view(&history, &config)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "chipset_history=debug"
    } else {
        "chipset_history=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Apply flag overrides, load the files and merge manual entries
fn prepare(input: &InputArgs, config: &mut Config) -> Result<ChipsetHistory> {
    if let Some(field) = &input.identifier_field {
        config.identifier_field = field.clone();
    }
    if let Some(scope) = input.removal_scope {
        config.removal_scope = scope;
    }
    config.validate().context("Invalid command-line override")?;

    let mut files = Vec::new();
    for path in &input.files {
        if path.is_dir() {
            files.extend(csv_files_in(path)?);
        } else {
            files.push(path.clone());
        }
    }
    if files.is_empty() {
        bail!("Please upload at least one CSV file.");
    }

    let mut history = load_history(&files, &config.ingest_options())?;

    for text in &input.entries {
        let entry = ManualEntry::parse(text)?;
        info!(period = %entry.period, identifier = %entry.identifier, "adding manual entry");
        history
            .add_manual_entry(entry, &config.identifier_field)
            .with_context(|| format!("Cannot add entry {:?}", text))?;
    }

    Ok(history)
}

fn run_compare(
    history: &ChipsetHistory,
    config: &Config,
    format: Format,
    output_dir: Option<&Path>,
    with_period: bool,
) -> Result<()> {
    let report = HistoryComparator::new(config.compare_options()).compare(history)?;
    let tables = ReportTables::new(&report, with_period, &config.serial_column);

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        for kind in ChangeKind::ALL {
            let path = dir.join(format!("{}.csv", kind.slug()));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            tables.get(kind).write_csv(file)?;
            println!("✓ {} → {}", kind.name(), path.display());
        }
        println!("{}", report.summary());
        return Ok(());
    }

    match format {
        Format::Text => {
            println!("📊 Chipset Changes Across Years");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            for kind in ChangeKind::ALL {
                let icon = match kind {
                    ChangeKind::Added => "✅",
                    ChangeKind::Removed => "❌",
                    ChangeKind::Reappeared => "🔄",
                };
                println!("\n{} {} Chipsets", icon, kind.name());
                print_table(tables.get(kind));
            }
            println!("\n{}", report.summary());
        }
        Format::Csv => {
            let stdout = std::io::stdout();
            for kind in ChangeKind::ALL {
                println!("# {}", kind.name());
                tables.get(kind).write_csv(stdout.lock())?;
            }
        }
        Format::Json => {
            let output = JsonOutput {
                generated_at: chrono::Utc::now(),
                periods: history.period_keys().iter().map(|k| k.to_string()).collect(),
                summary: report.summary(),
                tables: &tables,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn run_preview(history: &ChipsetHistory, config: &Config) {
    println!("📌 Data Preview");
    for (key, records) in history {
        println!("\n📆 {} Data", key);
        print_table(&NumberedTable::from_records(records, &config.serial_column));
    }
}

fn print_table(table: &NumberedTable) {
    if table.is_empty() {
        println!("  (none)");
    } else {
        print!("{}", table.render_text());
    }
}

#[cfg(feature = "tui")]
fn run_view(history: &ChipsetHistory, config: &Config) -> Result<()> {
    let report = HistoryComparator::new(config.compare_options()).compare(history)?;
    let tables = ReportTables::new(&report, true, &config.serial_column);

    let mut app = App::new(history, tables, config);
    run_ui(&mut app)?;

    println!("{}", report.summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(files: Vec<PathBuf>, identifier_field: Option<&str>, entries: &[&str]) -> InputArgs {
        InputArgs {
            files,
            identifier_field: identifier_field.map(str::to_string),
            removal_scope: None,
            entries: entries.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_blank_identifier_override_rejected() {
        let args = input(vec![PathBuf::from("chips_2023.csv")], Some(""), &[]);
        let mut config = Config::default();

        let err = prepare(&args, &mut config).unwrap_err();
        assert!(format!("{:#}", err).contains("identifier_field must not be empty"));
    }

    #[test]
    fn test_manual_entry_follows_identifier_override() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("stamps_2020.csv");
        let second = dir.path().join("stamps_2021.csv");
        std::fs::write(&first, "Stamp,Customer\na,Acme\n").unwrap();
        std::fs::write(&second, "Stamp,Customer\nb,Beta\n").unwrap();

        let args = input(vec![first, second], Some("Stamp"), &["2021,a,Acme,Ann"]);
        let mut config = Config::default();
        let history = prepare(&args, &mut config).unwrap();

        let report = HistoryComparator::new(config.compare_options())
            .compare(&history)
            .unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.identifiers(ChangeKind::Added, "Stamp"), vec!["a", "b"]);
    }
}
