// CSV ingestion - one file per yearly dataset
//
// Files carry a header row. Spreadsheet export artifacts (pandas-style
// "Unnamed: 0" index columns and the "S.No" ordinal) are stripped before
// records are built.

use crate::config::IngestOptions;
use crate::history::ChipsetHistory;
use crate::period::PeriodKey;
use crate::record::ChipsetRecord;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read one period's records from CSV text
pub fn read_period<R: Read>(reader: R, options: &IngestOptions) -> Result<Vec<ChipsetRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();

    // Indexes of the columns that survive cleanup
    let mut kept: Vec<(usize, String)> = Vec::new();
    for (i, header) in headers.iter().enumerate() {
        if options.should_drop(header) {
            debug!(column = header, "dropping index column");
        } else {
            kept.push((i, header.to_string()));
        }
    }

    let mut records = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let row = result.with_context(|| format!("Failed to read CSV row {}", line + 2))?;

        let record = ChipsetRecord::from_pairs(
            kept.iter()
                .map(|(i, name)| (name.clone(), row.get(*i).unwrap_or("").to_string())),
        );
        records.push(record);
    }

    Ok(records)
}

/// Load one CSV file, deriving its period from the file name
pub fn load_period_file(path: &Path, options: &IngestOptions) -> Result<(PeriodKey, Vec<ChipsetRecord>)> {
    let key = PeriodKey::from_file_name(path)?;
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    let records = read_period(file, options)
        .with_context(|| format!("Failed to parse CSV file {}", path.display()))?;

    info!(period = %key, records = records.len(), file = %path.display(), "loaded dataset");
    Ok((key, records))
}

/// Load every file into a history; the same year twice keeps the later file
pub fn load_history<P: AsRef<Path>>(paths: &[P], options: &IngestOptions) -> Result<ChipsetHistory> {
    let mut history = ChipsetHistory::new();
    for path in paths {
        let (key, records) = load_period_file(path.as_ref(), options)?;
        history.insert_period(key, records);
    }
    Ok(history)
}

/// CSV files in a directory, sorted by name
pub fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}
