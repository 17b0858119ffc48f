// Presentation helpers - numbered tables for display and export
//
// Ordinals are synthetic: recomputed from 1 every time a table is built,
// never stored on records.

use crate::comparator::{ChangeEvent, ChangeKind, ChangeReport};
use crate::record::ChipsetRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Column carrying the observation period when requested
pub const PERIOD_COLUMN: &str = "Year";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl NumberedTable {
    /// Number a period's records under `serial_column`
    pub fn from_records<'a, I>(records: I, serial_column: &str) -> Self
    where
        I: IntoIterator<Item = &'a ChipsetRecord>,
    {
        Self::build(records.into_iter().map(|r| (None, r)), false, serial_column)
    }

    /// Number change events, optionally with a `Year` column after the ordinal
    pub fn from_events(events: &[ChangeEvent], with_period: bool, serial_column: &str) -> Self {
        Self::build(
            events.iter().map(|e| {
                let period = if with_period { Some(e.period.as_str()) } else { None };
                (period, &e.record)
            }),
            with_period,
            serial_column,
        )
    }

    fn build<'a, I>(rows: I, with_period: bool, serial_column: &str) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, &'a ChipsetRecord)>,
    {
        let rows: Vec<(Option<&str>, &ChipsetRecord)> = rows.into_iter().collect();

        // Union of record columns in first-seen order, minus any stale ordinal
        let mut data_columns: Vec<&str> = Vec::new();
        for (_, record) in &rows {
            for col in record.columns() {
                if col != serial_column && !data_columns.contains(&col) {
                    data_columns.push(col);
                }
            }
        }

        let mut columns = vec![serial_column.to_string()];
        if with_period {
            columns.push(PERIOD_COLUMN.to_string());
        }
        columns.extend(data_columns.iter().map(|c| c.to_string()));

        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, (period, record))| {
                let mut cells = vec![(i + 1).to_string()];
                if with_period {
                    cells.push(period.unwrap_or("").to_string());
                }
                cells.extend(data_columns.iter().map(|c| record.get(c).unwrap_or("").to_string()));
                cells
            })
            .collect();

        NumberedTable { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col).map(|s| s.as_str())
    }

    /// Write as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns).context("Failed to write CSV header")?;
        for row in &self.rows {
            wtr.write_record(row).context("Failed to write CSV row")?;
        }
        wtr.flush().context("Failed to flush CSV output")?;
        Ok(())
    }

    /// Render as an aligned plain-text table
    pub fn render_text(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = line(&self.columns);
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

/// The three output tables of one comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTables {
    pub added: NumberedTable,
    pub removed: NumberedTable,
    pub reappeared: NumberedTable,
}

impl ReportTables {
    pub fn new(report: &ChangeReport, with_period: bool, serial_column: &str) -> Self {
        let table = |kind| NumberedTable::from_events(report.events(kind), with_period, serial_column);
        ReportTables {
            added: table(ChangeKind::Added),
            removed: table(ChangeKind::Removed),
            reappeared: table(ChangeKind::Reappeared),
        }
    }

    pub fn get(&self, kind: ChangeKind) -> &NumberedTable {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Removed => &self.removed,
            ChangeKind::Reappeared => &self.reappeared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SERIAL_COLUMN;
    use crate::comparator::compare;
    use crate::history::ChipsetHistory;
    use crate::period::PeriodKey;

    fn chip(id: &str, customer: &str) -> ChipsetRecord {
        ChipsetRecord::new()
            .with("Chipset SP", id)
            .with("Customer", customer)
    }

    #[test]
    fn test_numbering_starts_at_one() {
        let records = vec![chip("a", "Acme"), chip("b", "Beta")];
        let table = NumberedTable::from_records(&records, DEFAULT_SERIAL_COLUMN);

        assert_eq!(table.columns, vec!["Sr. No", "Chipset SP", "Customer"]);
        assert_eq!(table.rows[0], vec!["1", "a", "Acme"]);
        assert_eq!(table.rows[1], vec!["2", "b", "Beta"]);
    }

    #[test]
    fn test_existing_serial_column_replaced() {
        let stale = chip("a", "Acme").with("Sr. No", "17");
        let stale_first = ChipsetRecord::new().with("Sr. No", "9").with("Chipset SP", "b");
        let table = NumberedTable::from_records([&stale, &stale_first], DEFAULT_SERIAL_COLUMN);

        assert_eq!(table.columns, vec!["Sr. No", "Chipset SP", "Customer"]);
        assert_eq!(table.cell(0, "Sr. No"), Some("1"));
        assert_eq!(table.cell(1, "Sr. No"), Some("2"));
        assert_eq!(table.cell(1, "Customer"), Some(""));
    }

    #[test]
    fn test_custom_serial_column() {
        let stale = chip("a", "Acme").with("Row", "5").with("Sr. No", "3");
        let table = NumberedTable::from_records([&stale], "Row");

        assert_eq!(table.columns, vec!["Row", "Chipset SP", "Customer", "Sr. No"]);
        assert_eq!(table.rows[0], vec!["1", "a", "Acme", "3"]);
    }

    #[test]
    fn test_columns_union_first_seen() {
        let a = ChipsetRecord::new().with("Chipset SP", "a").with("Customer", "x");
        let b = ChipsetRecord::new().with("PDM Name", "p").with("Chipset SP", "b");
        let table = NumberedTable::from_records([&a, &b], DEFAULT_SERIAL_COLUMN);

        assert_eq!(table.columns, vec!["Sr. No", "Chipset SP", "Customer", "PDM Name"]);
        assert_eq!(table.rows[1], vec!["2", "b", "", "p"]);
    }

    #[test]
    fn test_report_tables_with_period() {
        let mut history = ChipsetHistory::new();
        history.insert_period(PeriodKey::new("2022").unwrap(), vec![chip("a", "Acme")]);
        history.insert_period(PeriodKey::new("2023").unwrap(), vec![chip("b", "Beta")]);
        let report = compare(&history).unwrap();

        let tables = ReportTables::new(&report, true, "Sr. No");
        assert_eq!(tables.added.columns, vec!["Sr. No", "Year", "Chipset SP", "Customer"]);
        assert_eq!(tables.added.rows[1], vec!["2", "2023", "b", "Beta"]);
        assert_eq!(tables.get(ChangeKind::Removed).rows[0], vec!["1", "2022", "a", "Acme"]);
        assert!(tables.reappeared.is_empty());
        assert_eq!(tables.reappeared.columns, vec!["Sr. No", "Year"]);
    }

    #[test]
    fn test_write_csv() {
        let records = vec![chip("a", "Acme, Inc.")];
        let mut out = Vec::new();
        NumberedTable::from_records(&records, DEFAULT_SERIAL_COLUMN).write_csv(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Sr. No,Chipset SP,Customer\n1,a,\"Acme, Inc.\"\n");
    }

    #[test]
    fn test_render_text_aligns_columns() {
        let records = vec![chip("SP100", "Acme"), chip("b", "Beta Industries")];
        let text = NumberedTable::from_records(&records, DEFAULT_SERIAL_COLUMN).render_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Sr. No  Chipset SP  Customer");
        assert_eq!(lines[2], "1       SP100       Acme");
        assert_eq!(lines[3], "2       b           Beta Industries");
    }
}
