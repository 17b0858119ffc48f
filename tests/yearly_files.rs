// End-to-end: yearly CSV files on disk through ingestion, manual entry,
// classification and numbered output.

use chipset_history::{
    compare, load_history, ChangeKind, ChipsetHistory, IngestOptions, ManualEntry, NumberedTable,
    PeriodKey, ReportTables, DEFAULT_IDENTIFIER_FIELD,
};
use std::fs;
use std::path::PathBuf;

fn write_years(dir: &std::path::Path, years: &[(&str, &str)]) -> Vec<PathBuf> {
    years
        .iter()
        .map(|(name, body)| {
            let path = dir.join(name);
            fs::write(&path, body).unwrap();
            path
        })
        .collect()
}

#[test]
fn test_three_years_of_exports() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_years(
        dir.path(),
        &[
            (
                "sales_2021.csv",
                ",S.No,Chipset SP,Customer,PDM Name\n0,1,SP1,Acme,Ann\n1,2,SP2,Beta,Bo\n2,3,SP3,Core,Cy\n",
            ),
            (
                "sales_2022.csv",
                ",S.No,Chipset SP,Customer,PDM Name\n0,1,SP2,Beta,Bo\n1,2,SP4,Delta,Di\n",
            ),
            (
                "sales_2023.csv",
                ",S.No,Chipset SP,Customer,PDM Name\n0,1,SP1,Acme,Ann\n1,2,SP2,Beta,Bo\n",
            ),
        ],
    );

    let history = load_history(&files, &IngestOptions::default()).unwrap();
    let report = compare(&history).unwrap();

    // Blank index header and S.No are both stripped on load
    let added = NumberedTable::from_events(&report.added, true, "Sr. No");
    assert_eq!(added.columns, vec!["Sr. No", "Year", "Chipset SP", "Customer", "PDM Name"]);
    assert_eq!(added.rows[3], vec!["4", "2022", "SP4", "Delta", "Di"]);

    let field = DEFAULT_IDENTIFIER_FIELD;
    assert_eq!(report.identifiers(ChangeKind::Added, field), vec!["SP1", "SP2", "SP3", "SP4"]);
    // SP3 vanished after 2021; SP4 first appeared in 2022 so it is filtered out
    assert_eq!(report.identifiers(ChangeKind::Removed, field), vec!["SP3"]);
    assert_eq!(report.identifiers(ChangeKind::Reappeared, field), vec!["SP1"]);
    assert_eq!(report.reappeared[0].period, PeriodKey::new("2023").unwrap());
}

#[test]
fn test_manual_entry_changes_classification() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_years(
        dir.path(),
        &[
            ("y2020.csv", "Chipset SP,Customer\nSP1,Acme\n"),
            ("y2021.csv", "Chipset SP,Customer\nSP2,Beta\n"),
        ],
    );

    let mut history: ChipsetHistory = load_history(&files, &IngestOptions::default()).unwrap();
    let before = compare(&history).unwrap();
    assert_eq!(before.removed.len(), 1);

    history
        .add_manual_entry(
            ManualEntry::parse("2021,SP1,Acme,Ann").unwrap(),
            DEFAULT_IDENTIFIER_FIELD,
        )
        .unwrap();
    let after = compare(&history).unwrap();
    assert!(after.removed.is_empty());

    let tables = ReportTables::new(&after, false, "Sr. No");
    assert_eq!(tables.added.len(), 2);
    assert_eq!(tables.added.cell(1, "Chipset SP"), Some("SP2"));
}

#[test]
fn test_unnamed_index_column_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_years(
        dir.path(),
        &[("chips2024.csv", "Unnamed: 0,Chipset SP\n0,SP9\n1,\n")],
    );

    let history = load_history(&files, &IngestOptions::default()).unwrap();
    let records = history.get(&PeriodKey::new("2024").unwrap()).unwrap();
    assert_eq!(records.len(), 2);
    assert!(!records[0].has_field("Unnamed: 0"));

    let report = compare(&history).unwrap();
    assert_eq!(report.added.len(), 1);
    assert!(report.removed.is_empty());
    assert!(report.reappeared.is_empty());
}
