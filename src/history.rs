// Chipset history - the ordered set of yearly snapshots fed to the comparator
//
// Each period owns its complete record list. The mapping is rebuilt on
// every run; nothing here is persisted.

use crate::error::{Error, Result};
use crate::period::PeriodKey;
use crate::record::{ChipsetRecord, CUSTOMER_FIELD, PDM_FIELD};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

// ============================================================================
// CHIPSET HISTORY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChipsetHistory {
    periods: BTreeMap<PeriodKey, Vec<ChipsetRecord>>,
}

impl ChipsetHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a period's records; a period loaded twice keeps the later copy
    pub fn insert_period(&mut self, key: PeriodKey, records: Vec<ChipsetRecord>) {
        if let Some(previous) = self.periods.insert(key.clone(), records) {
            warn!(
                period = %key,
                replaced = previous.len(),
                "period supplied more than once, keeping the latest dataset"
            );
        }
    }

    pub fn get(&self, key: &PeriodKey) -> Option<&[ChipsetRecord]> {
        self.periods.get(key).map(|r| r.as_slice())
    }

    /// Periods in ascending key order
    pub fn iter(&self) -> btree_map::Iter<'_, PeriodKey, Vec<ChipsetRecord>> {
        self.periods.iter()
    }

    pub fn period_keys(&self) -> Vec<&PeriodKey> {
        self.periods.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.periods.values().map(|r| r.len()).sum()
    }

    /// Append a manually entered record to an already loaded period
    ///
    /// The code is stored under `field`, the same identifier column the
    /// comparator will read.
    pub fn add_manual_entry(&mut self, entry: ManualEntry, field: &str) -> Result<()> {
        let records = self
            .periods
            .get_mut(&entry.period)
            .ok_or_else(|| Error::UnknownPeriod(entry.period.to_string()))?;
        records.push(entry.into_record(field));
        Ok(())
    }
}

impl FromIterator<(PeriodKey, Vec<ChipsetRecord>)> for ChipsetHistory {
    fn from_iter<I: IntoIterator<Item = (PeriodKey, Vec<ChipsetRecord>)>>(iter: I) -> Self {
        let mut history = ChipsetHistory::new();
        for (key, records) in iter {
            history.insert_period(key, records);
        }
        history
    }
}

impl<'a> IntoIterator for &'a ChipsetHistory {
    type Item = (&'a PeriodKey, &'a Vec<ChipsetRecord>);
    type IntoIter = btree_map::Iter<'a, PeriodKey, Vec<ChipsetRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.iter()
    }
}

/// Distinct non-null identifiers found in `records`
pub fn identifier_set<'a>(records: &'a [ChipsetRecord], field: &str) -> HashSet<&'a str> {
    records.iter().filter_map(|r| r.identifier(field)).collect()
}

// ============================================================================
// MANUAL ENTRY
// ============================================================================

/// A record typed in by hand rather than read from a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub period: PeriodKey,
    pub identifier: String,
    pub customer: String,
    pub pdm_name: String,
}

impl ManualEntry {
    /// Parse `YEAR,SP[,CUSTOMER[,PDM]]`
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.splitn(4, ',').map(str::trim).collect();

        let period = parts
            .first()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidEntry(format!("missing period in {:?}", text)))?;
        let identifier = parts
            .get(1)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidEntry(format!("missing chipset code in {:?}", text)))?;

        Ok(ManualEntry {
            period: PeriodKey::new(*period)?,
            identifier: identifier.to_string(),
            customer: parts.get(2).unwrap_or(&"").to_string(),
            pdm_name: parts.get(3).unwrap_or(&"").to_string(),
        })
    }

    pub fn into_record(self, field: &str) -> ChipsetRecord {
        ChipsetRecord::new()
            .with(field, self.identifier)
            .with(CUSTOMER_FIELD, self.customer)
            .with(PDM_FIELD, self.pdm_name)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DEFAULT_IDENTIFIER_FIELD;

    fn chip(id: &str) -> ChipsetRecord {
        ChipsetRecord::new().with(DEFAULT_IDENTIFIER_FIELD, id)
    }

    fn key(s: &str) -> PeriodKey {
        PeriodKey::new(s).unwrap()
    }

    #[test]
    fn test_periods_iterate_ascending() {
        let history: ChipsetHistory = vec![
            (key("2024"), vec![chip("c")]),
            (key("2022"), vec![chip("a")]),
            (key("2023"), vec![chip("b")]),
        ]
        .into_iter()
        .collect();

        let keys: Vec<&str> = history.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["2022", "2023", "2024"]);
        assert_eq!(history.record_count(), 3);
    }

    #[test]
    fn test_reinserted_period_replaces_records() {
        let mut history = ChipsetHistory::new();
        history.insert_period(key("2022"), vec![chip("a"), chip("b")]);
        history.insert_period(key("2022"), vec![chip("z")]);

        assert_eq!(history.len(), 1);
        assert_eq!(history.get(&key("2022")).unwrap(), &[chip("z")]);
    }

    #[test]
    fn test_identifier_set_skips_nulls_and_duplicates() {
        let records = vec![chip("a"), chip("a"), chip(""), ChipsetRecord::new().with("Customer", "x")];
        let set = identifier_set(&records, DEFAULT_IDENTIFIER_FIELD);

        assert_eq!(set.len(), 1);
        assert!(set.contains("a"));
    }

    #[test]
    fn test_manual_entry_appends_to_period() {
        let mut history = ChipsetHistory::new();
        history.insert_period(key("2023"), vec![chip("a")]);

        let entry = ManualEntry::parse("2023, SP77, Acme Corp, J. Doe").unwrap();
        history.add_manual_entry(entry, DEFAULT_IDENTIFIER_FIELD).unwrap();

        let records = history.get(&key("2023")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get(DEFAULT_IDENTIFIER_FIELD), Some("SP77"));
        assert_eq!(records[1].get(CUSTOMER_FIELD), Some("Acme Corp"));
        assert_eq!(records[1].get(PDM_FIELD), Some("J. Doe"));
    }

    #[test]
    fn test_manual_entry_uses_given_identifier_field() {
        let mut history = ChipsetHistory::new();
        history.insert_period(key("2021"), vec![ChipsetRecord::new().with("Stamp", "b")]);

        let entry = ManualEntry::parse("2021,a,Acme,Ann").unwrap();
        history.add_manual_entry(entry, "Stamp").unwrap();

        let records = history.get(&key("2021")).unwrap();
        assert_eq!(records[1].identifier("Stamp"), Some("a"));
        assert!(!records[1].has_field(DEFAULT_IDENTIFIER_FIELD));
        assert!(identifier_set(records, "Stamp").contains("a"));
    }

    #[test]
    fn test_manual_entry_unknown_period() {
        let mut history = ChipsetHistory::new();
        history.insert_period(key("2023"), vec![]);

        let entry = ManualEntry::parse("2019,SP1").unwrap();
        assert_eq!(
            history.add_manual_entry(entry, DEFAULT_IDENTIFIER_FIELD),
            Err(Error::UnknownPeriod("2019".to_string()))
        );
    }

    #[test]
    fn test_manual_entry_parse_errors() {
        assert!(matches!(ManualEntry::parse(""), Err(Error::InvalidEntry(_))));
        assert!(matches!(ManualEntry::parse("2023,"), Err(Error::InvalidEntry(_))));

        let minimal = ManualEntry::parse("2023,SP1").unwrap();
        assert_eq!(minimal.customer, "");
        assert_eq!(minimal.pdm_name, "");
    }
}
