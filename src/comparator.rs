// 🔍 History Comparator - classify chipsets across yearly snapshots
//
// Every identifier occurrence lands in one of three change categories:
//   Added      - first appearance anywhere in the ascending sequence
//   Removed    - present in a period, absent from every later period
//   Reappeared - present two periods back, absent last period, present now
//
// Reconciliation then strips Removed records whose identifier ever
// reappeared, and (by default) keeps only removals of identifiers that
// were present in the earliest period.

use crate::config::{CompareOptions, RemovalScope};
use crate::error::{Error, Result};
use crate::history::{identifier_set, ChipsetHistory};
use crate::period::PeriodKey;
use crate::record::ChipsetRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

// ============================================================================
// CHANGE EVENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Reappeared,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Added, ChangeKind::Removed, ChangeKind::Reappeared];

    pub fn name(&self) -> &str {
        match self {
            ChangeKind::Added => "Added",
            ChangeKind::Removed => "Removed",
            ChangeKind::Reappeared => "Reappeared",
        }
    }

    /// Lowercase slug, used for output file names
    pub fn slug(&self) -> &str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Reappeared => "reappeared",
        }
    }
}

/// A record attributed to the period in which its change was observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub period: PeriodKey,
    pub record: ChipsetRecord,
}

// ============================================================================
// CHANGE REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub added: Vec<ChangeEvent>,
    pub removed: Vec<ChangeEvent>,
    pub reappeared: Vec<ChangeEvent>,
}

impl ChangeReport {
    pub fn events(&self, kind: ChangeKind) -> &[ChangeEvent] {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Removed => &self.removed,
            ChangeKind::Reappeared => &self.reappeared,
        }
    }

    /// Records of one category, without their periods
    pub fn records(&self, kind: ChangeKind) -> Vec<&ChipsetRecord> {
        self.events(kind).iter().map(|e| &e.record).collect()
    }

    /// Distinct identifiers of one category, in first-seen order
    pub fn identifiers(&self, kind: ChangeKind, field: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.events(kind)
            .iter()
            .filter_map(|e| e.record.identifier(field))
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.reappeared.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Added: {} records, Removed: {} records, Reappeared: {} records",
            self.added.len(),
            self.removed.len(),
            self.reappeared.len()
        )
    }
}

// ============================================================================
// HISTORY COMPARATOR
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct HistoryComparator {
    options: CompareOptions,
}

impl HistoryComparator {
    pub fn new(options: CompareOptions) -> Self {
        HistoryComparator { options }
    }

    /// Classify every chipset occurrence across the history's periods
    ///
    /// Fails when no periods are supplied or the identifier field is
    /// blank. Records without an identifier never match any category.
    ///
    /// Example:
    /// ```
    /// use chipset_history::{ChipsetHistory, ChipsetRecord, HistoryComparator, PeriodKey};
    ///
    /// let chip = |id: &str| ChipsetRecord::new().with("Chipset SP", id);
    /// let mut history = ChipsetHistory::new();
    /// history.insert_period(PeriodKey::new("2022").unwrap(), vec![chip("a"), chip("b")]);
    /// history.insert_period(PeriodKey::new("2023").unwrap(), vec![chip("b"), chip("c")]);
    ///
    /// let report = HistoryComparator::default().compare(&history).unwrap();
    /// assert_eq!(report.added.len(), 3);
    /// assert_eq!(report.removed.len(), 1);
    /// assert!(report.reappeared.is_empty());
    /// ```
    pub fn compare(&self, history: &ChipsetHistory) -> Result<ChangeReport> {
        self.options.validate()?;
        if history.is_empty() {
            return Err(Error::EmptyInput);
        }

        let field = self.options.identifier_field.as_str();
        let periods: Vec<(&PeriodKey, &[ChipsetRecord])> =
            history.iter().map(|(k, r)| (k, r.as_slice())).collect();
        let sets: Vec<HashSet<&str>> = periods
            .iter()
            .map(|(_, records)| identifier_set(records, field))
            .collect();

        let added = self.find_added(&periods, &sets);
        let removed = self.find_removed(&periods, &sets);
        let (reappeared, reappeared_ids) = self.find_reappeared(&periods, &sets);
        let removed = self.reconcile(removed, &reappeared_ids, &sets[0]);

        debug!(
            periods = periods.len(),
            added = added.len(),
            removed = removed.len(),
            reappeared = reappeared.len(),
            "classified chipset history"
        );

        Ok(ChangeReport {
            added,
            removed,
            reappeared,
        })
    }

    /// First appearance of each identifier, tracked with a running union
    fn find_added(
        &self,
        periods: &[(&PeriodKey, &[ChipsetRecord])],
        sets: &[HashSet<&str>],
    ) -> Vec<ChangeEvent> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut added = Vec::new();

        for ((key, records), set) in periods.iter().zip(sets) {
            let new_ids: HashSet<&str> = set.difference(&seen).copied().collect();
            added.extend(self.select(key, records, &new_ids));
            seen.extend(set.iter().copied());
        }

        added
    }

    /// Identifiers present in a period and missing from all later ones
    ///
    /// The last period never contributes: there is nothing after it.
    fn find_removed(
        &self,
        periods: &[(&PeriodKey, &[ChipsetRecord])],
        sets: &[HashSet<&str>],
    ) -> Vec<ChangeEvent> {
        let n = sets.len();

        // later[i] = union of sets[i+1..]
        let mut later: Vec<HashSet<&str>> = vec![HashSet::new(); n];
        for i in (0..n.saturating_sub(1)).rev() {
            let mut union = later[i + 1].clone();
            union.extend(sets[i + 1].iter().copied());
            later[i] = union;
        }

        let mut removed = Vec::new();
        for i in 0..n.saturating_sub(1) {
            let gone: HashSet<&str> = sets[i].difference(&later[i]).copied().collect();
            let (key, records) = periods[i];
            removed.extend(self.select(key, records, &gone));
        }

        removed
    }

    /// Sliding three-period window: present, absent, present again
    ///
    /// Returns the events plus every identifier that reappeared anywhere.
    fn find_reappeared<'a>(
        &self,
        periods: &[(&PeriodKey, &[ChipsetRecord])],
        sets: &[HashSet<&'a str>],
    ) -> (Vec<ChangeEvent>, HashSet<&'a str>) {
        let mut reappeared = Vec::new();
        let mut all_ids: HashSet<&'a str> = HashSet::new();

        for i in 2..sets.len() {
            let back: HashSet<&str> = sets[i - 2].difference(&sets[i - 1]).copied().collect();
            let returned: HashSet<&'a str> = back.intersection(&sets[i]).copied().collect();

            let (key, records) = periods[i];
            reappeared.extend(self.select(key, records, &returned));
            all_ids.extend(returned);
        }

        (reappeared, all_ids)
    }

    /// Resolve overlap between Removed and Reappeared
    fn reconcile(
        &self,
        removed: Vec<ChangeEvent>,
        reappeared_ids: &HashSet<&str>,
        first_period: &HashSet<&str>,
    ) -> Vec<ChangeEvent> {
        let field = self.options.identifier_field.as_str();

        removed
            .into_iter()
            .filter(|event| {
                let Some(id) = event.record.identifier(field) else {
                    return false;
                };
                if reappeared_ids.contains(id) {
                    return false;
                }
                match self.options.removal_scope {
                    RemovalScope::FirstPeriod => first_period.contains(id),
                    RemovalScope::AnyPeriod => true,
                }
            })
            .collect()
    }

    /// Every record of one period whose identifier is in `ids`, in order
    fn select(&self, key: &PeriodKey, records: &[ChipsetRecord], ids: &HashSet<&str>) -> Vec<ChangeEvent> {
        if ids.is_empty() {
            return Vec::new();
        }

        let field = self.options.identifier_field.as_str();
        records
            .iter()
            .filter(|r| r.identifier(field).map_or(false, |id| ids.contains(id)))
            .map(|r| ChangeEvent {
                period: key.clone(),
                record: r.clone(),
            })
            .collect()
    }
}

/// Classify with default options
pub fn compare(history: &ChipsetHistory) -> Result<ChangeReport> {
    HistoryComparator::default().compare(history)
}

// ============================================================================
// TESTS
// ============================================================================
