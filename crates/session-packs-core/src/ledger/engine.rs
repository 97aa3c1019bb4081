//! Ledger engine: the trusted recorder of balance and status changes.

use tracing::debug;

use super::{LedgerError, LedgerResult};
use crate::db::Repository;
use crate::models::{LedgerEntry, NewLedgerEntry};

/// Ledger engine.
pub struct LedgerEngine<'a> {
    repo: &'a Repository,
}

impl<'a> LedgerEngine<'a> {
    /// Create a new ledger engine.
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Record an entry, assigning its ID and timestamp.
    ///
    /// Only the presence of a reason is checked; callers validate the action.
    pub fn append(&self, entry: NewLedgerEntry) -> LedgerResult<LedgerEntry> {
        if entry.reason.trim().is_empty() {
            return Err(LedgerError::EmptyReason(entry.patient_pack_id));
        }

        let entry = entry.into_entry();
        self.repo.save(&entry)?;

        debug!(
            pack_id = %entry.patient_pack_id,
            action = %entry.action_type,
            delta = entry.sessions_delta,
            previous = entry.previous_balance,
            new = entry.new_balance,
            "Ledger entry appended"
        );
        Ok(entry)
    }

    /// Entries for one pack, in insertion order.
    pub fn list_for_pack(&self, pack_id: &str) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|e| e.patient_pack_id == pack_id)
            .collect())
    }

    /// Every entry, in insertion order.
    pub fn list_all(&self) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.repo.list()?)
    }

    /// Entries for one pack, newest first (for audit trail display).
    pub fn history_for_pack(&self, pack_id: &str) -> LedgerResult<Vec<LedgerEntry>> {
        let mut entries = self.list_for_pack(pack_id)?;
        // Reverse first so entries sharing a timestamp still come out newest first
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{
        ActionType, FinancialStatus, NewPackTemplate, PackTemplate, PatientPack, TriggeredBy,
    };

    fn make_pack() -> PatientPack {
        let template = PackTemplate::new(NewPackTemplate::new("Physio", 10, 90));
        PatientPack::from_template(
            "patient-1".into(),
            "John Smith".into(),
            &template,
            FinancialStatus::Paid,
            String::new(),
        )
    }

    #[test]
    fn test_append_assigns_id_and_timestamp() {
        let repo = Repository::new(MemoryStore::new());
        let ledger = LedgerEngine::new(&repo);
        let pack = make_pack();

        let entry = ledger
            .append(NewLedgerEntry::balance_change(
                &pack,
                ActionType::Used,
                -1,
                TriggeredBy::Reception,
                "Session attended",
            ))
            .unwrap();

        assert_eq!(entry.id.len(), 36);
        assert_eq!(entry.previous_balance, 10);
        assert_eq!(entry.new_balance, 9);
        assert_eq!(ledger.list_all().unwrap(), vec![entry]);
    }

    #[test]
    fn test_append_rejects_blank_reason() {
        let repo = Repository::new(MemoryStore::new());
        let ledger = LedgerEngine::new(&repo);
        let pack = make_pack();

        let result = ledger.append(NewLedgerEntry::status_change(
            &pack,
            ActionType::Freeze,
            TriggeredBy::Admin,
            "   ",
        ));

        assert!(matches!(result, Err(LedgerError::EmptyReason(id)) if id == pack.id));
        assert!(ledger.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_list_for_pack_filters_and_keeps_order() {
        let repo = Repository::new(MemoryStore::new());
        let ledger = LedgerEngine::new(&repo);
        let pack_a = make_pack();
        let pack_b = make_pack();

        let a1 = ledger
            .append(NewLedgerEntry::status_change(
                &pack_a,
                ActionType::Freeze,
                TriggeredBy::Admin,
                "Travel",
            ))
            .unwrap();
        ledger
            .append(NewLedgerEntry::status_change(
                &pack_b,
                ActionType::Freeze,
                TriggeredBy::Admin,
                "Illness",
            ))
            .unwrap();
        let a2 = ledger
            .append(NewLedgerEntry::status_change(
                &pack_a,
                ActionType::Unfreeze,
                TriggeredBy::Admin,
                "Back",
            ))
            .unwrap();

        assert_eq!(ledger.list_for_pack(&pack_a.id).unwrap(), vec![a1.clone(), a2.clone()]);
        assert_eq!(ledger.history_for_pack(&pack_a.id).unwrap(), vec![a2, a1]);
        assert!(ledger.list_for_pack("unknown").unwrap().is_empty());
    }
}
