//! Typed access to the record collections.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{Collection, DbError, DbResult, Store};
use crate::config::{CoreConfig, MalformedDataPolicy};
use crate::models::{timestamp, Appointment, LedgerEntry, PackTemplate, PatientPack};

/// A record stored in one of the collections.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Collection holding this record type.
    const COLLECTION: Collection;

    /// Record ID.
    fn id(&self) -> &str;
}

/// A record that may be changed or removed after it was saved.
///
/// Ledger entries deliberately do not implement this trait.
pub trait MutableRecord: Record {
    /// Stamp the last-modified time, for records that track one.
    fn touch(&mut self, _now: chrono::DateTime<chrono::Utc>) {}
}

impl Record for PackTemplate {
    const COLLECTION: Collection = Collection::Templates;

    fn id(&self) -> &str {
        &self.id
    }
}

impl MutableRecord for PackTemplate {
    fn touch(&mut self, now: chrono::DateTime<chrono::Utc>) {
        self.updated_at = now;
    }
}

impl Record for PatientPack {
    const COLLECTION: Collection = Collection::Packs;

    fn id(&self) -> &str {
        &self.id
    }
}

impl MutableRecord for PatientPack {
    fn touch(&mut self, now: chrono::DateTime<chrono::Utc>) {
        self.updated_at = now;
    }
}

impl Record for Appointment {
    const COLLECTION: Collection = Collection::Appointments;

    fn id(&self) -> &str {
        &self.id
    }
}

impl MutableRecord for Appointment {}

impl Record for LedgerEntry {
    const COLLECTION: Collection = Collection::Ledger;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Typed repository over an injected [`Store`].
///
/// Every operation reads the whole collection and, for writes, replaces it.
/// Writes are crate-private: pack balances and statuses change only through
/// the managers.
pub struct Repository {
    store: Box<dyn Store>,
    config: CoreConfig,
}

impl Repository {
    /// Create a repository with default configuration.
    pub fn new(store: impl Store + 'static) -> Self {
        Self::with_config(store, CoreConfig::default())
    }

    /// Create a repository with explicit configuration.
    pub fn with_config(store: impl Store + 'static, config: CoreConfig) -> Self {
        Self {
            store: Box::new(store),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// All records of a collection, in storage order.
    pub fn list<R: Record>(&self) -> DbResult<Vec<R>> {
        let Some(payload) = self.store.read(R::COLLECTION)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<R>>(&payload) {
            Ok(records) => Ok(records),
            Err(source) => match self.config.malformed_data {
                MalformedDataPolicy::Recover => {
                    warn!(
                        collection = %R::COLLECTION,
                        error = %source,
                        "Stored collection is malformed, treating it as empty"
                    );
                    Ok(Vec::new())
                }
                MalformedDataPolicy::Fail => Err(DbError::Malformed {
                    collection: R::COLLECTION,
                    source,
                }),
            },
        }
    }

    /// Find a record by ID.
    pub fn find<R: Record>(&self, id: &str) -> DbResult<Option<R>> {
        Ok(self.list::<R>()?.into_iter().find(|r| r.id() == id))
    }

    /// Append a record to its collection.
    pub(crate) fn save<R: Record>(&self, record: &R) -> DbResult<()> {
        let mut records = self.list::<R>()?;
        records.push(record.clone());
        self.write_all(&records)?;
        debug!(collection = %R::COLLECTION, id = record.id(), "Saved record");
        Ok(())
    }

    /// Read, patch and write back a single record.
    ///
    /// Returns the record as written, or `None` if no record has that ID.
    pub(crate) fn update<R, F>(&self, id: &str, patch: F) -> DbResult<Option<R>>
    where
        R: MutableRecord,
        F: FnOnce(&mut R),
    {
        let mut records = self.list::<R>()?;
        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };

        patch(record);
        record.touch(timestamp::now());
        let updated = record.clone();

        self.write_all(&records)?;
        debug!(collection = %R::COLLECTION, id, "Updated record");
        Ok(Some(updated))
    }

    /// Remove a record. Returns `false` if no record has that ID.
    pub(crate) fn remove<R: MutableRecord>(&self, id: &str) -> DbResult<bool> {
        let records = self.list::<R>()?;
        let before = records.len();
        let kept: Vec<R> = records.into_iter().filter(|r| r.id() != id).collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.write_all(&kept)?;
        debug!(collection = %R::COLLECTION, id, "Removed record");
        Ok(true)
    }

    fn write_all<R: Record>(&self, records: &[R]) -> DbResult<()> {
        let payload = serde_json::to_string(records)?;
        self.store.write(R::COLLECTION, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, MemoryStore};
    use crate::models::{FinancialStatus, NewPackTemplate, PackStatus};

    fn template(name: &str) -> PackTemplate {
        PackTemplate::new(NewPackTemplate::new(name, 10, 90))
    }

    #[test]
    fn test_save_and_list_preserves_order() {
        let repo = Repository::new(MemoryStore::new());
        let first = template("First");
        let second = template("Second");
        repo.save(&first).unwrap();
        repo.save(&second).unwrap();

        let templates: Vec<PackTemplate> = repo.list().unwrap();
        assert_eq!(templates, vec![first, second]);
    }

    #[test]
    fn test_find() {
        let repo = Repository::new(MemoryStore::new());
        let tpl = template("Wellness");
        repo.save(&tpl).unwrap();

        assert_eq!(repo.find::<PackTemplate>(&tpl.id).unwrap(), Some(tpl));
        assert_eq!(repo.find::<PackTemplate>("missing").unwrap(), None);
    }

    #[test]
    fn test_update_patches_and_touches() {
        let repo = Repository::new(MemoryStore::new());
        let tpl = template("Wellness");
        let pack = PatientPack::from_template(
            "p-1".into(),
            "Ana".into(),
            &tpl,
            FinancialStatus::Paid,
            String::new(),
        );
        repo.save(&pack).unwrap();

        let updated = repo
            .update::<PatientPack, _>(&pack.id, |p| p.status = PackStatus::Frozen)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, PackStatus::Frozen);
        assert!(updated.updated_at >= pack.updated_at);

        let stored = repo.find::<PatientPack>(&pack.id).unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[test]
    fn test_update_missing_returns_none() {
        let repo = Repository::new(MemoryStore::new());
        let result = repo
            .update::<PackTemplate, _>("nope", |t| t.name = "x".into())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_remove() {
        let repo = Repository::new(MemoryStore::new());
        let keep = template("Keep");
        let dropped = template("Drop");
        repo.save(&keep).unwrap();
        repo.save(&dropped).unwrap();

        assert!(repo.remove::<PackTemplate>(&dropped.id).unwrap());
        assert!(!repo.remove::<PackTemplate>(&dropped.id).unwrap());
        assert_eq!(repo.list::<PackTemplate>().unwrap(), vec![keep]);
    }

    #[test]
    fn test_malformed_collection_recovers_as_empty() {
        let store = MemoryStore::new();
        store.write(Collection::Packs, "{not json").unwrap();
        let repo = Repository::new(store);

        assert!(repo.list::<PatientPack>().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_collection_fails_when_strict() {
        let store = MemoryStore::new();
        store.write(Collection::Ledger, "[{\"id\": 7}]").unwrap();
        let repo = Repository::with_config(store, CoreConfig::strict());

        let err = repo.list::<LedgerEntry>().unwrap_err();
        assert!(matches!(
            err,
            DbError::Malformed {
                collection: Collection::Ledger,
                ..
            }
        ));
    }

    #[test]
    fn test_sqlite_backed_repository() {
        let repo = Repository::new(Database::open_in_memory().unwrap());
        let tpl = template("Premium Care");
        repo.save(&tpl).unwrap();

        assert_eq!(repo.list::<PackTemplate>().unwrap(), vec![tpl]);
    }
}
