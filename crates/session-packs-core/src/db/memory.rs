//! In-process store.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{Collection, DbResult, Store};

/// Store kept entirely in memory. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RefCell<HashMap<Collection, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn read(&self, collection: Collection) -> DbResult<Option<String>> {
        Ok(self.collections.borrow().get(&collection).cloned())
    }

    fn write(&self, collection: Collection, payload: &str) -> DbResult<()> {
        self.collections
            .borrow_mut()
            .insert(collection, payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.read(Collection::Appointments).unwrap(), None);

        store.write(Collection::Appointments, "[]").unwrap();
        assert_eq!(store.read(Collection::Appointments).unwrap().as_deref(), Some("[]"));
    }
}
