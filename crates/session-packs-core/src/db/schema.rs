//! SQLite schema definition.

/// Schema for the SQLite-backed store.
///
/// Each collection lives in a single row as a serialized JSON array and is
/// replaced wholesale on every write.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Record collections (templates, packs, ledger, appointments)
-- ============================================================================

CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    payload TEXT NOT NULL DEFAULT '[]',          -- JSON array of records
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- The ledger row may be replaced but never removed
CREATE TRIGGER IF NOT EXISTS collections_keep_ledger BEFORE DELETE ON collections
WHEN old.name = 'session-ledger'
BEGIN
    SELECT RAISE(ABORT, 'Ledger collection cannot be deleted');
END;
"#;
