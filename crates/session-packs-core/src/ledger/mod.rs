//! Append-only session ledger.
//!
//! Every change to a pack's balance or status is explained by exactly one
//! ledger entry, written before the pack itself is updated. Entries are never
//! updated or deleted; the repository offers no way to do so.

mod engine;
mod replay;

pub use engine::*;
pub use replay::*;

use thiserror::Error;

/// Ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Ledger entry for pack {0} has no reason")]
    EmptyReason(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
