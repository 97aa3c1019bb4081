//! Balance replay over a pack's ledger.
//!
//! Starting from zero, each entry must continue from the running balance and
//! satisfy `previous_balance + sessions_delta = new_balance`. Freeze,
//! unfreeze and extend entries must not move the balance. The final balance
//! must equal the pack's `remaining_sessions`.

use thiserror::Error;

use crate::models::{ActionType, LedgerEntry, PatientPack};

/// First inconsistency found while replaying a ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("entry {entry_id}: {previous} + {delta} != {new}")]
    Unbalanced {
        entry_id: String,
        previous: i64,
        delta: i64,
        new: i64,
    },

    #[error("entry {entry_id} starts at {found}, expected {expected}")]
    BrokenChain {
        entry_id: String,
        expected: i64,
        found: i64,
    },

    #[error("entry {entry_id}: {action} moved the balance by {delta}")]
    StatusOnlyDelta {
        entry_id: String,
        action: ActionType,
        delta: i64,
    },

    #[error("entry {entry_id} leaves a negative balance ({balance})")]
    NegativeBalance { entry_id: String, balance: i64 },

    #[error("ledger replays to {replayed}, pack holds {recorded}")]
    Mismatch { replayed: i64, recorded: i64 },
}

/// Replay entries in chronological order and return the resulting balance.
pub fn replay_balance(entries: &[LedgerEntry]) -> Result<i64, ReplayError> {
    let mut balance = 0i64;

    for entry in entries {
        if entry.previous_balance != balance {
            return Err(ReplayError::BrokenChain {
                entry_id: entry.id.clone(),
                expected: balance,
                found: entry.previous_balance,
            });
        }
        if !entry.is_balanced() {
            return Err(ReplayError::Unbalanced {
                entry_id: entry.id.clone(),
                previous: entry.previous_balance,
                delta: entry.sessions_delta,
                new: entry.new_balance,
            });
        }
        if entry.action_type.is_status_only() && entry.sessions_delta != 0 {
            return Err(ReplayError::StatusOnlyDelta {
                entry_id: entry.id.clone(),
                action: entry.action_type,
                delta: entry.sessions_delta,
            });
        }
        if entry.new_balance < 0 {
            return Err(ReplayError::NegativeBalance {
                entry_id: entry.id.clone(),
                balance: entry.new_balance,
            });
        }
        balance = entry.new_balance;
    }

    Ok(balance)
}

/// Check that a pack's ledger fully explains its current balance.
pub fn verify_pack_history(pack: &PatientPack, entries: &[LedgerEntry]) -> Result<(), ReplayError> {
    let replayed = replay_balance(entries)?;
    let recorded = i64::from(pack.remaining_sessions);
    if replayed != recorded {
        return Err(ReplayError::Mismatch { replayed, recorded });
    }
    Ok(())
}
