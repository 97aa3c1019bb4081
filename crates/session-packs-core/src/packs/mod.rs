//! Pack lifecycle: templates, pack creation and guarded balance/status changes.
//!
//! ```text
//!            deduct to 0              addSessions
//!   active ───────────────▶ completed ───────────▶ active
//!     │  ▲
//!     │  │ unfreeze
//!     ▼  │
//!   frozen
//!
//!   active ──markExpired──▶ expired ──extendExpiry──▶ active
//! ```
//!
//! `mark_expired` is called per pack by whatever schedules the expiry sweep;
//! the core never expires a pack on its own.

mod lifecycle;
mod overview;
mod templates;

pub use lifecycle::*;
pub use overview::*;
pub use templates::*;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{AppointmentStatus, PackStatus};

/// A precondition that made an operation a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("pack has no remaining sessions")]
    NoSessionsRemaining,

    #[error("pack is {0}, not active")]
    NotActive(PackStatus),

    #[error("pack is {0}, not frozen")]
    NotFrozen(PackStatus),

    #[error("pack does not expire until {0}")]
    NotYetExpired(DateTime<Utc>),

    #[error("session count must be positive, got {0}")]
    NonPositiveCount(i64),

    #[error("appointment is {0}, not scheduled")]
    AppointmentNotScheduled(AppointmentStatus),
}

/// Pack operation errors.
///
/// `NotFound` and `Rejected` are expected outcomes: nothing was written.
#[derive(Error, Debug)]
pub enum PackError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] crate::ledger::LedgerError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PackError {
    pub(crate) fn pack_not_found(id: &str) -> Self {
        PackError::NotFound {
            kind: "Pack",
            id: id.to_string(),
        }
    }

    pub(crate) fn template_not_found(id: &str) -> Self {
        PackError::NotFound {
            kind: "Template",
            id: id.to_string(),
        }
    }

    pub(crate) fn appointment_not_found(id: &str) -> Self {
        PackError::NotFound {
            kind: "Appointment",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PackError::NotFound { .. })
    }

    /// The failed precondition, if that is why the operation did nothing.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            PackError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

pub type PackResult<T> = Result<T, PackError>;

/// Reject blank reasons before anything is read or written.
pub(crate) fn require_reason(reason: &str) -> PackResult<()> {
    if reason.trim().is_empty() {
        return Err(PackError::InvalidInput("a reason is required".into()));
    }
    Ok(())
}
