//! Session ledger models (append-only audit trail).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pack::PatientPack;
use super::timestamp;

/// Kind of action recorded by a ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    /// Session consumed by an attended appointment or manual deduction
    Used,
    /// Session charged for a missed appointment
    NoShowCharged,
    /// Missed appointment not charged
    NoShowWaived,
    Cancelled,
    /// Manual balance correction, including purchases and top-ups
    Adjustment,
    Freeze,
    Unfreeze,
    Refund,
    Transfer,
    /// Expiry date moved
    Extend,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Used => "used",
            ActionType::NoShowCharged => "no-show-charged",
            ActionType::NoShowWaived => "no-show-waived",
            ActionType::Cancelled => "cancelled",
            ActionType::Adjustment => "adjustment",
            ActionType::Freeze => "freeze",
            ActionType::Unfreeze => "unfreeze",
            ActionType::Refund => "refund",
            ActionType::Transfer => "transfer",
            ActionType::Extend => "extend",
        }
    }

    /// Actions that only change status or dates and never move the balance.
    pub fn is_status_only(&self) -> bool {
        matches!(
            self,
            ActionType::Freeze | ActionType::Unfreeze | ActionType::Extend
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who caused a ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TriggeredBy {
    System,
    Reception,
    Admin,
}

impl TriggeredBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggeredBy::System => "system",
            TriggeredBy::Reception => "reception",
            TriggeredBy::Admin => "admin",
        }
    }
}

impl fmt::Display for TriggeredBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable audit record of one balance- or status-affecting action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Unique entry ID
    pub id: String,
    /// When the entry was recorded
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Pack whose balance or status changed
    pub patient_pack_id: String,
    /// Appointment that caused the change, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    /// What happened
    pub action_type: ActionType,
    /// Signed change in remaining sessions (0 for status-only actions)
    pub sessions_delta: i64,
    /// Actor tag
    pub triggered_by: TriggeredBy,
    /// Human-readable justification
    pub reason: String,
    /// Remaining sessions before the action
    pub previous_balance: i64,
    /// Remaining sessions after the action
    pub new_balance: i64,
}

impl LedgerEntry {
    /// Whether `previous_balance + sessions_delta == new_balance`.
    pub fn is_balanced(&self) -> bool {
        self.previous_balance.checked_add(self.sessions_delta) == Some(self.new_balance)
    }
}

/// A ledger entry before the engine assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub patient_pack_id: String,
    pub appointment_id: Option<String>,
    pub action_type: ActionType,
    pub sessions_delta: i64,
    pub triggered_by: TriggeredBy,
    pub reason: String,
    pub previous_balance: i64,
    pub new_balance: i64,
}

impl NewLedgerEntry {
    /// Entry moving the pack's balance by `delta`.
    pub fn balance_change(
        pack: &PatientPack,
        action_type: ActionType,
        delta: i64,
        triggered_by: TriggeredBy,
        reason: impl Into<String>,
    ) -> Self {
        let previous_balance = i64::from(pack.remaining_sessions);
        Self {
            patient_pack_id: pack.id.clone(),
            appointment_id: None,
            action_type,
            sessions_delta: delta,
            triggered_by,
            reason: reason.into(),
            previous_balance,
            new_balance: previous_balance + delta,
        }
    }

    /// Entry recording a status or date change; the balance is carried over unchanged.
    pub fn status_change(
        pack: &PatientPack,
        action_type: ActionType,
        triggered_by: TriggeredBy,
        reason: impl Into<String>,
    ) -> Self {
        Self::balance_change(pack, action_type, 0, triggered_by, reason)
    }

    /// Attach the appointment that caused the entry.
    pub fn with_appointment(mut self, appointment_id: Option<&str>) -> Self {
        self.appointment_id = appointment_id.map(str::to_string);
        self
    }

    /// Stamp the entry for storage.
    pub fn into_entry(self) -> LedgerEntry {
        LedgerEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: timestamp::now(),
            patient_pack_id: self.patient_pack_id,
            appointment_id: self.appointment_id,
            action_type: self.action_type,
            sessions_delta: self.sessions_delta,
            triggered_by: self.triggered_by,
            reason: self.reason,
            previous_balance: self.previous_balance,
            new_balance: self.new_balance,
        }
    }
}
