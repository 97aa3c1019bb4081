//! Patient pack models.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::template::PackTemplate;
use super::timestamp;

/// Lifecycle status of a pack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PackStatus {
    /// Sessions may be booked and consumed
    Active,
    /// Balance reached zero
    Completed,
    /// Validity period ran out
    Expired,
    /// Administratively paused
    Frozen,
}

impl PackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackStatus::Active => "active",
            PackStatus::Completed => "completed",
            PackStatus::Expired => "expired",
            PackStatus::Frozen => "frozen",
        }
    }
}

impl fmt::Display for PackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the pack was paid for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FinancialStatus {
    #[default]
    Paid,
    Partial,
    Complimentary,
}

impl FinancialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialStatus::Paid => "paid",
            FinancialStatus::Partial => "partial",
            FinancialStatus::Complimentary => "complimentary",
        }
    }
}

/// One purchased pack and its current balance.
///
/// Balance and status fields are only written by the pack lifecycle manager,
/// always after a matching ledger entry has been appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientPack {
    /// Unique pack ID
    pub id: String,
    /// Patient the pack belongs to
    pub patient_id: String,
    /// Patient display name
    pub patient_name: String,
    /// Originating template ID (may no longer exist)
    pub pack_template_id: String,
    /// Template name at the time of purchase
    pub pack_template_name: String,
    /// Purchase timestamp
    #[serde(with = "timestamp")]
    pub purchase_date: DateTime<Utc>,
    /// Expiry timestamp
    #[serde(with = "timestamp")]
    pub expiry_date: DateTime<Utc>,
    /// Sessions granted, including later adjustments
    pub total_sessions: u32,
    /// Sessions consumed
    pub used_sessions: u32,
    /// Sessions still available (`total_sessions - used_sessions`)
    pub remaining_sessions: u32,
    /// Lifecycle status
    pub status: PackStatus,
    /// Payment state
    pub financial_status: FinancialStatus,
    /// Free-form staff notes
    pub internal_notes: String,
    /// Creation timestamp
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl PatientPack {
    /// Instantiate a fresh, fully-funded pack from a template.
    pub fn from_template(
        patient_id: String,
        patient_name: String,
        template: &PackTemplate,
        financial_status: FinancialStatus,
        internal_notes: String,
    ) -> Self {
        let now = timestamp::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            patient_name,
            pack_template_id: template.id.clone(),
            pack_template_name: template.name.clone(),
            purchase_date: now,
            expiry_date: now + Duration::days(i64::from(template.validity_period)),
            total_sessions: template.total_sessions,
            used_sessions: 0,
            remaining_sessions: template.total_sessions,
            status: PackStatus::Active,
            financial_status,
            internal_notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether an appointment may draw on this pack.
    pub fn is_usable(&self) -> bool {
        self.status == PackStatus::Active && self.remaining_sessions > 0
    }

    /// Check `remaining = total - used`.
    pub fn balance_is_consistent(&self) -> bool {
        self.total_sessions.checked_sub(self.used_sessions) == Some(self.remaining_sessions)
    }
}
