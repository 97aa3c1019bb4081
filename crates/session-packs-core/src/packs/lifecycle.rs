//! Pack lifecycle manager.
//!
//! Each operation reads the pack, checks its preconditions, appends the ledger
//! entry and only then writes the pack back. A rejected operation writes
//! nothing.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{require_reason, PackError, PackOverview, PackResult, Rejection};
use crate::db::Repository;
use crate::ledger::LedgerEngine;
use crate::models::{
    ActionType, FinancialStatus, NewLedgerEntry, PackStatus, PackTemplate, PatientPack,
    TriggeredBy,
};

/// Pack lifecycle manager.
pub struct PackManager<'a> {
    repo: &'a Repository,
    ledger: LedgerEngine<'a>,
}

impl<'a> PackManager<'a> {
    /// Create a new pack manager.
    pub fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            ledger: LedgerEngine::new(repo),
        }
    }

    /// Ledger engine used by this manager.
    pub fn ledger(&self) -> &LedgerEngine<'a> {
        &self.ledger
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get a pack by ID.
    pub fn get_pack(&self, pack_id: &str) -> PackResult<Option<PatientPack>> {
        Ok(self.repo.find(pack_id)?)
    }

    /// All packs, in storage order.
    pub fn list_packs(&self) -> PackResult<Vec<PatientPack>> {
        Ok(self.repo.list()?)
    }

    /// A patient's packs that can still be drawn on, in storage order.
    pub fn active_packs_for_patient(&self, patient_id: &str) -> PackResult<Vec<PatientPack>> {
        Ok(self
            .list_packs()?
            .into_iter()
            .filter(|p| p.patient_id == patient_id && p.is_usable())
            .collect())
    }

    /// Case-insensitive search over patient name, template name and patient ID.
    pub fn search_packs(&self, query: &str) -> PackResult<Vec<PatientPack>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .list_packs()?
            .into_iter()
            .filter(|p| {
                needle.is_empty()
                    || p.patient_name.to_lowercase().contains(&needle)
                    || p.pack_template_name.to_lowercase().contains(&needle)
                    || p.patient_id.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Status counts across all packs.
    pub fn overview(&self) -> PackResult<PackOverview> {
        let packs = self.list_packs()?;
        Ok(PackOverview::from_packs(
            &packs,
            self.repo.config().overview_low_balance,
        ))
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Sell a pack from a stored template.
    pub fn create_pack(
        &self,
        patient_id: &str,
        patient_name: &str,
        template_id: &str,
        financial_status: FinancialStatus,
        internal_notes: &str,
    ) -> PackResult<PatientPack> {
        let template: PackTemplate = self
            .repo
            .find(template_id)?
            .ok_or_else(|| PackError::template_not_found(template_id))?;

        self.create_pack_from_template(
            patient_id,
            patient_name,
            &template,
            financial_status,
            internal_notes,
        )
    }

    /// Sell a pack from a template value.
    ///
    /// The purchase is recorded as an `adjustment` from 0 to the template's
    /// session count.
    pub fn create_pack_from_template(
        &self,
        patient_id: &str,
        patient_name: &str,
        template: &PackTemplate,
        financial_status: FinancialStatus,
        internal_notes: &str,
    ) -> PackResult<PatientPack> {
        if patient_id.trim().is_empty() {
            return Err(PackError::InvalidInput("patient ID is required".into()));
        }
        template.validate().map_err(PackError::InvalidInput)?;

        let pack = PatientPack::from_template(
            patient_id.to_string(),
            patient_name.to_string(),
            template,
            financial_status,
            internal_notes.to_string(),
        );

        let mut opening = NewLedgerEntry::balance_change(
            &pack,
            ActionType::Adjustment,
            i64::from(template.total_sessions),
            TriggeredBy::System,
            format!("Pack purchased: {}", template.name),
        );
        opening.previous_balance = 0;
        opening.new_balance = i64::from(template.total_sessions);

        self.ledger.append(opening)?;
        self.repo.save(&pack)?;

        info!(
            pack_id = %pack.id,
            patient_id = %pack.patient_id,
            template = %template.name,
            sessions = pack.total_sessions,
            "Pack created"
        );
        Ok(pack)
    }

    // =========================================================================
    // Guarded operations
    // =========================================================================

    /// Consume one session.
    ///
    /// The pack becomes `completed` when its balance reaches zero; any other
    /// status is kept.
    pub fn deduct_session(
        &self,
        pack_id: &str,
        reason: &str,
        action_type: ActionType,
        triggered_by: TriggeredBy,
        appointment_id: Option<&str>,
    ) -> PackResult<PatientPack> {
        require_reason(reason)?;
        let pack = self.load(pack_id)?;

        if pack.remaining_sessions == 0 {
            return Err(self.reject(&pack, action_type, Rejection::NoSessionsRemaining));
        }

        let used_sessions = pack.used_sessions + 1;
        let remaining_sessions = pack.remaining_sessions - 1;
        let status = if remaining_sessions == 0 {
            PackStatus::Completed
        } else {
            pack.status
        };

        self.ledger.append(
            NewLedgerEntry::balance_change(&pack, action_type, -1, triggered_by, reason)
                .with_appointment(appointment_id),
        )?;

        let updated = self.persist(pack_id, |p| {
            p.used_sessions = used_sessions;
            p.remaining_sessions = remaining_sessions;
            p.status = status;
        })?;

        info!(
            pack_id,
            action = %action_type,
            remaining = updated.remaining_sessions,
            status = %updated.status,
            "Session deducted"
        );
        Ok(updated)
    }

    /// Grant extra sessions. A `completed` pack is reopened as `active`.
    pub fn add_sessions(
        &self,
        pack_id: &str,
        count: i64,
        reason: &str,
        triggered_by: TriggeredBy,
    ) -> PackResult<PatientPack> {
        self.grant_sessions(pack_id, count, reason, triggered_by, None)
    }

    /// Pause a pack. Only an `active` pack can be frozen.
    pub fn freeze_pack(
        &self,
        pack_id: &str,
        reason: &str,
        triggered_by: TriggeredBy,
    ) -> PackResult<PatientPack> {
        require_reason(reason)?;
        let pack = self.load(pack_id)?;

        if pack.status != PackStatus::Active {
            return Err(self.reject(&pack, ActionType::Freeze, Rejection::NotActive(pack.status)));
        }

        self.ledger.append(NewLedgerEntry::status_change(
            &pack,
            ActionType::Freeze,
            triggered_by,
            reason,
        ))?;
        let updated = self.persist(pack_id, |p| p.status = PackStatus::Frozen)?;

        info!(pack_id, "Pack frozen");
        Ok(updated)
    }

    /// Resume a frozen pack.
    pub fn unfreeze_pack(
        &self,
        pack_id: &str,
        reason: &str,
        triggered_by: TriggeredBy,
    ) -> PackResult<PatientPack> {
        require_reason(reason)?;
        let pack = self.load(pack_id)?;

        if pack.status != PackStatus::Frozen {
            return Err(self.reject(&pack, ActionType::Unfreeze, Rejection::NotFrozen(pack.status)));
        }

        self.ledger.append(NewLedgerEntry::status_change(
            &pack,
            ActionType::Unfreeze,
            triggered_by,
            reason,
        ))?;
        let updated = self.persist(pack_id, |p| p.status = PackStatus::Active)?;

        info!(pack_id, "Pack unfrozen");
        Ok(updated)
    }

    /// Move the expiry date. An `expired` pack is reactivated.
    pub fn extend_expiry(
        &self,
        pack_id: &str,
        new_expiry: DateTime<Utc>,
        reason: &str,
        triggered_by: TriggeredBy,
    ) -> PackResult<PatientPack> {
        require_reason(reason)?;
        let pack = self.load(pack_id)?;

        let status = if pack.status == PackStatus::Expired {
            PackStatus::Active
        } else {
            pack.status
        };
        let audited_reason = format!("{} | New expiry: {}", reason, new_expiry.format("%Y-%m-%d"));

        self.ledger.append(NewLedgerEntry::status_change(
            &pack,
            ActionType::Extend,
            triggered_by,
            audited_reason,
        ))?;
        let updated = self.persist(pack_id, |p| {
            p.expiry_date = new_expiry;
            p.status = status;
        })?;

        info!(
            pack_id,
            expiry = %crate::models::format_timestamp(&updated.expiry_date),
            status = %updated.status,
            "Pack expiry extended"
        );
        Ok(updated)
    }

    /// Expire an `active` pack whose expiry date has passed by `now`.
    ///
    /// Entry point for an expiry sweep run outside the core. Recorded as a
    /// zero-delta `adjustment`; `extend_expiry` reactivates the pack.
    pub fn mark_expired(
        &self,
        pack_id: &str,
        now: DateTime<Utc>,
        triggered_by: TriggeredBy,
    ) -> PackResult<PatientPack> {
        let pack = self.load(pack_id)?;

        if pack.status != PackStatus::Active {
            return Err(self.reject(&pack, ActionType::Adjustment, Rejection::NotActive(pack.status)));
        }
        if pack.expiry_date > now {
            return Err(self.reject(
                &pack,
                ActionType::Adjustment,
                Rejection::NotYetExpired(pack.expiry_date),
            ));
        }

        self.ledger.append(NewLedgerEntry::status_change(
            &pack,
            ActionType::Adjustment,
            triggered_by,
            format!("Pack expired: {}", pack.expiry_date.format("%Y-%m-%d")),
        ))?;
        let updated = self.persist(pack_id, |p| p.status = PackStatus::Expired)?;

        info!(
            pack_id,
            expiry = %crate::models::format_timestamp(&updated.expiry_date),
            remaining = updated.remaining_sessions,
            "Pack expired"
        );
        Ok(updated)
    }

    /// Give back the session charged for a missed appointment.
    ///
    /// Recorded as a one-session `adjustment` tied to the appointment. Whether
    /// the appointment was actually charged is not checked.
    pub fn waive_no_show(
        &self,
        pack_id: &str,
        appointment_id: &str,
        reason: &str,
        triggered_by: TriggeredBy,
    ) -> PackResult<PatientPack> {
        require_reason(reason)?;
        self.grant_sessions(
            pack_id,
            1,
            &format!("No-show waived: {}", reason),
            triggered_by,
            Some(appointment_id),
        )
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn grant_sessions(
        &self,
        pack_id: &str,
        count: i64,
        reason: &str,
        triggered_by: TriggeredBy,
        appointment_id: Option<&str>,
    ) -> PackResult<PatientPack> {
        require_reason(reason)?;
        let pack = self.load(pack_id)?;

        if count <= 0 {
            return Err(self.reject(&pack, ActionType::Adjustment, Rejection::NonPositiveCount(count)));
        }
        let added = u32::try_from(count)
            .map_err(|_| PackError::InvalidInput(format!("cannot add {} sessions", count)))?;
        let (Some(total_sessions), Some(remaining_sessions)) = (
            pack.total_sessions.checked_add(added),
            pack.remaining_sessions.checked_add(added),
        ) else {
            return Err(PackError::InvalidInput(format!(
                "adding {} sessions overflows the pack balance",
                count
            )));
        };
        let status = if pack.status == PackStatus::Completed {
            PackStatus::Active
        } else {
            pack.status
        };

        self.ledger.append(
            NewLedgerEntry::balance_change(&pack, ActionType::Adjustment, count, triggered_by, reason)
                .with_appointment(appointment_id),
        )?;

        let updated = self.persist(pack_id, |p| {
            p.total_sessions = total_sessions;
            p.remaining_sessions = remaining_sessions;
            p.status = status;
        })?;

        info!(
            pack_id,
            added = count,
            remaining = updated.remaining_sessions,
            status = %updated.status,
            "Sessions added"
        );
        Ok(updated)
    }

    fn load(&self, pack_id: &str) -> PackResult<PatientPack> {
        self.repo
            .find(pack_id)?
            .ok_or_else(|| PackError::pack_not_found(pack_id))
    }

    fn persist<F>(&self, pack_id: &str, patch: F) -> PackResult<PatientPack>
    where
        F: FnOnce(&mut PatientPack),
    {
        self.repo
            .update(pack_id, patch)?
            .ok_or_else(|| PackError::pack_not_found(pack_id))
    }

    fn reject(&self, pack: &PatientPack, action: ActionType, rejection: Rejection) -> PackError {
        warn!(
            pack_id = %pack.id,
            action = %action,
            status = %pack.status,
            remaining = pack.remaining_sessions,
            reason = %rejection,
            "Pack operation rejected"
        );
        PackError::Rejected(rejection)
    }
}
