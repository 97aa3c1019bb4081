//! Appointment book: links visits to packs and charges them on outcome.

use tracing::{debug, info, warn};

use crate::db::Repository;
use crate::models::{ActionType, Appointment, AppointmentStatus, PatientPack, TriggeredBy};
use crate::packs::{PackError, PackManager, PackResult, Rejection};

/// What happened to the linked pack when an appointment was settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Deduction {
    /// The appointment has no linked pack.
    Unlinked,
    /// One session was charged; the updated pack.
    Charged(PatientPack),
    /// The pack refused the charge (e.g. no sessions left).
    Skipped(Rejection),
    /// The linked pack no longer exists.
    PackMissing(String),
}

/// Result of marking an appointment attended or no-show.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentOutcome {
    pub appointment: Appointment,
    pub deduction: Deduction,
}

impl AppointmentOutcome {
    /// The charged pack, if a session was deducted.
    pub fn pack(&self) -> Option<&PatientPack> {
        match &self.deduction {
            Deduction::Charged(pack) => Some(pack),
            _ => None,
        }
    }
}

/// Appointment book.
pub struct AppointmentBook<'a> {
    repo: &'a Repository,
    packs: PackManager<'a>,
}

impl<'a> AppointmentBook<'a> {
    /// Create a new appointment book.
    pub fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            packs: PackManager::new(repo),
        }
    }

    /// Schedule a visit.
    ///
    /// The appointment is linked to the first of the patient's usable packs
    /// in storage order, or left unlinked if there is none.
    pub fn create_appointment(
        &self,
        patient_id: &str,
        patient_name: &str,
        scheduled_date: &str,
        service: &str,
        professional: &str,
    ) -> PackResult<Appointment> {
        let linked_pack = self
            .packs
            .active_packs_for_patient(patient_id)?
            .into_iter()
            .next();

        match &linked_pack {
            Some(pack) => debug!(patient_id, pack_id = %pack.id, "Linking appointment to pack"),
            None => debug!(patient_id, "No usable pack, appointment left unlinked"),
        }

        let appointment = Appointment::new(
            patient_id.to_string(),
            patient_name.to_string(),
            scheduled_date.to_string(),
            service.to_string(),
            professional.to_string(),
            linked_pack.map(|p| p.id),
        );
        self.repo.save(&appointment)?;

        info!(
            appointment_id = %appointment.id,
            patient_id,
            linked = appointment.is_linked(),
            "Appointment scheduled"
        );
        Ok(appointment)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: &str) -> PackResult<Option<Appointment>> {
        Ok(self.repo.find(appointment_id)?)
    }

    /// All appointments, in storage order.
    pub fn list_appointments(&self) -> PackResult<Vec<Appointment>> {
        Ok(self.repo.list()?)
    }

    /// Appointments drawing on a given pack.
    pub fn appointments_for_pack(&self, pack_id: &str) -> PackResult<Vec<Appointment>> {
        Ok(self
            .list_appointments()?
            .into_iter()
            .filter(|a| a.patient_pack_id.as_deref() == Some(pack_id))
            .collect())
    }

    /// Mark a scheduled appointment attended and charge the linked pack.
    pub fn mark_attended(&self, appointment_id: &str) -> PackResult<AppointmentOutcome> {
        self.settle(
            appointment_id,
            AppointmentStatus::Attended,
            ActionType::Used,
            "Session attended",
        )
    }

    /// Mark a scheduled appointment as a no-show and charge the linked pack.
    ///
    /// The template's no-show policy is not consulted.
    pub fn mark_no_show(&self, appointment_id: &str) -> PackResult<AppointmentOutcome> {
        self.settle(
            appointment_id,
            AppointmentStatus::NoShow,
            ActionType::NoShowCharged,
            "No-show charge",
        )
    }

    /// Cancel a scheduled appointment. Cancellations never charge a pack.
    pub fn cancel_appointment(&self, appointment_id: &str) -> PackResult<Appointment> {
        let appointment = self.load_scheduled(appointment_id)?;
        let cancelled = self
            .repo
            .update::<Appointment, _>(&appointment.id, |a| a.status = AppointmentStatus::Cancelled)?
            .ok_or_else(|| PackError::appointment_not_found(appointment_id))?;

        info!(appointment_id, "Appointment cancelled");
        Ok(cancelled)
    }

    fn settle(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
        action: ActionType,
        reason_prefix: &str,
    ) -> PackResult<AppointmentOutcome> {
        self.load_scheduled(appointment_id)?;
        let appointment = self
            .repo
            .update::<Appointment, _>(appointment_id, |a| a.status = status)?
            .ok_or_else(|| PackError::appointment_not_found(appointment_id))?;

        let deduction = match appointment.patient_pack_id.as_deref() {
            None => Deduction::Unlinked,
            Some(pack_id) => {
                let reason = format!("{} - {}", reason_prefix, appointment.service);
                match self.packs.deduct_session(
                    pack_id,
                    &reason,
                    action,
                    TriggeredBy::System,
                    Some(appointment_id),
                ) {
                    Ok(pack) => Deduction::Charged(pack),
                    Err(PackError::Rejected(rejection)) => Deduction::Skipped(rejection),
                    Err(PackError::NotFound { id, .. }) => {
                        warn!(appointment_id, pack_id = %id, "Linked pack no longer exists");
                        Deduction::PackMissing(id)
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        info!(appointment_id, status = %status, "Appointment settled");
        Ok(AppointmentOutcome {
            appointment,
            deduction,
        })
    }

    fn load_scheduled(&self, appointment_id: &str) -> PackResult<Appointment> {
        let appointment: Appointment = self
            .repo
            .find(appointment_id)?
            .ok_or_else(|| PackError::appointment_not_found(appointment_id))?;

        if appointment.status != AppointmentStatus::Scheduled {
            warn!(
                appointment_id,
                status = %appointment.status,
                "Appointment already settled"
            );
            return Err(Rejection::AppointmentNotScheduled(appointment.status).into());
        }
        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{FinancialStatus, NewPackTemplate, PackStatus, PackTemplate};

    fn setup(sessions: u32) -> (Repository, PackTemplate) {
        let repo = Repository::new(MemoryStore::new());
        let template = PackTemplate::new(NewPackTemplate::new("Physiotherapy Pack", sessions, 90));
        repo.save(&template).unwrap();
        (repo, template)
    }

    fn book_for(book: &AppointmentBook, patient_id: &str) -> Appointment {
        book.create_appointment(
            patient_id,
            "John Smith",
            "2025-01-10T09:00",
            "Physiotherapy",
            "Dr. Sarah Chen",
        )
        .unwrap()
    }

    #[test]
    fn test_create_links_first_usable_pack() {
        let (repo, template) = setup(5);
        let packs = PackManager::new(&repo);
        let frozen = packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        packs.freeze_pack(&frozen.id, "Travel", TriggeredBy::Admin).unwrap();
        let usable = packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();

        let book = AppointmentBook::new(&repo);
        let appt = book_for(&book, "patient-001");

        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert_eq!(appt.patient_pack_id.as_deref(), Some(usable.id.as_str()));
    }

    #[test]
    fn test_create_without_pack_is_unlinked() {
        let (repo, _) = setup(5);
        let book = AppointmentBook::new(&repo);
        let appt = book_for(&book, "patient-404");
        assert!(!appt.is_linked());
    }

    #[test]
    fn test_mark_attended_charges_pack() {
        let (repo, template) = setup(5);
        let packs = PackManager::new(&repo);
        let pack = packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        let book = AppointmentBook::new(&repo);
        let appt = book_for(&book, "patient-001");

        let outcome = book.mark_attended(&appt.id).unwrap();
        assert_eq!(outcome.appointment.status, AppointmentStatus::Attended);
        assert_eq!(outcome.pack().unwrap().remaining_sessions, 4);

        let entry = packs.ledger().list_for_pack(&pack.id).unwrap().pop().unwrap();
        assert_eq!(entry.action_type, ActionType::Used);
        assert_eq!(entry.triggered_by, TriggeredBy::System);
        assert_eq!(entry.reason, "Session attended - Physiotherapy");
        assert_eq!(entry.appointment_id.as_deref(), Some(appt.id.as_str()));
    }

    #[test]
    fn test_mark_no_show_charges_pack() {
        let (repo, template) = setup(5);
        let packs = PackManager::new(&repo);
        let pack = packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        let book = AppointmentBook::new(&repo);
        let appt = book_for(&book, "patient-001");

        let outcome = book.mark_no_show(&appt.id).unwrap();
        assert_eq!(outcome.appointment.status, AppointmentStatus::NoShow);

        let entry = packs.ledger().list_for_pack(&pack.id).unwrap().pop().unwrap();
        assert_eq!(entry.action_type, ActionType::NoShowCharged);
        assert_eq!(entry.reason, "No-show charge - Physiotherapy");
    }

    #[test]
    fn test_unlinked_outcome() {
        let (repo, _) = setup(5);
        let book = AppointmentBook::new(&repo);
        let appt = book_for(&book, "patient-404");

        let outcome = book.mark_attended(&appt.id).unwrap();
        assert_eq!(outcome.deduction, Deduction::Unlinked);
        assert_eq!(outcome.appointment.status, AppointmentStatus::Attended);
    }

    #[test]
    fn test_exhausted_pack_skips_charge_but_settles_appointment() {
        let (repo, template) = setup(1);
        let packs = PackManager::new(&repo);
        packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        let book = AppointmentBook::new(&repo);
        let first = book_for(&book, "patient-001");
        let second = book_for(&book, "patient-001");

        let outcome = book.mark_attended(&first.id).unwrap();
        assert_eq!(outcome.pack().unwrap().status, PackStatus::Completed);

        let outcome = book.mark_attended(&second.id).unwrap();
        assert_eq!(outcome.deduction, Deduction::Skipped(Rejection::NoSessionsRemaining));
        assert_eq!(outcome.appointment.status, AppointmentStatus::Attended);
    }

    #[test]
    fn test_settled_appointment_cannot_be_charged_twice() {
        let (repo, template) = setup(5);
        let packs = PackManager::new(&repo);
        let pack = packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        let book = AppointmentBook::new(&repo);
        let appt = book_for(&book, "patient-001");

        book.mark_attended(&appt.id).unwrap();
        let err = book.mark_no_show(&appt.id).unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&Rejection::AppointmentNotScheduled(AppointmentStatus::Attended))
        );
        assert_eq!(packs.get_pack(&pack.id).unwrap().unwrap().remaining_sessions, 4);
    }

    #[test]
    fn test_cancel_never_charges() {
        let (repo, template) = setup(5);
        let packs = PackManager::new(&repo);
        let pack = packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        let book = AppointmentBook::new(&repo);
        let appt = book_for(&book, "patient-001");

        let cancelled = book.cancel_appointment(&appt.id).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert!(book.mark_attended(&appt.id).is_err());
        assert_eq!(packs.get_pack(&pack.id).unwrap().unwrap().remaining_sessions, 5);
        assert_eq!(packs.ledger().list_for_pack(&pack.id).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_appointment() {
        let (repo, _) = setup(5);
        let book = AppointmentBook::new(&repo);
        assert!(book.mark_attended("nope").unwrap_err().is_not_found());
        assert!(book.cancel_appointment("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_appointments_for_pack() {
        let (repo, template) = setup(5);
        let packs = PackManager::new(&repo);
        let pack = packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        let book = AppointmentBook::new(&repo);
        book_for(&book, "patient-001");
        book_for(&book, "patient-001");
        book_for(&book, "patient-404");

        assert_eq!(book.appointments_for_pack(&pack.id).unwrap().len(), 2);
        assert_eq!(book.list_appointments().unwrap().len(), 3);
    }
}
