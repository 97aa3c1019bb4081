//! Session Packs Core Library
//!
//! Prepaid session packs for a clinic: patients buy a bundle of sessions from
//! a template, appointments draw on the bundle, and every change to a pack's
//! balance or status is explained by an immutable ledger entry.
//!
//! # Architecture
//!
//! ```text
//!   TemplateCatalog ──create_pack──▶ PackManager ◀──mark attended / no-show── AppointmentBook
//!                                        │
//!                          ┌─────────────┴─────────────┐
//!                          ▼                           ▼
//!                    LedgerEngine                 pack update
//!                 (append, never edit)     (only after the ledger append)
//!                          │                           │
//!                          └─────────────┬─────────────┘
//!                                        ▼
//!                                   Repository
//!                                        │
//!                           Store: SQLite │ in-memory
//!                                        │
//!                  ┌─────────────────────┼─────────────────────┐
//!                  ▼                     ▼                     ▼
//!             Visual state        Audit export          Balance replay
//!         (healthy/low/blocked)  (JSON/CSV + SHA-256)   (ledger ⇒ balance)
//! ```
//!
//! # Core Principle
//!
//! **No balance without a ledger entry.** A rejected operation writes neither
//! the ledger nor the pack.
//!
//! # Modules
//!
//! - [`db`]: Store capability, SQLite and in-memory stores, typed repository
//! - [`models`]: Domain types (PackTemplate, PatientPack, LedgerEntry, Appointment)
//! - [`ledger`]: Append-only ledger engine and balance replay
//! - [`packs`]: Template catalog and pack lifecycle
//! - [`appointments`]: Appointment booking and pack charging
//! - [`visual`]: Display classification of packs
//! - [`export`]: Audit trail export
//! - [`demo`]: Demo data for a fresh install
//! - [`config`]: Runtime configuration

pub mod appointments;
pub mod config;
pub mod db;
pub mod demo;
pub mod export;
pub mod ledger;
pub mod models;
pub mod packs;
pub mod visual;

// Re-export commonly used types
pub use appointments::{AppointmentBook, AppointmentOutcome, Deduction};
pub use config::{CoreConfig, MalformedDataPolicy, VisualThresholds};
pub use db::{Database, MemoryStore, Repository, Store};
pub use demo::seed_demo_data;
pub use export::{AuditExporter, AuditTrailExport, BatchAuditExport};
pub use ledger::{replay_balance, verify_pack_history, LedgerEngine, ReplayError};
pub use models::{
    ActionType, Appointment, AppointmentStatus, FinancialStatus, LedgerEntry, NewPackTemplate,
    PackStatus, PackTemplate, PatientPack, TemplatePatch, TriggeredBy,
};
pub use packs::{PackError, PackManager, PackOverview, Rejection, TemplateCatalog};
pub use visual::{get_visual_state, visual_state_at, VisualState};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SessionPacksError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for SessionPacksError {
    fn from(e: db::DbError) -> Self {
        SessionPacksError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for SessionPacksError {
    fn from(e: serde_json::Error) -> Self {
        SessionPacksError::SerializationError(e.to_string())
    }
}

impl From<ledger::LedgerError> for SessionPacksError {
    fn from(e: ledger::LedgerError) -> Self {
        match e {
            ledger::LedgerError::EmptyReason(_) => SessionPacksError::InvalidInput(e.to_string()),
            ledger::LedgerError::Database(e) => e.into(),
        }
    }
}

impl From<PackError> for SessionPacksError {
    fn from(e: PackError) -> Self {
        match e {
            PackError::Database(e) => e.into(),
            PackError::Ledger(e) => e.into(),
            PackError::NotFound { .. } => SessionPacksError::NotFound(e.to_string()),
            PackError::Rejected(rejection) => SessionPacksError::Rejected(rejection.to_string()),
            PackError::InvalidInput(msg) => SessionPacksError::InvalidInput(msg),
        }
    }
}

impl From<export::ExportError> for SessionPacksError {
    fn from(e: export::ExportError) -> Self {
        match e {
            export::ExportError::Database(e) => e.into(),
            export::ExportError::Ledger(e) => e.into(),
            export::ExportError::PackNotFound(id) => {
                SessionPacksError::NotFound(format!("Pack not found: {}", id))
            }
            export::ExportError::Serialization(e) => e.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for SessionPacksError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        SessionPacksError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

/// Parse a wire-format enum value, naming the field on failure.
fn parse_field<T: DeserializeOwned>(field: &str, raw: &str) -> Result<T, SessionPacksError> {
    models::parse_wire(raw)
        .ok_or_else(|| SessionPacksError::InvalidInput(format!("unknown {}: {}", field, raw)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<SessionPacksCore>, SessionPacksError> {
    let db = Database::open(&path)?;
    Ok(SessionPacksCore::with_repository(Repository::new(db)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<SessionPacksCore>, SessionPacksError> {
    let db = Database::open_in_memory()?;
    Ok(SessionPacksCore::with_repository(Repository::new(db)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe repository wrapper for FFI.
#[derive(uniffi::Object)]
pub struct SessionPacksCore {
    repo: Arc<Mutex<Repository>>,
}

impl SessionPacksCore {
    /// Wrap an already configured repository.
    pub fn with_repository(repo: Repository) -> Arc<Self> {
        Arc::new(Self {
            repo: Arc::new(Mutex::new(repo)),
        })
    }
}

#[uniffi::export]
impl SessionPacksCore {
    // =========================================================================
    // Template Operations
    // =========================================================================

    /// Create a pack template.
    pub fn create_template(&self, input: FfiTemplateInput) -> Result<FfiPackTemplate, SessionPacksError> {
        let repo = self.repo.lock()?;
        let fields = input.into_fields()?;
        let template = TemplateCatalog::new(&repo).create_template(fields)?;
        Ok(template.into())
    }

    /// Get a template by ID.
    pub fn get_template(&self, template_id: String) -> Result<Option<FfiPackTemplate>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let template = TemplateCatalog::new(&repo).get_template(&template_id)?;
        Ok(template.map(|t| t.into()))
    }

    /// List all templates.
    pub fn list_templates(&self) -> Result<Vec<FfiPackTemplate>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let templates = TemplateCatalog::new(&repo).list_templates()?;
        Ok(templates.into_iter().map(|t| t.into()).collect())
    }

    /// Search templates by name.
    pub fn search_templates(&self, query: String) -> Result<Vec<FfiPackTemplate>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let templates = TemplateCatalog::new(&repo).search_templates(&query)?;
        Ok(templates.into_iter().map(|t| t.into()).collect())
    }

    /// Replace a template's editable fields.
    pub fn update_template(
        &self,
        template_id: String,
        input: FfiTemplateInput,
    ) -> Result<FfiPackTemplate, SessionPacksError> {
        let repo = self.repo.lock()?;
        let patch = input.into_patch()?;
        let template = TemplateCatalog::new(&repo).update_template(&template_id, &patch)?;
        Ok(template.into())
    }

    /// Delete a template. Existing packs are kept.
    pub fn delete_template(&self, template_id: String) -> Result<bool, SessionPacksError> {
        let repo = self.repo.lock()?;
        Ok(TemplateCatalog::new(&repo).delete_template(&template_id)?)
    }

    // =========================================================================
    // Pack Operations
    // =========================================================================

    /// Sell a pack from a template.
    pub fn create_pack(
        &self,
        patient_id: String,
        patient_name: String,
        template_id: String,
        financial_status: String,
        internal_notes: String,
    ) -> Result<FfiPatientPack, SessionPacksError> {
        let repo = self.repo.lock()?;
        let financial_status = parse_field("financial status", &financial_status)?;
        let pack = PackManager::new(&repo).create_pack(
            &patient_id,
            &patient_name,
            &template_id,
            financial_status,
            &internal_notes,
        )?;
        Ok(FfiPatientPack::from_pack(pack, repo.config()))
    }

    /// Get a pack by ID.
    pub fn get_pack(&self, pack_id: String) -> Result<Option<FfiPatientPack>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let pack = PackManager::new(&repo).get_pack(&pack_id)?;
        Ok(pack.map(|p| FfiPatientPack::from_pack(p, repo.config())))
    }

    /// List all packs.
    pub fn list_packs(&self) -> Result<Vec<FfiPatientPack>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let packs = PackManager::new(&repo).list_packs()?;
        Ok(FfiPatientPack::from_packs(packs, repo.config()))
    }

    /// A patient's packs that can still be drawn on.
    pub fn active_packs_for_patient(&self, patient_id: String) -> Result<Vec<FfiPatientPack>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let packs = PackManager::new(&repo).active_packs_for_patient(&patient_id)?;
        Ok(FfiPatientPack::from_packs(packs, repo.config()))
    }

    /// Search packs by patient name, template name or patient ID.
    pub fn search_packs(&self, query: String) -> Result<Vec<FfiPatientPack>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let packs = PackManager::new(&repo).search_packs(&query)?;
        Ok(FfiPatientPack::from_packs(packs, repo.config()))
    }

    /// Pack counts by status.
    pub fn get_overview(&self) -> Result<FfiPackOverview, SessionPacksError> {
        let repo = self.repo.lock()?;
        let overview = PackManager::new(&repo).overview()?;
        Ok(overview.into())
    }

    /// Consume one session.
    pub fn deduct_session(
        &self,
        pack_id: String,
        reason: String,
        action_type: String,
        triggered_by: String,
        appointment_id: Option<String>,
    ) -> Result<FfiPatientPack, SessionPacksError> {
        let repo = self.repo.lock()?;
        let action_type = parse_field("action type", &action_type)?;
        let triggered_by = parse_field("actor", &triggered_by)?;
        let pack = PackManager::new(&repo).deduct_session(
            &pack_id,
            &reason,
            action_type,
            triggered_by,
            appointment_id.as_deref(),
        )?;
        Ok(FfiPatientPack::from_pack(pack, repo.config()))
    }

    /// Grant extra sessions.
    pub fn add_sessions(
        &self,
        pack_id: String,
        count: i64,
        reason: String,
        triggered_by: String,
    ) -> Result<FfiPatientPack, SessionPacksError> {
        let repo = self.repo.lock()?;
        let triggered_by = parse_field("actor", &triggered_by)?;
        let pack = PackManager::new(&repo).add_sessions(&pack_id, count, &reason, triggered_by)?;
        Ok(FfiPatientPack::from_pack(pack, repo.config()))
    }

    /// Pause an active pack.
    pub fn freeze_pack(
        &self,
        pack_id: String,
        reason: String,
        triggered_by: String,
    ) -> Result<FfiPatientPack, SessionPacksError> {
        let repo = self.repo.lock()?;
        let triggered_by = parse_field("actor", &triggered_by)?;
        let pack = PackManager::new(&repo).freeze_pack(&pack_id, &reason, triggered_by)?;
        Ok(FfiPatientPack::from_pack(pack, repo.config()))
    }

    /// Resume a frozen pack.
    pub fn unfreeze_pack(
        &self,
        pack_id: String,
        reason: String,
        triggered_by: String,
    ) -> Result<FfiPatientPack, SessionPacksError> {
        let repo = self.repo.lock()?;
        let triggered_by = parse_field("actor", &triggered_by)?;
        let pack = PackManager::new(&repo).unfreeze_pack(&pack_id, &reason, triggered_by)?;
        Ok(FfiPatientPack::from_pack(pack, repo.config()))
    }

    /// Move a pack's expiry date (ISO-8601 timestamp or `YYYY-MM-DD`).
    pub fn extend_expiry(
        &self,
        pack_id: String,
        new_expiry: String,
        reason: String,
        triggered_by: String,
    ) -> Result<FfiPatientPack, SessionPacksError> {
        let repo = self.repo.lock()?;
        let expiry = models::parse_timestamp(&new_expiry)
            .ok_or_else(|| SessionPacksError::InvalidInput(format!("invalid expiry date: {}", new_expiry)))?;
        let triggered_by = parse_field("actor", &triggered_by)?;
        let pack = PackManager::new(&repo).extend_expiry(&pack_id, expiry, &reason, triggered_by)?;
        Ok(FfiPatientPack::from_pack(pack, repo.config()))
    }

    /// Expire an active pack whose expiry date has passed.
    pub fn mark_expired(&self, pack_id: String, triggered_by: String) -> Result<FfiPatientPack, SessionPacksError> {
        let repo = self.repo.lock()?;
        let triggered_by = parse_field("actor", &triggered_by)?;
        let pack = PackManager::new(&repo).mark_expired(&pack_id, chrono::Utc::now(), triggered_by)?;
        Ok(FfiPatientPack::from_pack(pack, repo.config()))
    }

    /// Give back the session charged for a missed appointment.
    pub fn waive_no_show(
        &self,
        pack_id: String,
        appointment_id: String,
        reason: String,
        triggered_by: String,
    ) -> Result<FfiPatientPack, SessionPacksError> {
        let repo = self.repo.lock()?;
        let triggered_by = parse_field("actor", &triggered_by)?;
        let pack =
            PackManager::new(&repo).waive_no_show(&pack_id, &appointment_id, &reason, triggered_by)?;
        Ok(FfiPatientPack::from_pack(pack, repo.config()))
    }

    /// Visual state of a pack, `None` if the pack does not exist.
    pub fn get_visual_state(&self, pack_id: String) -> Result<Option<String>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let pack = PackManager::new(&repo).get_pack(&pack_id)?;
        Ok(pack.map(|p| {
            visual_state_at(&p, chrono::Utc::now(), &repo.config().visual)
                .as_str()
                .to_string()
        }))
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Ledger entries for a pack, in insertion order.
    pub fn ledger_for_pack(&self, pack_id: String) -> Result<Vec<FfiLedgerEntry>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let entries = LedgerEngine::new(&repo).list_for_pack(&pack_id)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Ledger entries for a pack, newest first.
    pub fn ledger_history(&self, pack_id: String) -> Result<Vec<FfiLedgerEntry>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let entries = LedgerEngine::new(&repo).history_for_pack(&pack_id)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Whether a pack's ledger replays to its current balance.
    pub fn verify_pack_history(&self, pack_id: String) -> Result<bool, SessionPacksError> {
        let repo = self.repo.lock()?;
        let manager = PackManager::new(&repo);
        let pack = manager
            .get_pack(&pack_id)?
            .ok_or_else(|| SessionPacksError::NotFound(format!("Pack not found: {}", pack_id)))?;
        let entries = manager.ledger().list_for_pack(&pack_id)?;
        Ok(verify_pack_history(&pack, &entries).is_ok())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Schedule an appointment, linking it to a usable pack if there is one.
    pub fn create_appointment(
        &self,
        patient_id: String,
        patient_name: String,
        scheduled_date: String,
        service: String,
        professional: String,
    ) -> Result<FfiAppointment, SessionPacksError> {
        let repo = self.repo.lock()?;
        let appointment = AppointmentBook::new(&repo).create_appointment(
            &patient_id,
            &patient_name,
            &scheduled_date,
            &service,
            &professional,
        )?;
        Ok(appointment.into())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: String) -> Result<Option<FfiAppointment>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let appointment = AppointmentBook::new(&repo).get_appointment(&appointment_id)?;
        Ok(appointment.map(|a| a.into()))
    }

    /// List all appointments.
    pub fn list_appointments(&self) -> Result<Vec<FfiAppointment>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let appointments = AppointmentBook::new(&repo).list_appointments()?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    /// Appointments drawing on a pack.
    pub fn appointments_for_pack(&self, pack_id: String) -> Result<Vec<FfiAppointment>, SessionPacksError> {
        let repo = self.repo.lock()?;
        let appointments = AppointmentBook::new(&repo).appointments_for_pack(&pack_id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    /// Mark an appointment attended and charge its pack.
    pub fn mark_attended(&self, appointment_id: String) -> Result<FfiAppointmentOutcome, SessionPacksError> {
        let repo = self.repo.lock()?;
        let outcome = AppointmentBook::new(&repo).mark_attended(&appointment_id)?;
        Ok(FfiAppointmentOutcome::from_outcome(outcome, repo.config()))
    }

    /// Mark an appointment as a no-show and charge its pack.
    pub fn mark_no_show(&self, appointment_id: String) -> Result<FfiAppointmentOutcome, SessionPacksError> {
        let repo = self.repo.lock()?;
        let outcome = AppointmentBook::new(&repo).mark_no_show(&appointment_id)?;
        Ok(FfiAppointmentOutcome::from_outcome(outcome, repo.config()))
    }

    /// Cancel an appointment without charging.
    pub fn cancel_appointment(&self, appointment_id: String) -> Result<FfiAppointment, SessionPacksError> {
        let repo = self.repo.lock()?;
        let appointment = AppointmentBook::new(&repo).cancel_appointment(&appointment_id)?;
        Ok(appointment.into())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export a pack's audit trail as JSON.
    pub fn export_audit_json(&self, pack_id: String) -> Result<String, SessionPacksError> {
        let repo = self.repo.lock()?;
        let export = AuditExporter::new(&repo).export_pack(&pack_id)?;
        Ok(export.to_json()?)
    }

    /// Export a pack's audit trail as CSV.
    pub fn export_audit_csv(&self, pack_id: String) -> Result<String, SessionPacksError> {
        let repo = self.repo.lock()?;
        let export = AuditExporter::new(&repo).export_pack(&pack_id)?;
        Ok(export.to_csv())
    }

    /// Export every pack's audit trail as JSON.
    pub fn export_all_audit_json(&self) -> Result<String, SessionPacksError> {
        let repo = self.repo.lock()?;
        let batch = AuditExporter::new(&repo).export_all()?;
        Ok(batch.to_json()?)
    }

    /// Export every pack's audit trail as CSV.
    pub fn export_all_audit_csv(&self) -> Result<String, SessionPacksError> {
        let repo = self.repo.lock()?;
        let batch = AuditExporter::new(&repo).export_all()?;
        Ok(batch.to_csv())
    }

    // =========================================================================
    // Demo Data
    // =========================================================================

    /// Seed demo templates and packs into an empty store.
    pub fn seed_demo_data(&self) -> Result<bool, SessionPacksError> {
        let repo = self.repo.lock()?;
        Ok(seed_demo_data(&repo)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe template input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTemplateInput {
    pub name: String,
    pub total_sessions: u32,
    pub total_price: f64,
    pub session_reference_price: f64,
    pub validity_period: u32,
    pub allowed_services: Vec<String>,
    pub allowed_professionals: Vec<String>,
    pub no_show_policy: String,
    pub refund_policy: String,
    pub transferable: bool,
}

impl FfiTemplateInput {
    fn into_fields(self) -> Result<NewPackTemplate, SessionPacksError> {
        Ok(NewPackTemplate {
            no_show_policy: parse_field("no-show policy", &self.no_show_policy)?,
            refund_policy: parse_field("refund policy", &self.refund_policy)?,
            name: self.name,
            total_sessions: self.total_sessions,
            total_price: self.total_price,
            session_reference_price: self.session_reference_price,
            validity_period: self.validity_period,
            allowed_services: self.allowed_services,
            allowed_professionals: self.allowed_professionals,
            transferable: self.transferable,
        })
    }

    fn into_patch(self) -> Result<TemplatePatch, SessionPacksError> {
        let fields = self.into_fields()?;
        Ok(TemplatePatch {
            name: Some(fields.name),
            total_sessions: Some(fields.total_sessions),
            total_price: Some(fields.total_price),
            session_reference_price: Some(fields.session_reference_price),
            validity_period: Some(fields.validity_period),
            allowed_services: Some(fields.allowed_services),
            allowed_professionals: Some(fields.allowed_professionals),
            no_show_policy: Some(fields.no_show_policy),
            refund_policy: Some(fields.refund_policy),
            transferable: Some(fields.transferable),
        })
    }
}

/// FFI-safe pack template.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPackTemplate {
    pub id: String,
    pub name: String,
    pub total_sessions: u32,
    pub total_price: f64,
    pub session_reference_price: f64,
    pub validity_period: u32,
    pub allowed_services: Vec<String>,
    pub allowed_professionals: Vec<String>,
    pub no_show_policy: String,
    pub refund_policy: String,
    pub transferable: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PackTemplate> for FfiPackTemplate {
    fn from(template: PackTemplate) -> Self {
        Self {
            id: template.id,
            name: template.name,
            total_sessions: template.total_sessions,
            total_price: template.total_price,
            session_reference_price: template.session_reference_price,
            validity_period: template.validity_period,
            allowed_services: template.allowed_services,
            allowed_professionals: template.allowed_professionals,
            no_show_policy: template.no_show_policy.as_str().to_string(),
            refund_policy: template.refund_policy.as_str().to_string(),
            transferable: template.transferable,
            created_at: models::format_timestamp(&template.created_at),
            updated_at: models::format_timestamp(&template.updated_at),
        }
    }
}

/// FFI-safe patient pack, with its derived display state.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientPack {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub pack_template_id: String,
    pub pack_template_name: String,
    pub purchase_date: String,
    pub expiry_date: String,
    pub total_sessions: u32,
    pub used_sessions: u32,
    pub remaining_sessions: u32,
    pub status: String,
    pub financial_status: String,
    pub internal_notes: String,
    pub created_at: String,
    pub updated_at: String,
    pub visual_state: String,
    pub days_until_expiry: i64,
}

impl FfiPatientPack {
    fn from_pack(pack: PatientPack, config: &CoreConfig) -> Self {
        let now = chrono::Utc::now();
        Self {
            visual_state: visual_state_at(&pack, now, &config.visual).as_str().to_string(),
            days_until_expiry: visual::days_until_expiry(&pack, now),
            purchase_date: models::format_timestamp(&pack.purchase_date),
            expiry_date: models::format_timestamp(&pack.expiry_date),
            created_at: models::format_timestamp(&pack.created_at),
            updated_at: models::format_timestamp(&pack.updated_at),
            status: pack.status.to_string(),
            financial_status: pack.financial_status.as_str().to_string(),
            id: pack.id,
            patient_id: pack.patient_id,
            patient_name: pack.patient_name,
            pack_template_id: pack.pack_template_id,
            pack_template_name: pack.pack_template_name,
            total_sessions: pack.total_sessions,
            used_sessions: pack.used_sessions,
            remaining_sessions: pack.remaining_sessions,
            internal_notes: pack.internal_notes,
        }
    }

    fn from_packs(packs: Vec<PatientPack>, config: &CoreConfig) -> Vec<Self> {
        packs.into_iter().map(|p| Self::from_pack(p, config)).collect()
    }
}

/// FFI-safe ledger entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLedgerEntry {
    pub id: String,
    pub timestamp: String,
    pub patient_pack_id: String,
    pub appointment_id: Option<String>,
    pub action_type: String,
    pub sessions_delta: i64,
    pub triggered_by: String,
    pub reason: String,
    pub previous_balance: i64,
    pub new_balance: i64,
}

impl From<LedgerEntry> for FfiLedgerEntry {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            timestamp: models::format_timestamp(&entry.timestamp),
            patient_pack_id: entry.patient_pack_id,
            appointment_id: entry.appointment_id,
            action_type: entry.action_type.as_str().to_string(),
            sessions_delta: entry.sessions_delta,
            triggered_by: entry.triggered_by.as_str().to_string(),
            reason: entry.reason,
            previous_balance: entry.previous_balance,
            new_balance: entry.new_balance,
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_pack_id: Option<String>,
    pub scheduled_date: String,
    pub service: String,
    pub professional: String,
    pub status: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            patient_name: appointment.patient_name,
            patient_pack_id: appointment.patient_pack_id,
            scheduled_date: appointment.scheduled_date,
            service: appointment.service,
            professional: appointment.professional,
            status: appointment.status.as_str().to_string(),
        }
    }
}

/// FFI-safe result of settling an appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentOutcome {
    pub appointment: FfiAppointment,
    /// `charged`, `unlinked`, `skipped` or `pack-missing`
    pub deduction: String,
    /// The charged pack, when a session was deducted
    pub pack: Option<FfiPatientPack>,
    /// Why the linked pack was not charged
    pub skip_reason: Option<String>,
}

impl FfiAppointmentOutcome {
    fn from_outcome(outcome: AppointmentOutcome, config: &CoreConfig) -> Self {
        let (deduction, pack, skip_reason) = match outcome.deduction {
            Deduction::Unlinked => ("unlinked", None, None),
            Deduction::Charged(pack) => ("charged", Some(FfiPatientPack::from_pack(pack, config)), None),
            Deduction::Skipped(rejection) => ("skipped", None, Some(rejection.to_string())),
            Deduction::PackMissing(pack_id) => {
                ("pack-missing", None, Some(format!("Pack not found: {}", pack_id)))
            }
        };
        Self {
            appointment: outcome.appointment.into(),
            deduction: deduction.to_string(),
            pack,
            skip_reason,
        }
    }
}

/// FFI-safe pack overview.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPackOverview {
    pub total: u32,
    pub active: u32,
    pub completed: u32,
    pub frozen: u32,
    pub expired: u32,
    pub low_sessions: u32,
}

impl From<PackOverview> for FfiPackOverview {
    fn from(overview: PackOverview) -> Self {
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        Self {
            total: count(overview.total),
            active: count(overview.active),
            completed: count(overview.completed),
            frozen: count(overview.frozen),
            expired: count(overview.expired),
            low_sessions: count(overview.low_sessions),
        }
    }
}
