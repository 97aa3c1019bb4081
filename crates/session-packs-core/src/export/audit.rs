//! Per-pack audit trail export with an integrity digest.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{hash_data, ExportError, ExportResult};
use crate::db::Repository;
use crate::ledger::{verify_pack_history, LedgerEngine};
use crate::models::{format_timestamp, timestamp, LedgerEntry, PatientPack};

const FORMAT_VERSION: &str = "1.0";
const HASH_ALGORITHM: &str = "SHA-256";
const CSV_HEADER: &str = "timestamp,pack_id,patient_id,appointment_id,action_type,sessions_delta,previous_balance,new_balance,triggered_by,reason\n";

/// Audit trail of a single pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailExport {
    /// Export metadata
    pub metadata: AuditMetadata,
    /// Ledger entries, newest first
    pub entries: Vec<LedgerEntry>,
}

/// Audit trail metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetadata {
    /// Export format version
    pub format_version: String,
    /// Export timestamp
    pub exported_at: String,
    /// Hash algorithm used for `digest`
    pub hash_algorithm: String,
    /// Exporting system identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    /// Pack ID
    pub pack_id: String,
    /// Patient ID
    pub patient_id: String,
    /// Patient display name
    pub patient_name: String,
    /// Template name at purchase time
    pub pack_template_name: String,
    /// Remaining sessions at export time
    pub remaining_sessions: u32,
    /// Number of exported entries
    pub entry_count: usize,
    /// Hex digest of the serialized `entries`, in export order (newest first)
    pub digest: String,
    /// Whether the ledger replays to the pack's balance
    pub history_verified: bool,
    /// First replay inconsistency, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_error: Option<String>,
}

impl AuditTrailExport {
    fn build(pack: &PatientPack, chronological: Vec<LedgerEntry>, system_id: Option<String>) -> ExportResult<Self> {
        let verification = verify_pack_history(pack, &chronological);

        let mut entries = chronological;
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(Self {
            metadata: AuditMetadata {
                format_version: FORMAT_VERSION.to_string(),
                exported_at: format_timestamp(&timestamp::now()),
                hash_algorithm: HASH_ALGORITHM.to_string(),
                system_id,
                pack_id: pack.id.clone(),
                patient_id: pack.patient_id.clone(),
                patient_name: pack.patient_name.clone(),
                pack_template_name: pack.pack_template_name.clone(),
                remaining_sessions: pack.remaining_sessions,
                entry_count: entries.len(),
                digest: digest_entries(&entries)?,
                history_verified: verification.is_ok(),
                verification_error: verification.err().map(|e| e.to_string()),
            },
            entries,
        })
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV, one row per ledger entry.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        self.write_rows(&mut csv);
        csv
    }

    /// Recompute the digest and compare it to the recorded one.
    pub fn verify_digest(&self) -> ExportResult<bool> {
        Ok(digest_entries(&self.entries)? == self.metadata.digest)
    }

    fn write_rows(&self, csv: &mut String) {
        for entry in &self.entries {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                format_timestamp(&entry.timestamp),
                escape_csv(&entry.patient_pack_id),
                escape_csv(&self.metadata.patient_id),
                escape_csv(entry.appointment_id.as_deref().unwrap_or("")),
                entry.action_type,
                entry.sessions_delta,
                entry.previous_balance,
                entry.new_balance,
                entry.triggered_by,
                escape_csv(&entry.reason),
            ));
        }
    }
}

/// Audit trails of every pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAuditExport {
    /// Export metadata
    pub metadata: BatchAuditMetadata,
    /// Per-pack exports, in pack storage order
    pub packs: Vec<AuditTrailExport>,
}

/// Batch audit export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAuditMetadata {
    /// Export format version
    pub format_version: String,
    /// Export timestamp
    pub exported_at: String,
    /// Hash algorithm used for per-pack digests
    pub hash_algorithm: String,
    /// Exporting system identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    /// Number of packs exported
    pub pack_count: usize,
    /// Total ledger entries across all packs
    pub entry_count: usize,
    /// Packs whose ledger does not replay to their balance
    pub unverified_packs: Vec<String>,
}

impl BatchAuditExport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV, one row per ledger entry across all packs.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        for export in &self.packs {
            export.write_rows(&mut csv);
        }
        csv
    }
}

/// Audit trail exporter.
pub struct AuditExporter<'a> {
    repo: &'a Repository,
    ledger: LedgerEngine<'a>,
    system_id: Option<String>,
}

impl<'a> AuditExporter<'a> {
    /// Create a new audit exporter.
    pub fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            ledger: LedgerEngine::new(repo),
            system_id: None,
        }
    }

    /// Set the system identifier for exports.
    pub fn with_system_id(mut self, system_id: String) -> Self {
        self.system_id = Some(system_id);
        self
    }

    /// Export the audit trail of one pack.
    pub fn export_pack(&self, pack_id: &str) -> ExportResult<AuditTrailExport> {
        let pack: PatientPack = self
            .repo
            .find(pack_id)?
            .ok_or_else(|| ExportError::PackNotFound(pack_id.to_string()))?;
        let entries = self.ledger.list_for_pack(pack_id)?;

        let export = AuditTrailExport::build(&pack, entries, self.system_id.clone())?;
        info!(
            pack_id,
            entries = export.metadata.entry_count,
            verified = export.metadata.history_verified,
            "Audit trail exported"
        );
        Ok(export)
    }

    /// Export the audit trail of every pack.
    pub fn export_all(&self) -> ExportResult<BatchAuditExport> {
        let packs: Vec<PatientPack> = self.repo.list()?;
        let ledger = self.ledger.list_all()?;

        let mut exports = Vec::with_capacity(packs.len());
        for pack in &packs {
            let entries = ledger
                .iter()
                .filter(|e| e.patient_pack_id == pack.id)
                .cloned()
                .collect();
            exports.push(AuditTrailExport::build(pack, entries, self.system_id.clone())?);
        }

        let batch = BatchAuditExport {
            metadata: BatchAuditMetadata {
                format_version: FORMAT_VERSION.to_string(),
                exported_at: format_timestamp(&timestamp::now()),
                hash_algorithm: HASH_ALGORITHM.to_string(),
                system_id: self.system_id.clone(),
                pack_count: exports.len(),
                entry_count: exports.iter().map(|e| e.metadata.entry_count).sum(),
                unverified_packs: exports
                    .iter()
                    .filter(|e| !e.metadata.history_verified)
                    .map(|e| e.metadata.pack_id.clone())
                    .collect(),
            },
            packs: exports,
        };

        info!(
            packs = batch.metadata.pack_count,
            entries = batch.metadata.entry_count,
            "Full audit trail exported"
        );
        Ok(batch)
    }
}

fn digest_entries(entries: &[LedgerEntry]) -> ExportResult<String> {
    Ok(hash_data(&serde_json::to_vec(entries)?))
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
