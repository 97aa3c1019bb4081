//! Demo catalog and packs for a fresh install.

use tracing::info;

use crate::db::Repository;
use crate::models::{
    ActionType, FinancialStatus, NewPackTemplate, NoShowPolicy, RefundPolicy, TriggeredBy,
};
use crate::packs::{PackManager, PackResult, TemplateCatalog};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn demo_templates() -> Vec<NewPackTemplate> {
    vec![
        NewPackTemplate {
            name: "Physiotherapy Pack - 10 Sessions".into(),
            total_sessions: 10,
            total_price: 800.0,
            session_reference_price: 100.0,
            validity_period: 90,
            allowed_services: strings(&["Physiotherapy", "Manual Therapy"]),
            allowed_professionals: strings(&["Dr. Sarah Chen", "Dr. Michael Ross"]),
            no_show_policy: NoShowPolicy::Deduct,
            refund_policy: RefundPolicy::Partial,
            transferable: false,
        },
        NewPackTemplate {
            name: "Wellness Pack - 5 Sessions".into(),
            total_sessions: 5,
            total_price: 350.0,
            session_reference_price: 80.0,
            validity_period: 60,
            allowed_services: strings(&["Massage", "Acupuncture", "Wellness Consultation"]),
            allowed_professionals: strings(&["Dr. Emily Watson", "Dr. James Liu"]),
            no_show_policy: NoShowPolicy::Deduct,
            refund_policy: RefundPolicy::None,
            transferable: true,
        },
        NewPackTemplate {
            name: "Premium Care - 20 Sessions".into(),
            total_sessions: 20,
            total_price: 1400.0,
            session_reference_price: 90.0,
            validity_period: 180,
            allowed_services: strings(&["All Services"]),
            allowed_professionals: strings(&["Any Professional"]),
            no_show_policy: NoShowPolicy::Deduct,
            refund_policy: RefundPolicy::Manual,
            transferable: true,
        },
    ]
}

/// Seed three templates and three patient packs.
///
/// Does nothing and returns `false` if any template already exists.
pub fn seed_demo_data(repo: &Repository) -> PackResult<bool> {
    let catalog = TemplateCatalog::new(repo);
    if !catalog.list_templates()?.is_empty() {
        return Ok(false);
    }

    let mut templates = Vec::new();
    for fields in demo_templates() {
        templates.push(catalog.create_template(fields)?);
    }

    let packs = PackManager::new(repo);
    let buyers = [
        ("patient-001", "John Smith", FinancialStatus::Paid, "Regular patient, good compliance"),
        ("patient-002", "Maria Garcia", FinancialStatus::Paid, "New patient"),
        (
            "patient-003",
            "Robert Johnson",
            FinancialStatus::Complimentary,
            "VIP patient - corporate agreement",
        ),
    ];

    let mut sold = Vec::new();
    for (template, (patient_id, patient_name, financial, notes)) in templates.iter().zip(buyers) {
        sold.push(packs.create_pack_from_template(patient_id, patient_name, template, financial, notes)?);
    }

    if let Some(premium) = sold.last() {
        for (reason, action) in [
            ("Initial consultation", ActionType::Used),
            ("Follow-up session", ActionType::Used),
            ("No-show - 15/12/2024", ActionType::NoShowCharged),
        ] {
            packs.deduct_session(&premium.id, reason, action, TriggeredBy::System, None)?;
        }
    }

    info!(templates = templates.len(), packs = sold.len(), "Demo data seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::ledger::verify_pack_history;
    use crate::models::{PackStatus, PatientPack};

    #[test]
    fn test_seed_demo_data() {
        let repo = Repository::new(MemoryStore::new());
        assert!(seed_demo_data(&repo).unwrap());

        let packs = PackManager::new(&repo);
        let all: Vec<PatientPack> = packs.list_packs().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(TemplateCatalog::new(&repo).list_templates().unwrap().len(), 3);

        let premium = &all[2];
        assert_eq!(premium.patient_name, "Robert Johnson");
        assert_eq!(premium.financial_status, FinancialStatus::Complimentary);
        assert_eq!(premium.remaining_sessions, 17);
        assert_eq!(premium.used_sessions, 3);
        assert_eq!(premium.status, PackStatus::Active);

        for pack in &all {
            let entries = packs.ledger().list_for_pack(&pack.id).unwrap();
            assert_eq!(verify_pack_history(pack, &entries), Ok(()));
        }
        assert_eq!(packs.ledger().list_all().unwrap().len(), 6);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let repo = Repository::new(MemoryStore::new());
        assert!(seed_demo_data(&repo).unwrap());
        assert!(!seed_demo_data(&repo).unwrap());
        assert_eq!(PackManager::new(&repo).list_packs().unwrap().len(), 3);
    }
}
