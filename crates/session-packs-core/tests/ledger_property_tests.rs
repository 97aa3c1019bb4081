//! Property tests for ledger replay.

use proptest::prelude::*;
use session_packs_core::db::{MemoryStore, Repository};
use session_packs_core::ledger::{replay_balance, verify_pack_history};
use session_packs_core::models::{ActionType, FinancialStatus, NewPackTemplate, TriggeredBy};
use session_packs_core::packs::{PackManager, TemplateCatalog};

#[derive(Debug, Clone)]
enum Op {
    Deduct,
    NoShow,
    Add(i64),
    Freeze,
    Unfreeze,
    Waive,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Deduct),
        2 => Just(Op::NoShow),
        2 => (-1i64..4).prop_map(Op::Add),
        1 => Just(Op::Freeze),
        1 => Just(Op::Unfreeze),
        1 => Just(Op::Waive),
    ]
}

proptest! {
    /// Replaying a pack's ledger always reproduces its balance, whichever
    /// operations succeeded or were rejected along the way.
    #[test]
    fn ledger_replays_to_pack_balance(
        sessions in 1u32..8,
        ops in proptest::collection::vec(op(), 0..30)
    ) {
        let repo = Repository::new(MemoryStore::new());
        let template = TemplateCatalog::new(&repo)
            .create_template(NewPackTemplate::new("Pack", sessions, 30))
            .unwrap();
        let manager = PackManager::new(&repo);
        let pack = manager
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();

        for op in ops {
            // Rejections are expected here; only the ledger/balance agreement matters
            let _ = match op {
                Op::Deduct => manager.deduct_session(&pack.id, "Session", ActionType::Used, TriggeredBy::System, None),
                Op::NoShow => manager.deduct_session(&pack.id, "No-show", ActionType::NoShowCharged, TriggeredBy::System, Some("appt")),
                Op::Add(n) => manager.add_sessions(&pack.id, n, "Top-up", TriggeredBy::Admin),
                Op::Freeze => manager.freeze_pack(&pack.id, "Pause", TriggeredBy::Admin),
                Op::Unfreeze => manager.unfreeze_pack(&pack.id, "Resume", TriggeredBy::Admin),
                Op::Waive => manager.waive_no_show(&pack.id, "appt", "Waived", TriggeredBy::Reception),
            };

            let current = manager.get_pack(&pack.id).unwrap().unwrap();
            prop_assert!(current.balance_is_consistent());

            let entries = manager.ledger().list_for_pack(&pack.id).unwrap();
            prop_assert_eq!(verify_pack_history(&current, &entries), Ok(()));
            prop_assert!(entries.iter().all(|e| e.new_balance >= 0));
        }
    }

    /// Deducting from an exhausted pack changes nothing.
    #[test]
    fn deduct_on_empty_pack_is_noop(sessions in 1u32..6, extra in 1usize..5) {
        let repo = Repository::new(MemoryStore::new());
        let template = TemplateCatalog::new(&repo)
            .create_template(NewPackTemplate::new("Pack", sessions, 30))
            .unwrap();
        let manager = PackManager::new(&repo);
        let pack = manager
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        for _ in 0..sessions {
            manager
                .deduct_session(&pack.id, "Session", ActionType::Used, TriggeredBy::System, None)
                .unwrap();
        }
        let exhausted = manager.get_pack(&pack.id).unwrap().unwrap();
        let entries = manager.ledger().list_all().unwrap();

        for _ in 0..extra {
            prop_assert!(manager
                .deduct_session(&pack.id, "Session", ActionType::Used, TriggeredBy::System, None)
                .is_err());
        }

        prop_assert_eq!(manager.get_pack(&pack.id).unwrap().unwrap(), exhausted);
        prop_assert_eq!(manager.ledger().list_all().unwrap(), entries);
    }

    /// Replay agrees with simple summation for any well-chained ledger.
    #[test]
    fn replay_equals_sum_of_deltas(sessions in 1u32..10, deductions in 0u32..10) {
        let repo = Repository::new(MemoryStore::new());
        let template = TemplateCatalog::new(&repo)
            .create_template(NewPackTemplate::new("Pack", sessions, 30))
            .unwrap();
        let manager = PackManager::new(&repo);
        let pack = manager
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();
        for _ in 0..deductions.min(sessions) {
            manager
                .deduct_session(&pack.id, "Session", ActionType::Used, TriggeredBy::System, None)
                .unwrap();
        }

        let entries = manager.ledger().list_for_pack(&pack.id).unwrap();
        let sum: i64 = entries.iter().map(|e| e.sessions_delta).sum();
        prop_assert_eq!(replay_balance(&entries), Ok(sum));
        prop_assert_eq!(sum, i64::from(sessions - deductions.min(sessions)));
    }
}
