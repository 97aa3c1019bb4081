//! Dashboard counts across packs.

use serde::{Deserialize, Serialize};

use crate::models::{PackStatus, PatientPack};

/// Pack counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackOverview {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub frozen: usize,
    pub expired: usize,
    /// Active packs at or below the low-balance threshold
    pub low_sessions: usize,
}

impl PackOverview {
    pub fn from_packs(packs: &[PatientPack], low_balance: u32) -> Self {
        let mut overview = PackOverview {
            total: packs.len(),
            ..Default::default()
        };

        for pack in packs {
            match pack.status {
                PackStatus::Active => {
                    overview.active += 1;
                    if pack.remaining_sessions <= low_balance {
                        overview.low_sessions += 1;
                    }
                }
                PackStatus::Completed => overview.completed += 1,
                PackStatus::Frozen => overview.frozen += 1,
                PackStatus::Expired => overview.expired += 1,
            }
        }

        overview
    }
}
