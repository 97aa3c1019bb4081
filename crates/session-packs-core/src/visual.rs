//! Display classification of a pack.
//!
//! Derived on every read and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::VisualThresholds;
use crate::models::{PackStatus, PatientPack};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Coarse display state of a pack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VisualState {
    Healthy,
    Low,
    Blocked,
}

impl VisualState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualState::Healthy => "healthy",
            VisualState::Low => "low",
            VisualState::Blocked => "blocked",
        }
    }
}

/// Visual state as of now, with the default thresholds.
pub fn get_visual_state(pack: &PatientPack) -> VisualState {
    visual_state_at(pack, Utc::now(), &VisualThresholds::default())
}

/// Visual state at a given instant.
pub fn visual_state_at(
    pack: &PatientPack,
    now: DateTime<Utc>,
    thresholds: &VisualThresholds,
) -> VisualState {
    match pack.status {
        PackStatus::Frozen | PackStatus::Expired | PackStatus::Completed => VisualState::Blocked,
        PackStatus::Active => {
            if pack.remaining_sessions <= thresholds.low_balance
                || days_until_expiry(pack, now) <= thresholds.expiry_warning_days
            {
                VisualState::Low
            } else {
                VisualState::Healthy
            }
        }
    }
}

/// Whole days until expiry, rounded up. Zero or negative once expired.
pub fn days_until_expiry(pack: &PatientPack, now: DateTime<Utc>) -> i64 {
    let millis = (pack.expiry_date - now).num_milliseconds();
    // ceiling division
    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FinancialStatus, NewPackTemplate, PackTemplate};
    use chrono::Duration;

    fn pack(remaining: u32, expires_in: Duration, now: DateTime<Utc>) -> PatientPack {
        let template = PackTemplate::new(NewPackTemplate::new("Physiotherapy Pack", 10, 30));
        let mut pack = PatientPack::from_template(
            "patient-001".into(),
            "John Smith".into(),
            &template,
            FinancialStatus::Paid,
            String::new(),
        );
        pack.remaining_sessions = remaining;
        pack.used_sessions = 10 - remaining;
        pack.expiry_date = now + expires_in;
        pack
    }

    fn state(pack: &PatientPack, now: DateTime<Utc>) -> VisualState {
        visual_state_at(pack, now, &VisualThresholds::default())
    }

    #[test]
    fn test_healthy_pack() {
        let now = Utc::now();
        assert_eq!(state(&pack(5, Duration::days(30), now), now), VisualState::Healthy);
    }

    #[test]
    fn test_low_balance() {
        let now = Utc::now();
        assert_eq!(state(&pack(1, Duration::days(30), now), now), VisualState::Low);
        assert_eq!(state(&pack(0, Duration::days(30), now), now), VisualState::Low);
    }

    #[test]
    fn test_blocked_regardless_of_balance() {
        let now = Utc::now();
        for status in [PackStatus::Frozen, PackStatus::Expired, PackStatus::Completed] {
            let mut p = pack(5, Duration::days(30), now);
            p.status = status;
            assert_eq!(state(&p, now), VisualState::Blocked);
        }
    }

    #[test]
    fn test_expiry_warning_window() {
        let now = Utc::now();
        assert_eq!(state(&pack(5, Duration::days(7), now), now), VisualState::Low);
        // 7 days and one hour rounds up to 8
        assert_eq!(
            state(&pack(5, Duration::days(7) + Duration::hours(1), now), now),
            VisualState::Healthy
        );
        assert_eq!(state(&pack(5, Duration::days(-2), now), now), VisualState::Low);
    }

    #[test]
    fn test_days_until_expiry_rounds_up() {
        let now = Utc::now();
        assert_eq!(days_until_expiry(&pack(5, Duration::days(3), now), now), 3);
        assert_eq!(days_until_expiry(&pack(5, Duration::hours(1), now), now), 1);
        assert_eq!(days_until_expiry(&pack(5, Duration::zero(), now), now), 0);
        assert_eq!(days_until_expiry(&pack(5, Duration::hours(-25), now), now), -1);
    }

    #[test]
    fn test_custom_thresholds() {
        let now = Utc::now();
        let thresholds = VisualThresholds {
            low_balance: 3,
            expiry_warning_days: 0,
        };
        let p = pack(3, Duration::days(2), now);
        assert_eq!(visual_state_at(&p, now, &thresholds), VisualState::Low);
        let p = pack(4, Duration::days(2), now);
        assert_eq!(visual_state_at(&p, now, &thresholds), VisualState::Healthy);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&VisualState::Blocked).unwrap(), "\"blocked\"");
        assert_eq!(VisualState::Healthy.as_str(), "healthy");
    }
}
