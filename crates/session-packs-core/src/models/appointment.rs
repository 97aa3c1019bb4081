//! Appointment models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Appointment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Attended,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Attended => "attended",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled visit, optionally drawing on a patient pack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Unique appointment ID
    pub id: String,
    /// Patient ID
    pub patient_id: String,
    /// Patient display name
    pub patient_name: String,
    /// Pack linked at creation time, if one qualified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_pack_id: Option<String>,
    /// Scheduled date as entered by the booking UI (opaque to the core)
    pub scheduled_date: String,
    /// Service booked
    pub service: String,
    /// Professional booked
    pub professional: String,
    /// Status
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Create a scheduled appointment.
    pub fn new(
        patient_id: String,
        patient_name: String,
        scheduled_date: String,
        service: String,
        professional: String,
        patient_pack_id: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            patient_name,
            patient_pack_id,
            scheduled_date,
            service,
            professional,
            status: AppointmentStatus::Scheduled,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.patient_pack_id.is_some()
    }
}
