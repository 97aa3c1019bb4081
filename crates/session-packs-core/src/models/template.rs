//! Pack template models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// What happens to a session when the patient does not show up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NoShowPolicy {
    /// Charge one session (default)
    #[default]
    Deduct,
    /// Keep the session
    Waive,
}

impl NoShowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoShowPolicy::Deduct => "deduct",
            NoShowPolicy::Waive => "waive",
        }
    }
}

/// Refund terms attached to a template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RefundPolicy {
    #[default]
    None,
    Partial,
    Manual,
}

impl RefundPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundPolicy::None => "none",
            RefundPolicy::Partial => "partial",
            RefundPolicy::Manual => "manual",
        }
    }
}

/// A reusable offering from which patient packs are sold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackTemplate {
    /// Unique template ID
    pub id: String,
    /// Display name, copied onto every pack sold from this template
    pub name: String,
    /// Sessions included in one pack
    pub total_sessions: u32,
    /// Price of the whole pack
    pub total_price: f64,
    /// Per-session list price, for comparison
    pub session_reference_price: f64,
    /// Days a pack stays valid after purchase
    pub validity_period: u32,
    /// Services the sessions may be spent on
    pub allowed_services: Vec<String>,
    /// Professionals the sessions may be booked with
    pub allowed_professionals: Vec<String>,
    /// No-show handling
    pub no_show_policy: NoShowPolicy,
    /// Refund terms
    pub refund_policy: RefundPolicy,
    /// Whether a pack may move to another patient
    pub transferable: bool,
    /// Creation timestamp
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Template fields supplied by the caller; id and timestamps are assigned on save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPackTemplate {
    pub name: String,
    pub total_sessions: u32,
    pub total_price: f64,
    pub session_reference_price: f64,
    pub validity_period: u32,
    pub allowed_services: Vec<String>,
    pub allowed_professionals: Vec<String>,
    pub no_show_policy: NoShowPolicy,
    pub refund_policy: RefundPolicy,
    pub transferable: bool,
}

impl NewPackTemplate {
    /// Minimal template with the given size and validity; prices start at zero.
    pub fn new(name: impl Into<String>, total_sessions: u32, validity_period: u32) -> Self {
        Self {
            name: name.into(),
            total_sessions,
            total_price: 0.0,
            session_reference_price: 0.0,
            validity_period,
            allowed_services: Vec::new(),
            allowed_professionals: Vec::new(),
            no_show_policy: NoShowPolicy::default(),
            refund_policy: RefundPolicy::default(),
            transferable: false,
        }
    }
}

/// Partial update of a template. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub total_sessions: Option<u32>,
    pub total_price: Option<f64>,
    pub session_reference_price: Option<f64>,
    pub validity_period: Option<u32>,
    pub allowed_services: Option<Vec<String>>,
    pub allowed_professionals: Option<Vec<String>>,
    pub no_show_policy: Option<NoShowPolicy>,
    pub refund_policy: Option<RefundPolicy>,
    pub transferable: Option<bool>,
}

impl TemplatePatch {
    /// Merge the patch into a template in place.
    pub fn apply(&self, template: &mut PackTemplate) {
        if let Some(name) = &self.name {
            template.name = name.clone();
        }
        if let Some(total_sessions) = self.total_sessions {
            template.total_sessions = total_sessions;
        }
        if let Some(total_price) = self.total_price {
            template.total_price = total_price;
        }
        if let Some(price) = self.session_reference_price {
            template.session_reference_price = price;
        }
        if let Some(validity_period) = self.validity_period {
            template.validity_period = validity_period;
        }
        if let Some(services) = &self.allowed_services {
            template.allowed_services = services.clone();
        }
        if let Some(professionals) = &self.allowed_professionals {
            template.allowed_professionals = professionals.clone();
        }
        if let Some(policy) = self.no_show_policy {
            template.no_show_policy = policy;
        }
        if let Some(policy) = self.refund_policy {
            template.refund_policy = policy;
        }
        if let Some(transferable) = self.transferable {
            template.transferable = transferable;
        }
    }
}

impl PackTemplate {
    /// Build a stored template from caller-supplied fields.
    pub fn new(fields: NewPackTemplate) -> Self {
        let now = timestamp::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: fields.name,
            total_sessions: fields.total_sessions,
            total_price: fields.total_price,
            session_reference_price: fields.session_reference_price,
            validity_period: fields.validity_period,
            allowed_services: fields.allowed_services,
            allowed_professionals: fields.allowed_professionals,
            no_show_policy: fields.no_show_policy,
            refund_policy: fields.refund_policy,
            transferable: fields.transferable,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the invariants a sellable template must hold.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("template name must not be empty".into());
        }
        if self.total_sessions == 0 {
            return Err("totalSessions must be greater than zero".into());
        }
        if self.validity_period == 0 {
            return Err("validityPeriod must be greater than zero".into());
        }
        // Non-finite floats serialize as null and would not read back
        if !self.total_price.is_finite() || !self.session_reference_price.is_finite() {
            return Err("prices must be finite numbers".into());
        }
        if self.total_price < 0.0 || self.session_reference_price < 0.0 {
            return Err("prices must not be negative".into());
        }
        Ok(())
    }
}
