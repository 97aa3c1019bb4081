//! Domain models for the session-pack ledger.

mod appointment;
mod ledger;
mod pack;
mod template;
pub mod timestamp;

pub use appointment::*;
pub use ledger::*;
pub use pack::*;
pub use template::*;
pub use timestamp::{format_timestamp, parse_timestamp};

use serde::de::DeserializeOwned;

/// Parse a wire-format enum name such as `"no-show-charged"` or `"reception"`.
pub fn parse_wire<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string())).ok()
}
