//! Appointments and their link to patient packs.

mod linkage;

pub use linkage::*;
