//! Domain model for roster and task records.
//!
//! # Responsibility
//! - Define the flat records shared by storage, services and the FFI surface.
//! - Keep wire labels (Hebrew enum values, camelCase fields) in one place.
//!
//! # Invariants
//! - Every record is identified by a stable string `RecordId`.
//! - Cross-record references are plain ids; integrity is enforced by
//!   services, not by the records themselves.

pub mod department;
pub mod exemption;
pub mod person;
pub mod task;
pub mod user;
pub mod validation;

/// Stable identifier for every stored record.
///
/// Seeded records use short numeric ids (`"1"`), new records get a UUID v4.
pub type RecordId = String;

/// Generates a fresh record id.
pub fn new_record_id() -> RecordId {
    uuid::Uuid::new_v4().to_string()
}
