//! Domain records persisted by the schedule stores.
//!
//! # Invariants
//! - Records compare structurally; stores locate them by equality.
//! - Serialized shape stays stable across releases of the same format
//!   version.

pub mod schedule;
