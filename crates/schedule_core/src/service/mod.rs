//! Core use-case services.
//!
//! # Responsibility
//! - Compose record stores into the flows the app shell calls.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod schedule_service;
