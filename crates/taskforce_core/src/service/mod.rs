//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod auth_service;
pub mod dashboard;
pub mod roster_service;
pub mod seed;
pub mod settings_service;
pub mod snapshot;
pub mod task_service;
