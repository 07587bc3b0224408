//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate record store calls into use-case level APIs.
//! - Translate storage signals into domain errors.

pub mod task_service;
