//! Use-case services over record repositories.
//!
//! # Responsibility
//! - Orchestrate repository calls into caller-facing operations.
//! - Keep presentation layers decoupled from storage details.

pub mod sample_service;
