//! Shared domain types for Promptgate.
//!
//! This crate contains the core domain types used across the Promptgate
//! gateway: conversation messages, model descriptors, usage records, quota
//! decisions, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod usage;
