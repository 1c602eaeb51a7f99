//! Usage ledger: append-only token accounting.
//!
//! The ledger exclusively owns [`promptgate_types::usage::UsageRecord`]
//! persistence; no other component writes usage data.

pub mod ledger;
pub mod repository;
