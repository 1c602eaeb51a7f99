//! Business logic and trait definitions for the Promptgate pipeline.
//!
//! This crate defines the "ports" (usage repository, completion provider,
//! tokenizer) that the infrastructure layer implements, plus the pure
//! pipeline stages: context window fitting, quota authorization, and the
//! tap-while-forwarding usage relay. It depends only on
//! `promptgate-types` -- never on `promptgate-infra` or any database/IO
//! crate.

pub mod catalog;
pub mod fitter;
pub mod llm;
pub mod quota;
pub mod relay;
pub mod service;
pub mod tokenizer;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;
