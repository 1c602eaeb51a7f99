//! REST API layer: router, handlers, extractors, error mapping.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
