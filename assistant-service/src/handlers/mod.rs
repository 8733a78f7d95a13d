//! HTTP handlers for the assistant service.

pub mod analyze;
pub mod ask;
pub mod health;
pub mod metrics;
