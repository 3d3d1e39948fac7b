//! Applicant registry and eligibility engine for financial assistance schemes.
//!
//! The [`assistance`] module holds the domain: validation of inbound records, the
//! eligibility evaluator, the storage capability, and the HTTP router. The remaining
//! modules carry the runtime plumbing shared with the API binary.

pub mod assistance;
pub mod config;
pub mod error;
pub mod telemetry;
