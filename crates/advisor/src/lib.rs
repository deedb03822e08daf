//! The Kurort ranking orchestrator.
//!
//! `Advisor::process_request` turns one free-form user request into a
//! ranked city recommendation with a grounded natural-language answer,
//! wiring the rules, embedding, LLM and source crates together.

pub mod advisor;
pub mod filters;

pub use advisor::{Advisor, Recommendation};
pub use filters::{FilterTier, filter_by_activity, filter_by_season};

#[cfg(test)]
pub(crate) mod test_helpers;
