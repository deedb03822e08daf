//! Rule-based matching for the Kurort ranking pipeline.
//!
//! Everything in this crate is deterministic and explainable — no ML.
//! Static activity and season tables are declared once and shared
//! read-only; matching is lower-cased substring scanning (Russian stems),
//! temperature extraction is priority-ordered regex work.

pub mod activities;
pub mod location;
pub mod seasons;
pub mod temperature;

pub use activities::{
    Activity, ActivityDefinition, KeywordGroup, SecondaryFilter, activity_score, definition,
    rule_based_matches,
};
pub use location::{LocationKind, detect_location};
pub use seasons::{Season, SeasonDefinition, season_from_text};
pub use temperature::{
    average_temperature, extract_temperature_range, normalize_temperature_text, normalize_value,
    temperature_within,
};
