//! Preference extraction and constrained classification.
//!
//! Extraction turns raw user text into the labeled preference record;
//! classification is constrained to the fixed activity/season
//! enumerations and degrades to "nothing detected" when the model
//! misbehaves, never aborting the pipeline.

use tracing::{debug, warn};

use kurort_core::{ChatMessage, LlmClient, LlmError};
use kurort_rules::{Activity, Season, season_from_text};

use crate::budget::MAX_SUMMARY_TOKENS;
use crate::prompts::{ACTIVITY_PROMPT, SEASON_PROMPT, SYSTEM_PROMPT};

/// Confidence assigned when the LLM classifier supplies an activity the
/// rules did not find.
const LLM_CONFIDENCE: f32 = 0.8;
/// Confidence boost when the LLM confirms a rule-based match.
const LLM_CONFIRMATION_BOOST: f32 = 0.2;

/// Extract the structured preference record from raw user text.
pub async fn extract_preferences(
    client: &dyn LlmClient,
    user_input: &str,
) -> Result<String, LlmError> {
    let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_input)];
    client.complete(&messages, 0.0, MAX_SUMMARY_TOKENS).await
}

/// Classify the activity via the LLM, constrained to the fixed
/// enumeration. Any failure or off-list answer is `None`.
pub async fn classify_activity(client: &dyn LlmClient, text: &str) -> Option<Activity> {
    let messages = [ChatMessage::system(ACTIVITY_PROMPT), ChatMessage::user(text)];
    match client.complete(&messages, 0.0, 16).await {
        Ok(answer) => {
            let parsed = answer.trim().to_lowercase().parse::<Activity>().ok();
            debug!(answer = %answer.trim(), ?parsed, "LLM activity classification");
            parsed
        }
        Err(e) => {
            warn!(error = %e, "activity classification failed, no activity detected");
            None
        }
    }
}

/// Classify the season via the LLM with a rule-based fallback over the
/// same text.
pub async fn classify_season(client: &dyn LlmClient, text: &str) -> Option<Season> {
    let messages = [ChatMessage::system(SEASON_PROMPT), ChatMessage::user(text)];
    match client.complete(&messages, 0.0, 16).await {
        Ok(answer) => match answer.trim().to_lowercase().parse::<Season>() {
            Ok(season) => Some(season),
            Err(_) => season_from_text(text),
        },
        Err(e) => {
            warn!(error = %e, "season classification failed, using rule-based fallback");
            season_from_text(text)
        }
    }
}

/// Merge an LLM-classified activity into the rule-based matches.
///
/// A confirmed match keeps its position and gets a confidence boost
/// (capped at 1.0); a new activity is prepended at [`LLM_CONFIDENCE`].
/// The rule-based ordering is authoritative, confirmation never reorders.
pub fn merge_activity(
    mut matches: Vec<(Activity, f32)>,
    llm_activity: Option<Activity>,
) -> Vec<(Activity, f32)> {
    let Some(activity) = llm_activity else {
        return matches;
    };

    if let Some(entry) = matches.iter_mut().find(|(a, _)| *a == activity) {
        entry.1 = (entry.1 + LLM_CONFIRMATION_BOOST).min(1.0);
    } else {
        matches.insert(0, (activity, LLM_CONFIDENCE));
    }
    matches
}
