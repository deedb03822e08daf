//! The ranking orchestrator.
//!
//! One `process_request` call runs the whole pipeline: preference
//! extraction, activity and season detection, location routing, content
//! fetch, filtering, similarity ranking and the grounded RAG answer.
//! The advisor is stateless between requests.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use kurort_config::CityRosters;
use kurort_core::{Chunk, CityContent, ContentSource, Error, LlmClient, RankedCity, Result};
use kurort_embedding::{EmbeddingService, RankOptions, rank_cities};
use kurort_llm::{
    ContextBudget, RagResponder, Summarizer, classify_activity, classify_season,
    extract_preferences, merge_activity,
};
use kurort_rules::{
    Activity, LocationKind, Season, detect_location, extract_temperature_range,
    normalize_temperature_text, rule_based_matches,
};

use crate::filters::{FilterTier, filter_by_activity, filter_by_season};

/// Rule-based confidence above which the LLM classifier is skipped.
const HIGH_CONFIDENCE: f32 = 0.6;
/// How many cities the final ranking keeps.
const TOP_CITIES: usize = 3;

/// The result of one advisory request.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Structured preference text extracted from the user input.
    pub preferences: String,
    /// Detected primary activity with its confidence, if any.
    pub activity: Option<(Activity, f32)>,
    pub season: Option<Season>,
    pub location: Option<LocationKind>,
    /// Top cities, best first.
    pub ranked: Vec<RankedCity>,
    /// Source text chunks per ranked city, in ranking order.
    pub chunks: Vec<(String, Vec<Chunk>)>,
    /// Token budget left for a RAG turn after the fixed prompts.
    pub remaining_tokens: i64,
    pub activity_filter: FilterTier,
    pub season_filter: FilterTier,
    /// Passages the grounded model considered relevant.
    pub relevant_passages: String,
    /// The final natural-language answer.
    pub answer: String,
}

pub struct Advisor {
    content: Arc<dyn ContentSource>,
    llm: Arc<dyn LlmClient>,
    embeddings: EmbeddingService,
    summarizer: Summarizer,
    rag: RagResponder,
    rosters: CityRosters,
}

impl Advisor {
    pub fn new(
        content: Arc<dyn ContentSource>,
        llm: Arc<dyn LlmClient>,
        embeddings: EmbeddingService,
        budget: ContextBudget,
        rosters: CityRosters,
    ) -> Self {
        let summarizer = Summarizer::new(llm.clone(), budget);
        let rag = RagResponder::new(llm.clone(), summarizer.clone());
        Self { content, llm, embeddings, summarizer, rag, rosters }
    }

    /// Run the full pipeline for one user request.
    pub async fn process_request(&self, user_input: &str) -> Result<Recommendation> {
        let preferences = extract_preferences(self.llm.as_ref(), user_input).await?;
        debug!(preferences = %preferences, "preferences extracted");

        let matches = self.detect_activity(user_input).await;
        let primary = matches.first().copied();
        let activity = primary.map(|(a, _)| a);

        let season_text = format!("{user_input}\n{preferences}");
        let season = classify_season(self.llm.as_ref(), &season_text).await;

        let location = detect_location(&preferences, activity);
        let candidates = match location {
            Some(kind) => self.rosters.roster(kind).to_vec(),
            None => self.rosters.all(),
        };
        info!(
            ?activity,
            ?season,
            ?location,
            candidates = candidates.len(),
            "request classified"
        );

        let contents = self.fetch_contents(&candidates).await;
        if contents.is_empty() {
            return Err(Error::Internal("no city content could be fetched".into()));
        }

        let summaries: Vec<(String, String)> = contents
            .iter()
            .map(|(city, content)| (city.clone(), normalize_temperature_text(&content.summary)))
            .collect();

        let (after_activity, activity_filter) = match activity {
            Some(activity) => filter_by_activity(&summaries, activity),
            None => (summaries, FilterTier::Unfiltered),
        };

        let ceiling = extract_temperature_range(&preferences).map(|(_, max)| max);
        let (after_season, season_filter) = match season {
            Some(season) => filter_by_season(&after_activity, season, ceiling, activity),
            None => (after_activity, FilterTier::Unfiltered),
        };
        debug!(
            ?activity_filter,
            ?season_filter,
            surviving = after_season.len(),
            "candidate filtering done"
        );

        let ranked = self.rank(&after_season, &preferences, season, activity).await?;
        info!(top = ?ranked.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), "cities ranked");

        let mut chunks: Vec<(String, Vec<Chunk>)> = Vec::new();
        let mut cities_chunks: Vec<(String, Vec<String>)> = Vec::new();
        for ranked_city in &ranked {
            if let Some((city, content)) = contents.iter().find(|(c, _)| *c == ranked_city.name) {
                let texts = content.chunks.iter().map(|ch| ch.content.clone()).collect();
                cities_chunks.push((city.clone(), texts));
                chunks.push((city.clone(), content.chunks.clone()));
            }
        }

        let documents = self.summarizer.prepare_rag_documents(&cities_chunks, &preferences).await?;
        let grounded = self.rag.respond(&preferences, documents).await?;
        let remaining_tokens = self.summarizer.budget().available_tokens(&preferences, true);

        Ok(Recommendation {
            preferences,
            activity: primary,
            season,
            location,
            ranked,
            chunks,
            remaining_tokens,
            activity_filter,
            season_filter,
            relevant_passages: grounded.relevant,
            answer: grounded.answer,
        })
    }

    /// Rule-based detection, with an LLM fallback merged in unless the
    /// rules already produced a high-confidence match.
    async fn detect_activity(&self, user_input: &str) -> Vec<(Activity, f32)> {
        let matches = rule_based_matches(user_input);
        match matches.first() {
            Some((activity, confidence)) if *confidence > HIGH_CONFIDENCE => {
                debug!(%activity, confidence, "rule-based activity accepted");
                matches
            }
            _ => {
                let llm_activity = classify_activity(self.llm.as_ref(), user_input).await;
                merge_activity(matches, llm_activity)
            }
        }
    }

    /// Fetch content for every candidate concurrently; result order
    /// follows the candidate order. Failed or missing cities are dropped
    /// with a warning.
    async fn fetch_contents(&self, cities: &[String]) -> Vec<(String, CityContent)> {
        let results = join_all(cities.iter().map(|city| self.content.fetch(city))).await;

        cities
            .iter()
            .zip(results)
            .filter_map(|(city, result)| match result {
                Ok(Some(content)) => Some((city.clone(), content)),
                Ok(None) => {
                    warn!(city = %city, source = self.content.name(), "no content, skipping");
                    None
                }
                Err(e) => {
                    warn!(city = %city, error = %e, "content fetch failed, skipping");
                    None
                }
            })
            .collect()
    }

    /// One batched embedding call over the candidate summaries plus the
    /// preference text, then boosted similarity ranking.
    async fn rank(
        &self,
        candidates: &[(String, String)],
        preferences: &str,
        season: Option<Season>,
        activity: Option<Activity>,
    ) -> Result<Vec<RankedCity>> {
        let mut texts: Vec<String> = candidates.iter().map(|(_, text)| text.clone()).collect();
        texts.push(preferences.to_string());

        let mut vectors = self.embeddings.embed_all(&texts).await?;
        let query = vectors
            .pop()
            .ok_or_else(|| Error::Internal("embedding batch returned no vectors".into()))?;

        let pairs: Vec<(String, Vec<f32>)> = candidates
            .iter()
            .map(|(city, _)| city.clone())
            .zip(vectors)
            .collect();
        let text_map: HashMap<String, String> = candidates.iter().cloned().collect();

        let options =
            RankOptions { season, activity, top_n: TOP_CITIES, exclude: None };
        Ok(rank_cities(&query, &pairs, &text_map, &options))
    }
}
