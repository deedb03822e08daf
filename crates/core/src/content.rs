//! City content types and the external source traits.
//!
//! A `CityContent` aggregate lives for one request: fetched from the
//! content source, its summary mutated in place by temperature
//! normalization, then chunked text flows into the RAG stage. POI data is
//! an optional structured supplement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// A bounded-size segment of a city's descriptive text, tagged with its
/// source city so it can be attributed after ranking reshuffles things.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// The city this chunk describes.
    pub city: String,
    /// Sequential index within the city's text.
    pub index: usize,
    /// The text content.
    pub content: String,
}

/// Per-city aggregate of fetched descriptive content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityContent {
    /// Lead-section summary, used for embedding and keyword matching.
    pub summary: String,
    /// Full article text.
    pub full_text: String,
    /// Ordered, bounded-size chunks of the full text.
    pub chunks: Vec<Chunk>,
    /// Structured points of interest, when the POI source had data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pois: Option<CityPois>,
}

/// A single point of interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Categorized POI lists for one city.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityPois {
    #[serde(default)]
    pub tourist_attractions: Vec<PoiRecord>,
    #[serde(default)]
    pub beaches: Vec<PoiRecord>,
    #[serde(default)]
    pub entertainment: Vec<PoiRecord>,
    #[serde(default)]
    pub sports_facilities: Vec<PoiRecord>,
}

impl CityPois {
    pub fn is_empty(&self) -> bool {
        self.tourist_attractions.is_empty()
            && self.beaches.is_empty()
            && self.entertainment.is_empty()
            && self.sports_facilities.is_empty()
    }
}

/// A typed RAG document: compressed per-city content handed to the
/// grounded-completion calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "doc_id")]
    pub id: usize,
    pub title: String,
    pub content: String,
}

/// A ranked recommendation: city name plus the (possibly boosted)
/// similarity score. Higher is better; the score is unitless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCity {
    pub name: String,
    pub score: f32,
}

/// The descriptive-content collaborator (Wikipedia in production).
///
/// Per-city failures must not abort sibling fetches: a missing page is
/// `Ok(None)`, a transport problem is `Err` and the caller decides.
#[async_trait]
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch summary, full text and chunks for one city.
    /// Returns `Ok(None)` when the city has no page.
    async fn fetch(&self, city: &str) -> std::result::Result<Option<CityContent>, SourceError>;
}

/// The points-of-interest collaborator (OpenStreetMap in production).
#[async_trait]
pub trait PoiSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch categorized POIs for one city. `Ok(None)` when nothing is known.
    async fn fetch(&self, city: &str) -> std::result::Result<Option<CityPois>, SourceError>;
}
