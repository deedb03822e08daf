//! Cosine similarity and boosted city ranking.

use std::collections::HashMap;

use tracing::debug;

use kurort_core::RankedCity;
use kurort_rules::{Activity, Season, activity_score, extract_temperature_range};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]. Returns 0.0 for empty, mismatched or
/// zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Ranking knobs for [`rank_cities`].
#[derive(Debug, Default, Clone)]
pub struct RankOptions<'a> {
    pub season: Option<Season>,
    pub activity: Option<Activity>,
    pub top_n: usize,
    /// Candidate name to exclude (the query's own key in some call paths).
    pub exclude: Option<&'a str>,
}

fn season_boost(season: Season, text: &str) -> f32 {
    let lower = text.to_lowercase();
    let mut boost = 0.0;
    for kw in season.keywords() {
        if lower.contains(kw) {
            boost += 0.05;
        }
    }
    if let Some((min, max)) = extract_temperature_range(text) {
        let (lo, hi) = season.temp_range();
        // One-time bonus when any extracted value falls in the range
        if (lo <= min && min <= hi) || (lo <= max && max <= hi) {
            boost += 0.10;
        }
    }
    boost
}

/// Rank candidate cities against a query vector.
///
/// Candidates are passed as an ordered slice so ties keep insertion
/// order under the stable sort. Season boosts are additive and applied
/// multiplicatively (`sim *= 1 + boost`); an activity score above zero
/// boosts by `1 + 0.5 * score`, a zero activity score halves the
/// similarity.
pub fn rank_cities(
    query: &[f32],
    candidates: &[(String, Vec<f32>)],
    texts: &HashMap<String, String>,
    options: &RankOptions<'_>,
) -> Vec<RankedCity> {
    let mut scored: Vec<RankedCity> = candidates
        .iter()
        .filter(|(name, _)| options.exclude != Some(name.as_str()))
        .map(|(name, vector)| {
            let mut sim = cosine_similarity(query, vector);
            let text = texts.get(name).map(String::as_str).unwrap_or("");

            if let Some(season) = options.season {
                let boost = season_boost(season, text);
                if boost > 0.0 {
                    sim *= 1.0 + boost;
                }
            }

            if let Some(activity) = options.activity {
                let score = activity_score(text, activity);
                if score > 0.0 {
                    sim *= 1.0 + 0.5 * score;
                } else {
                    sim *= 0.5;
                }
            }

            debug!(city = %name, score = sim, "candidate scored");
            RankedCity { name: name.clone(), score: sim }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(options.top_n);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn ranks_by_similarity_descending() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            ("далеко".to_string(), vec![0.0, 1.0]),
            ("близко".to_string(), vec![1.0, 0.0]),
        ];
        let ranked = rank_cities(
            &query,
            &candidates,
            &texts(&[("далеко", ""), ("близко", "")]),
            &RankOptions { top_n: 3, ..Default::default() },
        );
        assert_eq!(ranked[0].name, "близко");
        assert_eq!(ranked[1].name, "далеко");
    }

    #[test]
    fn respects_top_n() {
        let query = vec![1.0, 0.0];
        let candidates: Vec<_> = (0..10)
            .map(|i| (format!("c{i}"), vec![1.0, i as f32 * 0.1]))
            .collect();
        let all_texts: HashMap<String, String> =
            candidates.iter().map(|(n, _)| (n.clone(), String::new())).collect();
        let ranked = rank_cities(
            &query,
            &candidates,
            &all_texts,
            &RankOptions { top_n: 3, ..Default::default() },
        );
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn excludes_query_key() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            ("__query__".to_string(), vec![1.0, 0.0]),
            ("Сочи".to_string(), vec![0.9, 0.1]),
        ];
        let ranked = rank_cities(
            &query,
            &candidates,
            &texts(&[("Сочи", "")]),
            &RankOptions { top_n: 5, exclude: Some("__query__"), ..Default::default() },
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Сочи");
    }

    #[test]
    fn season_keywords_boost_similarity() {
        let query = vec![1.0, 0.0];
        // Same vector, only the texts differ
        let candidates = vec![
            ("без".to_string(), vec![1.0, 0.1]),
            ("пляжный".to_string(), vec![1.0, 0.1]),
        ];
        let ranked = rank_cities(
            &query,
            &candidates,
            &texts(&[("без", "тихий городок"), ("пляжный", "пляж и море, тёплое лето")]),
            &RankOptions { season: Some(Season::Summer), top_n: 2, ..Default::default() },
        );
        assert_eq!(ranked[0].name, "пляжный");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn temperature_in_range_adds_single_bonus() {
        let query = vec![1.0];
        let candidates = vec![("город".to_string(), vec![1.0])];
        // Two in-range temperatures must not double the +0.10 bonus:
        // keywords "лето" (+0.05) and the range bonus (+0.10) only
        let ranked = rank_cities(
            &query,
            &candidates,
            &texts(&[("город", "летом от 25 до 30°C")]),
            &RankOptions { season: Some(Season::Summer), top_n: 1, ..Default::default() },
        );
        let expected = 1.0 * (1.0 + 0.05 + 0.10);
        assert!((ranked[0].score - expected).abs() < 1e-5, "got {}", ranked[0].score);
    }

    #[test]
    fn zero_activity_score_halves_similarity() {
        let query = vec![1.0];
        let candidates = vec![("город".to_string(), vec![1.0])];
        let ranked = rank_cities(
            &query,
            &candidates,
            &texts(&[("город", "обычный промышленный город в степи")]),
            &RankOptions { activity: Some(Activity::BeachVacation), top_n: 1, ..Default::default() },
        );
        assert!((ranked[0].score - 0.5).abs() < 1e-5);
    }

    #[test]
    fn positive_activity_score_boosts() {
        let query = vec![1.0];
        let candidates = vec![("курорт".to_string(), vec![1.0])];
        let ranked = rank_cities(
            &query,
            &candidates,
            &texts(&[("курорт", "морской курорт, пляж и набережная, купальный сезон")]),
            &RankOptions { activity: Some(Activity::BeachVacation), top_n: 1, ..Default::default() },
        );
        assert!(ranked[0].score > 1.0);
    }

    #[test]
    fn ties_keep_candidate_order() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            ("первый".to_string(), vec![1.0, 0.0]),
            ("второй".to_string(), vec![1.0, 0.0]),
        ];
        let all_texts = texts(&[("первый", ""), ("второй", "")]);
        let ranked = rank_cities(
            &query,
            &candidates,
            &all_texts,
            &RankOptions { top_n: 2, ..Default::default() },
        );
        assert_eq!(ranked[0].name, "первый");
        assert_eq!(ranked[1].name, "второй");
    }
}
