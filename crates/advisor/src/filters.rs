//! Candidate filtering with tiered fallback.
//!
//! Both filters narrow the candidate list but must never empty it: when
//! a tier eliminates everything, the next looser tier applies and the
//! chosen tier is recorded in the result. Candidates are `(city,
//! normalized summary)` pairs; input order is preserved.

use tracing::debug;

use kurort_rules::{
    Activity, Season, activity_score, average_temperature, definition, extract_temperature_range,
};

/// Which tier of a filter actually produced the surviving set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTier {
    /// The full filter applied and left at least one candidate.
    Strict,
    /// The strict tier emptied the set; a looser check was used.
    Relaxed,
    /// Every tier emptied the set; the pre-filter candidates stand.
    Unfiltered,
}

/// Score floor for the activity filter.
fn activity_floor(activity: Activity) -> f32 {
    if activity.is_beach() { 0.1 } else { 0.2 }
}

fn secondary_pass(city: &str, text: &str, activity: Activity) -> bool {
    let secondary = &definition(activity).secondary;
    if secondary.member_cities.contains(&city) {
        return true;
    }
    let lower = text.to_lowercase();
    secondary.keywords.iter().any(|kw| lower.contains(kw))
}

/// Retain candidates matching the detected activity.
///
/// Strict tier: rule-based score meets the floor AND the secondary
/// keyword/membership table passes. Relaxed tier drops the secondary
/// check. Unfiltered returns the input set.
pub fn filter_by_activity(
    candidates: &[(String, String)],
    activity: Activity,
) -> (Vec<(String, String)>, FilterTier) {
    let floor = activity_floor(activity);

    let strict: Vec<_> = candidates
        .iter()
        .filter(|(city, text)| {
            activity_score(text, activity) >= floor && secondary_pass(city, text, activity)
        })
        .cloned()
        .collect();
    if !strict.is_empty() {
        return (strict, FilterTier::Strict);
    }

    let relaxed: Vec<_> = candidates
        .iter()
        .filter(|(_, text)| activity_score(text, activity) >= floor)
        .cloned()
        .collect();
    if !relaxed.is_empty() {
        debug!(activity = %activity, "strict activity filter emptied the set, relaxing");
        return (relaxed, FilterTier::Relaxed);
    }

    debug!(activity = %activity, "activity filter emptied the set, keeping all candidates");
    (candidates.to_vec(), FilterTier::Unfiltered)
}

fn has_season_keyword(text: &str, season: Season) -> bool {
    let lower = text.to_lowercase();
    season.keywords().iter().any(|kw| lower.contains(kw))
}

/// Beach destinations need no temperature proof in summer.
fn auto_accepted(season: Season, activity: Option<Activity>) -> bool {
    season == Season::Summer && activity.is_some_and(|a| a.is_beach())
}

fn strict_season_pass(
    text: &str,
    season: Season,
    ceiling: Option<i32>,
    activity: Option<Activity>,
) -> bool {
    if auto_accepted(season, activity) {
        return true;
    }

    let (lo, hi) = season.temp_range();
    let in_range = average_temperature(text)
        .is_some_and(|avg| avg >= lo as f32 && avg <= hi as f32);
    let under_ceiling = match ceiling {
        Some(max_allowed) => extract_temperature_range(text)
            .is_none_or(|(_, max_seen)| max_seen <= max_allowed),
        None => true,
    };

    (in_range && under_ceiling) || has_season_keyword(text, season)
}

/// Retain candidates plausible for the detected season.
///
/// Strict tier: extracted average temperature inside the season's range
/// and no individual value above the user's ceiling, or a season keyword
/// in the text. Relaxed tier: keyword match only. Unfiltered returns the
/// input set.
pub fn filter_by_season(
    candidates: &[(String, String)],
    season: Season,
    ceiling: Option<i32>,
    activity: Option<Activity>,
) -> (Vec<(String, String)>, FilterTier) {
    let strict: Vec<_> = candidates
        .iter()
        .filter(|(_, text)| strict_season_pass(text, season, ceiling, activity))
        .cloned()
        .collect();
    if !strict.is_empty() {
        return (strict, FilterTier::Strict);
    }

    let relaxed: Vec<_> = candidates
        .iter()
        .filter(|(_, text)| {
            auto_accepted(season, activity) || has_season_keyword(text, season)
        })
        .cloned()
        .collect();
    if !relaxed.is_empty() {
        debug!(season = %season, "strict seasonal filter emptied the set, relaxing to keywords");
        return (relaxed, FilterTier::Relaxed);
    }

    debug!(season = %season, "seasonal filter emptied the set, keeping all candidates");
    (candidates.to_vec(), FilterTier::Unfiltered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(c, t)| (c.to_string(), t.to_string())).collect()
    }

    #[test]
    fn activity_filter_keeps_matching_city() {
        let candidates = pairs(&[
            ("Сочи", "морской курорт, песчаный пляж, тёплое море, набережная"),
            ("Шерегеш", "горнолыжный курорт с трассами и подъёмниками"),
        ]);
        let (kept, tier) = filter_by_activity(&candidates, Activity::BeachVacation);
        assert_eq!(tier, FilterTier::Strict);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, "Сочи");
    }

    #[test]
    fn spa_member_city_passes_without_keywords() {
        let candidates = pairs(&[(
            "Кисловодск",
            "санаторий с лечебными процедурами, оздоровительный курорт, минеральные воды",
        )]);
        let (kept, tier) = filter_by_activity(&candidates, Activity::SpaWellness);
        assert_eq!(tier, FilterTier::Strict);
        assert_eq!(kept[0].0, "Кисловодск");
    }

    #[test]
    fn activity_filter_never_empties() {
        let candidates = pairs(&[
            ("Казань", "исторический город"),
            ("Ярославль", "старинный город"),
        ]);
        let (kept, tier) = filter_by_activity(&candidates, Activity::WinterSports);
        assert_eq!(tier, FilterTier::Unfiltered);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn season_filter_accepts_in_range_temperature() {
        let candidates = pairs(&[
            ("Сочи", "средняя температура 27°C, купальный сезон"),
            ("Шерегеш", "средняя температура -10°C, снежные склоны"),
        ]);
        let (kept, tier) = filter_by_season(&candidates, Season::Summer, None, None);
        assert_eq!(tier, FilterTier::Strict);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, "Сочи");
    }

    #[test]
    fn season_filter_honors_user_ceiling() {
        let candidates = pairs(&[("Анапа", "температура от 25 до 40 градусов")]);

        // Average 32.5 sits inside the summer range
        let (_, tier) = filter_by_season(&candidates, Season::Summer, None, None);
        assert_eq!(tier, FilterTier::Strict);

        // The 40° peak breaks a 30° ceiling
        let (_, tier) = filter_by_season(&candidates, Season::Summer, Some(30), None);
        assert_ne!(tier, FilterTier::Strict);
    }

    #[test]
    fn season_keyword_rescues_city_without_temperatures() {
        let candidates = pairs(&[("Ялта", "жаркое лето, пляжи и набережные")]);
        let (kept, tier) = filter_by_season(&candidates, Season::Summer, None, None);
        assert_eq!(tier, FilterTier::Strict);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn beach_city_auto_accepted_in_summer() {
        let candidates = pairs(&[("Евпатория", "курорт")]);
        let (kept, tier) =
            filter_by_season(&candidates, Season::Summer, Some(20), Some(Activity::BeachVacation));
        assert_eq!(tier, FilterTier::Strict);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn keyword_overrides_out_of_range_temperature() {
        let candidates = pairs(&[
            ("Сочи", "зимний отдых в горах, температура 25°C"),
            ("Казань", "музеи и театры"),
        ]);
        // 25°C is outside winter's range, but Сочи has the season keyword
        let (kept, tier) = filter_by_season(&candidates, Season::Winter, None, None);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, "Сочи");
        assert_eq!(tier, FilterTier::Strict);
    }

    #[test]
    fn season_filter_falls_back_to_input_set() {
        let candidates = pairs(&[("Казань", "музеи и театры")]);
        let (kept, tier) = filter_by_season(&candidates, Season::Winter, None, None);
        assert_eq!(tier, FilterTier::Unfiltered);
        assert_eq!(kept.len(), 1);
    }
}
