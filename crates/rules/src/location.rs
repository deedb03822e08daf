//! Coarse location-type routing.
//!
//! Used by the advisor to narrow the candidate-city fetch before the
//! expensive stages. A detected primary activity is the strongest
//! signal; keyword probes over the preferences text come second. No
//! signal means no narrowing (the caller fetches the full roster).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activities::Activity;

/// Coarse location category a request routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Sea,
    Mountains,
    Spa,
    City,
}

impl LocationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationKind::Sea => "sea",
            LocationKind::Mountains => "mountains",
            LocationKind::Spa => "spa",
            LocationKind::City => "city",
        }
    }
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Keyword stems per category. "гор" alone is avoided since it also
// matches "город"; mountain probes use longer stems.
static SEA_STEMS: [&str; 7] =
    ["море", "пляж", "побережь", "купаться", "загорать", "набережн", "бухт"];
static MOUNTAIN_STEMS: [&str; 7] =
    ["горнолыжн", "лыж", "сноуборд", "в горах", "горы", "склон", "хребет"];
static SPA_STEMS: [&str; 6] =
    ["санатори", "спа", "лечебн", "оздоровительн", "минеральн", "источник"];
static CITY_STEMS: [&str; 6] =
    ["музей", "экскурси", "историческ", "архитектур", "достопримечательност", "театр"];

fn activity_hint(activity: Activity) -> Option<LocationKind> {
    match activity {
        Activity::BeachVacation => Some(LocationKind::Sea),
        Activity::WinterSports => Some(LocationKind::Mountains),
        Activity::SpaWellness => Some(LocationKind::Spa),
        Activity::CulturalTourism => Some(LocationKind::City),
        // Family vacations happen everywhere
        Activity::FamilyVacation => None,
    }
}

/// Infer the location category from preferences text and, when present,
/// the detected primary activity. Returns `None` when nothing matches.
pub fn detect_location(preferences: &str, activity: Option<Activity>) -> Option<LocationKind> {
    if let Some(kind) = activity.and_then(activity_hint) {
        debug!(location = %kind, "location routed from activity");
        return Some(kind);
    }

    let text = preferences.to_lowercase();
    let probes: [(&[&str], LocationKind); 4] = [
        (&SEA_STEMS, LocationKind::Sea),
        (&MOUNTAIN_STEMS, LocationKind::Mountains),
        (&SPA_STEMS, LocationKind::Spa),
        (&CITY_STEMS, LocationKind::City),
    ];
    for (stems, kind) in probes {
        if stems.iter().any(|stem| text.contains(stem)) {
            debug!(location = %kind, "location routed from keywords");
            return Some(kind);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_beats_keywords() {
        // Text says sea, activity says mountains
        let kind = detect_location("хочу на море", Some(Activity::WinterSports));
        assert_eq!(kind, Some(LocationKind::Mountains));
    }

    #[test]
    fn sea_keywords_route_to_sea() {
        assert_eq!(detect_location("песчаный пляж и купаться", None), Some(LocationKind::Sea));
    }

    #[test]
    fn spa_keywords_route_to_spa() {
        assert_eq!(
            detect_location("санаторий с минеральными источниками", None),
            Some(LocationKind::Spa)
        );
    }

    #[test]
    fn city_word_does_not_mean_mountains() {
        // "город" must not trip a mountain stem
        assert_eq!(detect_location("красивый город", None), None);
    }

    #[test]
    fn family_activity_gives_no_hint() {
        assert_eq!(detect_location("отдых с детьми", Some(Activity::FamilyVacation)), None);
    }

    #[test]
    fn no_signal_is_none() {
        assert_eq!(detect_location("хочу отдохнуть недорого", None), None);
    }
}
