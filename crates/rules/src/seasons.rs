//! Season classification from free text.
//!
//! Month names win over seasonal keywords: "лыжи в апреле" is spring,
//! not winter. Keyword sets overlap across ambiguous text, so iteration
//! order over the season table is fixed declaration order and the first
//! match wins — no further overlap resolution.

use serde::{Deserialize, Serialize};

/// One of the four seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

/// Static season definition: calendar months, Russian keyword stems, and
/// the inclusive comfortable-temperature range in °C.
#[derive(Debug, Clone, Copy)]
pub struct SeasonDefinition {
    pub season: Season,
    pub months: &'static [u32],
    pub keywords: &'static [&'static str],
    pub temp_range: (i32, i32),
}

/// Declaration order is the classification order.
pub static SEASONS: [SeasonDefinition; 4] = [
    SeasonDefinition {
        season: Season::Winter,
        months: &[12, 1, 2],
        keywords: &["зима", "зимний", "лыжи", "горнолыжный"],
        temp_range: (-30, 5),
    },
    SeasonDefinition {
        season: Season::Spring,
        months: &[3, 4, 5],
        keywords: &["весна", "весенний"],
        temp_range: (5, 20),
    },
    SeasonDefinition {
        season: Season::Summer,
        months: &[6, 7, 8],
        keywords: &["лето", "летний", "пляж", "море"],
        temp_range: (20, 35),
    },
    SeasonDefinition {
        season: Season::Fall,
        months: &[9, 10, 11],
        keywords: &["осень", "осенний"],
        temp_range: (5, 20),
    },
];

/// Russian month-name stems, matched as substrings against lower-cased text.
static MONTH_STEMS: [(&str, u32); 12] = [
    ("январ", 1),
    ("феврал", 2),
    ("март", 3),
    ("апрел", 4),
    ("май", 5),
    ("июн", 6),
    ("июл", 7),
    ("август", 8),
    ("сентябр", 9),
    ("октябр", 10),
    ("ноябр", 11),
    ("декабр", 12),
];

impl Season {
    /// The season containing the given calendar month (1–12).
    pub fn from_month(month: u32) -> Option<Self> {
        SEASONS
            .iter()
            .find(|def| def.months.contains(&month))
            .map(|def| def.season)
    }

    pub fn definition(self) -> &'static SeasonDefinition {
        SEASONS
            .iter()
            .find(|def| def.season == self)
            .unwrap_or(&SEASONS[0])
    }

    pub fn keywords(self) -> &'static [&'static str] {
        self.definition().keywords
    }

    /// Inclusive comfortable-temperature range, °C.
    pub fn temp_range(self) -> (i32, i32) {
        self.definition().temp_range
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

impl std::str::FromStr for Season {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a season from seasonal keywords only.
fn season_from_keywords(text: &str) -> Option<Season> {
    SEASONS
        .iter()
        .find(|def| def.keywords.iter().any(|kw| text.contains(kw)))
        .map(|def| def.season)
}

/// Determine the season a text refers to, via month names first, then
/// seasonal keywords. Returns `None` when neither signal is present.
pub fn season_from_text(text: &str) -> Option<Season> {
    let text = text.to_lowercase();

    for (stem, month) in MONTH_STEMS.iter() {
        if text.contains(stem) {
            if let Some(season) = Season::from_month(*month) {
                return Some(season);
            }
        }
    }

    season_from_keywords(&text)
}
