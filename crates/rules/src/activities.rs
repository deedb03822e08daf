//! The keyword rule engine: activity definitions and scoring.
//!
//! Five travel-purpose activities are declared in one static table:
//! matching keywords, named facility groups, named condition groups,
//! incompatible features, and strictness flags. Scoring is deterministic
//! substring counting over lower-cased text, producing a confidence in
//! [0, 1] that downstream stages use both for detection (user text) and
//! candidate filtering/boosting (city text).

use serde::{Deserialize, Serialize};

use crate::seasons::Season;

/// A travel-purpose category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    WinterSports,
    BeachVacation,
    CulturalTourism,
    FamilyVacation,
    SpaWellness,
}

impl Activity {
    /// All activities in declaration order (also the scan order).
    pub const ALL: [Activity; 5] = [
        Activity::WinterSports,
        Activity::BeachVacation,
        Activity::CulturalTourism,
        Activity::FamilyVacation,
        Activity::SpaWellness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Activity::WinterSports => "winter_sports",
            Activity::BeachVacation => "beach_vacation",
            Activity::CulturalTourism => "cultural_tourism",
            Activity::FamilyVacation => "family_vacation",
            Activity::SpaWellness => "spa_wellness",
        }
    }

    /// Beach-type activities get a lower filtering floor in the advisor.
    pub fn is_beach(self) -> bool {
        self == Activity::BeachVacation
    }
}

impl std::str::FromStr for Activity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "winter_sports" => Ok(Activity::WinterSports),
            "beach_vacation" => Ok(Activity::BeachVacation),
            "cultural_tourism" => Ok(Activity::CulturalTourism),
            "family_vacation" => Ok(Activity::FamilyVacation),
            "spa_wellness" => Ok(Activity::SpaWellness),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named set of keywords (facility or condition group).
#[derive(Debug, Clone, Copy)]
pub struct KeywordGroup {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Secondary filter used by the advisor's activity-based candidate
/// filtering: a keyword list plus a member-city override (a city on the
/// list passes regardless of its text).
#[derive(Debug, Clone, Copy)]
pub struct SecondaryFilter {
    pub keywords: &'static [&'static str],
    pub member_cities: &'static [&'static str],
}

/// Static per-activity matching rules. Immutable, declared once.
#[derive(Debug, Clone, Copy)]
pub struct ActivityDefinition {
    pub activity: Activity,
    pub keywords: &'static [&'static str],
    pub facilities: &'static [KeywordGroup],
    pub conditions: &'static [KeywordGroup],
    pub incompatible: &'static [&'static str],
    pub season: Option<Season>,
    /// How many facility groups must have at least one hit.
    pub min_facilities: usize,
    /// Strict activities require one of `required_keywords` (or, if that
    /// list is empty, one of `keywords`) before scoring at all.
    pub strict: bool,
    pub required_keywords: &'static [&'static str],
    pub secondary: SecondaryFilter,
}

pub static ACTIVITIES: [ActivityDefinition; 5] = [
    ActivityDefinition {
        activity: Activity::WinterSports,
        keywords: &[
            "горнолыжн", "лыж", "сноуборд", "зимний спорт", "зимний отдых",
            "катание на лыжах", "горный курорт", "зимние развлечения",
            "катание с гор", "зимние виды спорта", "горнолыжный курорт",
            "красная поляна", "роза хутор", "домбай", "приэльбрусье", "архыз",
            "шерегеш",
        ],
        facilities: &[
            KeywordGroup {
                name: "ski_slopes",
                keywords: &["горнолыжн", "лыжн", "трасс", "склон", "спуск"],
            },
            KeywordGroup {
                name: "ski_lifts",
                keywords: &["подъемник", "канатная дорога", "фуникулер", "бугель"],
            },
            KeywordGroup {
                name: "equipment_rental",
                keywords: &["прокат", "экипировк", "снаряжени", "инструктор"],
            },
            KeywordGroup {
                name: "winter_infrastructure",
                keywords: &[
                    "красная поляна", "роза хутор", "домбай", "приэльбрусье", "архыз", "шерегеш",
                ],
            },
        ],
        conditions: &[
            KeywordGroup { name: "terrain", keywords: &["гор", "склон", "хребет", "вершин"] },
            KeywordGroup { name: "weather", keywords: &["снег", "зимн", "холодн", "сезон"] },
        ],
        incompatible: &["аквапарк", "пляж"],
        season: Some(Season::Winter),
        min_facilities: 2,
        strict: true,
        required_keywords: &["горнолыжн", "лыж", "сноуборд"],
        secondary: SecondaryFilter {
            keywords: &["горнолыжн", "лыж", "склон", "подъемник", "канатн"],
            member_cities: &[],
        },
    },
    ActivityDefinition {
        activity: Activity::BeachVacation,
        keywords: &[
            "пляж", "море", "купаться", "загорать", "морской курорт",
            "пляжный отдых", "морской отдых", "приморский курорт",
            "песчаный пляж", "морское побережье", "пляжный сезон",
            "набережн", "побережь", "залив", "бухт", "черное море",
            "каспийское море", "балтийское море",
        ],
        facilities: &[
            KeywordGroup {
                name: "beaches",
                keywords: &["пляж", "набережн", "побережь", "море", "залив", "бухт"],
            },
            KeywordGroup {
                name: "water_activities",
                keywords: &[
                    "купальн", "аквапарк", "дайвинг", "серфинг", "водные развлечения", "отдых",
                ],
            },
            KeywordGroup {
                name: "beach_services",
                keywords: &["лежак", "зонт", "кабинк", "пляжный сервис", "курорт"],
            },
        ],
        conditions: &[
            KeywordGroup { name: "water", keywords: &["море", "океан", "залив", "бухт", "побережь"] },
            KeywordGroup { name: "weather", keywords: &["солнечн", "тепл", "жарк", "лет"] },
        ],
        incompatible: &["горнолыжн", "снег"],
        season: Some(Season::Summer),
        min_facilities: 1,
        strict: false,
        required_keywords: &[],
        secondary: SecondaryFilter {
            keywords: &["пляж", "море", "побережь", "курорт", "купальн"],
            member_cities: &[],
        },
    },
    ActivityDefinition {
        activity: Activity::CulturalTourism,
        keywords: &[
            "музей", "историческ", "культурн", "экскурси", "достопримечательност",
            "архитектур", "памятник", "храм", "собор", "культурное наследие",
            "исторический центр", "старый город",
        ],
        facilities: &[
            KeywordGroup { name: "museums", keywords: &["музей", "галере", "выставк", "экспозиц"] },
            KeywordGroup {
                name: "historical_sites",
                keywords: &["памятник", "храм", "монастыр", "крепост", "дворец", "собор"],
            },
            KeywordGroup {
                name: "theaters",
                keywords: &["театр", "филармони", "концертн", "опер"],
            },
        ],
        conditions: &[KeywordGroup {
            name: "infrastructure",
            keywords: &["экскурси", "туристическ", "культурн"],
        }],
        incompatible: &[],
        season: None,
        min_facilities: 1,
        strict: false,
        required_keywords: &[],
        secondary: SecondaryFilter {
            keywords: &["музей", "историческ", "архитектур", "театр", "достопримечательност"],
            member_cities: &[],
        },
    },
    ActivityDefinition {
        activity: Activity::FamilyVacation,
        keywords: &[
            "с детьми", "семейный", "детский", "аквапарк", "семейный отдых",
            "для всей семьи", "детские развлечения", "семейный курорт",
            "детская площадка", "детские аттракционы",
        ],
        facilities: &[
            KeywordGroup {
                name: "entertainment",
                keywords: &["аквапарк", "парк", "зоопарк", "цирк", "аттракцион"],
            },
            KeywordGroup {
                name: "children_activities",
                keywords: &["детск", "игров", "развлекательн", "семейн"],
            },
            KeywordGroup { name: "safety", keywords: &["пляж", "променад", "парк", "безопасн"] },
        ],
        conditions: &[
            KeywordGroup {
                name: "infrastructure",
                keywords: &["инфраструктур", "благоустро", "удобств"],
            },
            KeywordGroup {
                name: "accessibility",
                keywords: &["транспорт", "добраться", "доступн"],
            },
        ],
        incompatible: &[],
        season: None,
        min_facilities: 2,
        strict: false,
        required_keywords: &[],
        secondary: SecondaryFilter {
            keywords: &["аквапарк", "детск", "парк", "развлечен", "семейн"],
            member_cities: &[],
        },
    },
    ActivityDefinition {
        activity: Activity::SpaWellness,
        keywords: &[
            "спа", "оздоровительный", "санаторий", "лечебный курорт",
            "оздоровление", "wellness", "термальные источники", "грязелечение",
            "массаж", "релакс", "оздоровительные процедуры", "кисловодск",
            "пятигорск", "ессентуки", "железноводск", "минеральные воды",
        ],
        facilities: &[
            KeywordGroup {
                name: "spa_centers",
                keywords: &["спа", "массаж", "процедур", "оздоровительн", "wellness"],
            },
            KeywordGroup {
                name: "medical",
                keywords: &["санатори", "лечебн", "терапи", "реабилитац", "профилактори"],
            },
            KeywordGroup {
                name: "wellness",
                keywords: &["термальн", "источник", "грязелечени", "минеральн", "нарзан", "бювет"],
            },
        ],
        conditions: &[
            KeywordGroup {
                name: "environment",
                keywords: &["чист", "экологичн", "природ", "климат", "воздух"],
            },
            KeywordGroup {
                name: "infrastructure",
                keywords: &["медицинск", "оздоровительн", "лечебн", "санаторн"],
            },
        ],
        incompatible: &[],
        season: None,
        min_facilities: 2,
        strict: true,
        required_keywords: &["спа", "санатори", "лечебн", "оздоровительн"],
        secondary: SecondaryFilter {
            keywords: &["санатори", "спа", "лечебн", "источник", "нарзан"],
            member_cities: &[
                "Кисловодск", "Пятигорск", "Ессентуки", "Железноводск", "Минеральные Воды",
            ],
        },
    },
];

/// Look up the static definition for an activity.
pub fn definition(activity: Activity) -> &'static ActivityDefinition {
    // ALL and ACTIVITIES share declaration order.
    &ACTIVITIES[Activity::ALL
        .iter()
        .position(|a| *a == activity)
        .unwrap_or(0)]
}

fn group_hits(group: &KeywordGroup, text: &str) -> usize {
    group.keywords.iter().filter(|kw| text.contains(*kw)).count()
}

/// Score how well a text matches an activity's requirements, in [0, 1].
///
/// 1. Any incompatible-feature keyword present → 0.
/// 2. Strict activities require at least one required keyword → else 0.
/// 3. Facility score: sum over groups of hits/group-size, divided by the
///    number of groups; fewer matched groups than `min_facilities` → 0.
/// 4. Condition score: average of hits/group-size across groups.
/// 5. Final: min(1, (facility + condition) / 2).
///
/// Empty group sets contribute 0 rather than dividing by zero.
pub fn activity_score(text: &str, activity: Activity) -> f32 {
    let def = definition(activity);
    let text = text.to_lowercase();

    if def.incompatible.iter().any(|kw| text.contains(kw)) {
        return 0.0;
    }

    if def.strict {
        let required = if def.required_keywords.is_empty() {
            def.keywords
        } else {
            def.required_keywords
        };
        if !required.iter().any(|kw| text.contains(kw)) {
            return 0.0;
        }
    }

    let mut facility_sum = 0.0f32;
    let mut groups_matched = 0usize;
    for group in def.facilities {
        if group.keywords.is_empty() {
            continue;
        }
        let hits = group_hits(group, &text);
        if hits > 0 {
            groups_matched += 1;
            facility_sum += hits as f32 / group.keywords.len() as f32;
        }
    }

    if groups_matched < def.min_facilities {
        return 0.0;
    }

    let facility_score = if def.facilities.is_empty() {
        0.0
    } else {
        facility_sum / def.facilities.len() as f32
    };

    let condition_score = if def.conditions.is_empty() {
        0.0
    } else {
        def.conditions
            .iter()
            .map(|group| {
                if group.keywords.is_empty() {
                    0.0
                } else {
                    group_hits(group, &text) as f32 / group.keywords.len() as f32
                }
            })
            .sum::<f32>()
            / def.conditions.len() as f32
    };

    ((facility_score + condition_score) / 2.0).min(1.0)
}

/// Extract candidate activities from user text with confidence scores.
///
/// Confidence accumulates 1/len(keywords) per keyword hit plus
/// 0.5/total-facility-keywords per facility-keyword hit; only matches
/// above 0.2 are kept. Stable descending sort, so ties keep declaration
/// order.
pub fn rule_based_matches(text: &str) -> Vec<(Activity, f32)> {
    let text = text.to_lowercase();
    let mut matches = Vec::new();

    for def in ACTIVITIES.iter() {
        let mut confidence = 0.0f32;

        for kw in def.keywords {
            if text.contains(kw) {
                confidence += 1.0 / def.keywords.len() as f32;
            }
        }

        let total_facility_keywords: usize =
            def.facilities.iter().map(|g| g.keywords.len()).sum();
        if total_facility_keywords > 0 {
            for group in def.facilities {
                confidence +=
                    group_hits(group, &text) as f32 * 0.5 / total_facility_keywords as f32;
            }
        }

        if confidence > 0.2 {
            matches.push((def.activity, confidence.min(1.0)));
        }
    }

    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    matches
}
