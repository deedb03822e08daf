//! Temperature extraction and normalization for noisy Russian text.
//!
//! Source pages mix "+25°C", "минус 5 градусов", "от -5 до +2°C" and
//! data-entry garbage like "357°" (a dropped decimal point). Extraction
//! tries a fixed priority list of patterns and returns the min/max pair
//! from the first pattern that yields any valid value; normalization
//! rewrites every temperature-with-unit mention into a canonical
//! `{int}°C` form so downstream substring checks see one format.

use std::sync::LazyLock;

use regex::Regex;

const UNIT: &str = r"(?:°c|c°|градус[а-я]*|°)";
const MONTH: &str =
    r"(?:январ|феврал|март|апрел|май|июн|июл|август|сентябр|октябр|ноябр|декабр)[а-я]*";

/// Extraction patterns, tried in order; the first pattern with any valid
/// match wins and later patterns are not consulted.
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let num = r"(-?\d+[.,]?\d*)";
    let sources = [
        // Explicit range: "от -5 до +2°C"
        format!(r"(?i)от\s*{num}\s*до\s*{num}\s*{UNIT}"),
        // Month-qualified value: "в январе -5°C"
        format!(r"(?i){MONTH}\s*[-—]?\s*(?:плюс\s*)?{num}\s*{UNIT}"),
        // Dash range: "-5...+2°C"
        format!(r"(?i){num}\.\.\.{num}\s*{UNIT}"),
        // Average statement: "средняя температура +15°C"
        format!(r"(?i)средн[а-я]*\s*температур[а-я]*\s*[-—]?\s*(?:плюс\s*)?{num}\s*{UNIT}"),
        // Bare temperature statement: "температура +34,7°C"
        format!(r"(?i)температур[а-я]*\s*[-—]?\s*(?:плюс\s*)?{num}\s*{UNIT}"),
        // Month with dash: "июля — +25,5°C"
        format!(r"(?i){MONTH}\s*[-—]\s*(?:плюс\s*)?{num}\s*{UNIT}"),
        // Explicit plus: "плюс 25 градусов"
        format!(r"(?i)плюс\s*{num}\s*{UNIT}"),
        // Explicit minus, digits only; negation applied in code
        format!(r"(?i)минус\s*(\d+[.,]?\d*)\s*{UNIT}"),
    ];
    sources
        .iter()
        .map(|s| Regex::new(s).expect("static temperature pattern"))
        .collect()
});

/// Pattern index whose capture must be negated ("минус N градусов").
const MINUS_PATTERN: usize = 7;

/// Rewrite pattern for [`normalize_temperature_text`]. The unit
/// alternation is longest-first so "25°C" is consumed whole and the pass
/// is idempotent.
static REWRITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(-?\d+(?:[.,]\d+)?)\s*(?:°c|c°|градус[а-я]*|°)")
        .expect("static rewrite pattern")
});

/// Parse and sanitize one captured temperature value.
///
/// Comma decimal separators are accepted; magnitudes over 100 are divided
/// by 10 (dropped decimal point), and once more if still over 50. Values
/// outside [-60, 50] are rejected. The result is truncated toward zero.
pub fn normalize_value(raw: &str) -> Option<i32> {
    let mut s = raw.replace(',', ".").trim().to_string();
    let mut negate = false;
    if let Some(rest) = s.strip_prefix("минус") {
        negate = true;
        s = rest.trim().to_string();
    }
    let mut value: f64 = s.parse().ok()?;
    if negate {
        value = -value;
    }
    if value > 100.0 {
        value /= 10.0;
    }
    if value > 50.0 {
        value /= 10.0;
    }
    if !(-60.0..=50.0).contains(&value) {
        return None;
    }
    Some(value.trunc() as i32)
}

/// Extract the (min, max) temperature pair from text, or `None` if no
/// pattern yields a valid value.
pub fn extract_temperature_range(text: &str) -> Option<(i32, i32)> {
    let text = text.to_lowercase();

    for (idx, pattern) in PATTERNS.iter().enumerate() {
        let mut temps = Vec::new();
        for captures in pattern.captures_iter(&text) {
            for group in captures.iter().skip(1).flatten() {
                let raw = group.as_str();
                // The sign must be attached before sanitizing so the
                // correction ladder and range gate see the negative value
                let value = if idx == MINUS_PATTERN {
                    normalize_value(&format!("-{raw}"))
                } else {
                    normalize_value(raw)
                };
                if let Some(v) = value {
                    temps.push(v);
                }
            }
        }
        if !temps.is_empty() {
            let min = *temps.iter().min().unwrap();
            let max = *temps.iter().max().unwrap();
            return Some((min, max));
        }
    }

    None
}

/// Rewrite every temperature-with-unit mention into `{int}°C`, or
/// `N/A°C` when the captured value fails validation. Idempotent.
pub fn normalize_temperature_text(text: &str) -> String {
    REWRITE
        .replace_all(text, |captures: &regex::Captures<'_>| {
            match normalize_value(&captures[1]) {
                Some(v) => format!("{v}°C"),
                None => "N/A°C".to_string(),
            }
        })
        .into_owned()
}

/// Whether the text's extracted max temperature falls within
/// `[min_required, max_required]`.
pub fn temperature_within(text: &str, min_required: i32, max_required: i32) -> bool {
    match extract_temperature_range(text) {
        Some((_, max)) => min_required <= max && max <= max_required,
        None => false,
    }
}

/// Midpoint of the extracted temperature range.
pub fn average_temperature(text: &str) -> Option<f32> {
    extract_temperature_range(text).map(|(min, max)| (min + max) as f32 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_plain_values() {
        assert_eq!(normalize_value("25"), Some(25));
        assert_eq!(normalize_value("-5"), Some(-5));
        assert_eq!(normalize_value("35,7"), Some(35));
        assert_eq!(normalize_value("35.7"), Some(35));
    }

    #[test]
    fn normalize_dropped_decimal_point() {
        // "357" is 35.7 with the point dropped
        assert_eq!(normalize_value("357"), Some(35));
        // Two corrections: 2570 -> 257 -> 25.7
        assert_eq!(normalize_value("2570"), Some(25));
    }

    #[test]
    fn normalize_minus_prefix() {
        assert_eq!(normalize_value("минус 5"), Some(-5));
        assert_eq!(normalize_value("минус5"), Some(-5));
    }

    #[test]
    fn normalize_rejects_out_of_range() {
        assert_eq!(normalize_value("-70"), None);
        assert_eq!(normalize_value("abc"), None);
    }

    #[test]
    fn extract_explicit_range() {
        assert_eq!(
            extract_temperature_range("зимой от -5 до +2°C"),
            Some((-5, 2))
        );
    }

    #[test]
    fn extract_dash_range() {
        assert_eq!(extract_temperature_range("ночью -5...+2°C"), Some((-5, 2)));
    }

    #[test]
    fn extract_month_qualified() {
        assert_eq!(
            extract_temperature_range("в январе -5°C, а в июле +25°C"),
            Some((-5, 25))
        );
    }

    #[test]
    fn extract_average_statement() {
        assert_eq!(
            extract_temperature_range("средняя температура +15 градусов"),
            Some((15, 15))
        );
    }

    #[test]
    fn extract_minus_phrase() {
        assert_eq!(
            extract_temperature_range("бывает минус 5 градусов"),
            Some((-5, -5))
        );
    }

    #[test]
    fn extract_minus_phrase_sanitizes_after_negation() {
        // -60 is the lower bound, in range as-is; the /10 correction
        // must not fire on the unsigned magnitude
        assert_eq!(
            extract_temperature_range("бывает минус 60 градусов"),
            Some((-60, -60))
        );
        // -70 is below the gate and rejected, not divided down to -7
        assert_eq!(extract_temperature_range("бывает минус 70 градусов"), None);
    }

    #[test]
    fn extract_first_pattern_wins() {
        // Both a range and a month value present; the range pattern has
        // priority and the month mention is ignored
        assert_eq!(
            extract_temperature_range("от 20 до 30°C, в июле 40°C"),
            Some((20, 30))
        );
    }

    #[test]
    fn extract_none_without_temperatures() {
        assert_eq!(extract_temperature_range("тёплое море и пляж"), None);
    }

    #[test]
    fn normalize_text_canonical_form() {
        assert_eq!(
            normalize_temperature_text("летом 25 градусов тепла"),
            "летом 25°C тепла"
        );
        assert_eq!(normalize_temperature_text("температура 357°"), "температура 35°C");
    }

    #[test]
    fn normalize_text_sentinel_for_garbage() {
        // Two corrections still leave 12345 out of range
        assert_eq!(normalize_temperature_text("жара 12345°C!"), "жара N/A°C!");
        assert_eq!(normalize_temperature_text("мороз -70°!"), "мороз N/A°C!");
    }

    #[test]
    fn normalize_text_is_idempotent() {
        let inputs = [
            "летом +25°C и зимой -5 градусов",
            "температура 35,7°",
            "жара 999°C",
        ];
        for input in inputs {
            let once = normalize_temperature_text(input);
            let twice = normalize_temperature_text(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn within_checks_max_value() {
        assert!(temperature_within("от 25 до 30 градусов", 20, 35));
        assert!(!temperature_within("от 25 до 30 градусов", 20, 28));
        assert!(!temperature_within("без цифр", 0, 50));
    }

    #[test]
    fn average_is_range_midpoint() {
        assert_eq!(average_temperature("от 20 до 30°C"), Some(25.0));
        assert_eq!(average_temperature("ничего"), None);
    }
}
