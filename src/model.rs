//! Observation data model, key normalization and the lenient position parse.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 1-based rank within a search results page, or the sentinel meaning the
/// domain did not appear within the searched window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankPosition {
    Ranked(u32),
    NotFound,
}

impl RankPosition {
    pub fn as_rank(&self) -> Option<u32> {
        match self {
            RankPosition::Ranked(n) => Some(*n),
            RankPosition::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RankPosition::Ranked(_))
    }
}

impl fmt::Display for RankPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankPosition::Ranked(n) => write!(f, "{n}"),
            RankPosition::NotFound => write!(f, "not found"),
        }
    }
}

/// One recorded rank check. Append-only once stored: at most one observation
/// per (domain, keyword, date) is authoritative per locale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar day of the check. Reconciliation is day-granular.
    pub date: NaiveDate,
    /// Normalized domain (scheme and `www.` stripped, lower-cased).
    pub domain: String,
    /// Trimmed keyword with its original casing. Comparisons go through
    /// [`normalize_keyword`].
    pub keyword: String,
    pub locale: String,
    #[serde(
        default = "default_position",
        serialize_with = "serialize_position",
        deserialize_with = "deserialize_position"
    )]
    pub position: RankPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Signed change versus the previous observation; positive means the
    /// rank improved. Absent when either side is the sentinel or there is
    /// no prior record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

/// What a single `reconcile` call produced.
#[derive(Debug, Clone)]
pub struct ObservationResult {
    pub observation: Observation,
    /// True when this call invoked the provider; false when a same-day
    /// record was reused.
    pub fresh_lookup: bool,
    /// False when the observation could not be written to the store.
    pub persisted: bool,
}

/// Strips scheme and `www.` prefix, lower-cases and drops any path, so that
/// `https://www.Example.com/` and `example.com` produce the same key.
pub fn normalize_domain(domain: &str) -> String {
    let d = domain.trim().to_lowercase();
    let d = d
        .strip_prefix("https://")
        .or_else(|| d.strip_prefix("http://"))
        .unwrap_or(&d);
    let d = d.strip_prefix("www.").unwrap_or(d);
    match d.split_once('/') {
        Some((host, _)) => host.to_string(),
        None => d.to_string(),
    }
}

/// Comparison key for keywords. Display keeps the original casing.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

/// Parses a stored position that may carry spreadsheet artifacts: surrounding
/// quote marks, apostrophes, backticks, stray whitespace. Non-integer residue
/// (including sentinel strings like `>100`) yields `None` instead of an error.
pub fn parse_stored_position(raw: &str) -> Option<u32> {
    let cleaned = raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '\'' | '"' | '`'));
    cleaned.parse().ok()
}

/// `previous - current` when both are numeric ranks. A positive delta means
/// the rank improved (lower number is better); zero means unchanged.
pub fn rank_delta(previous: RankPosition, current: RankPosition) -> Option<i64> {
    match (previous, current) {
        (RankPosition::Ranked(prev), RankPosition::Ranked(cur)) => {
            Some(i64::from(prev) - i64::from(cur))
        }
        _ => None,
    }
}

fn default_position() -> RankPosition {
    RankPosition::NotFound
}

fn serialize_position<S: Serializer>(pos: &RankPosition, s: S) -> Result<S::Ok, S::Error> {
    match pos {
        RankPosition::Ranked(n) => s.serialize_u32(*n),
        RankPosition::NotFound => s.serialize_none(),
    }
}

/// Accepts a number, null, or a string with incidental formatting artifacts.
/// Anything that does not clean up to an integer is the sentinel.
fn deserialize_position<'de, D: Deserializer<'de>>(d: D) -> Result<RankPosition, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(RankPosition::Ranked)
            .unwrap_or(RankPosition::NotFound),
        Some(serde_json::Value::String(s)) => parse_stored_position(&s)
            .map(RankPosition::Ranked)
            .unwrap_or(RankPosition::NotFound),
        _ => RankPosition::NotFound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_normalization_strips_scheme_www_and_case() {
        assert_eq!(normalize_domain("https://www.Example.com"), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("http://example.com/page?a=1"), "example.com");
        assert_eq!(normalize_domain("  WWW.Example.com/ "), "example.com");
    }

    #[test]
    fn keyword_normalization_trims_and_lowercases() {
        assert_eq!(normalize_keyword("  Best Robot 2024 "), "best robot 2024");
    }

    #[test]
    fn stored_positions_with_artifacts_parse() {
        assert_eq!(parse_stored_position("'12 "), Some(12));
        assert_eq!(parse_stored_position("\" 7\""), Some(7));
        assert_eq!(parse_stored_position("42"), Some(42));
        assert_eq!(parse_stored_position(">100"), None);
        assert_eq!(parse_stored_position("Erreur"), None);
        assert_eq!(parse_stored_position(""), None);
    }

    #[test]
    fn delta_sign_convention() {
        use RankPosition::*;
        assert_eq!(rank_delta(Ranked(10), Ranked(7)), Some(3));
        assert_eq!(rank_delta(Ranked(5), Ranked(9)), Some(-4));
        assert_eq!(rank_delta(Ranked(4), Ranked(4)), Some(0));
        assert_eq!(rank_delta(NotFound, Ranked(1)), None);
        assert_eq!(rank_delta(Ranked(1), NotFound), None);
    }

    #[test]
    fn observation_roundtrips_and_reads_polluted_positions() {
        let json = r#"{"date":"2026-08-21","domain":"example.com","keyword":"x","locale":"us","position":"'12 "}"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.position, RankPosition::Ranked(12));
        assert_eq!(obs.delta, None);

        let json = r#"{"date":"2026-08-21","domain":"example.com","keyword":"x","locale":"us","position":null}"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.position, RankPosition::NotFound);

        let obs = Observation {
            date: NaiveDate::from_ymd_opt(2026, 8, 21).unwrap(),
            domain: "example.com".into(),
            keyword: "Best Robot".into(),
            locale: "fr".into(),
            position: RankPosition::Ranked(3),
            url: Some("https://example.com/robot".into()),
            delta: Some(2),
        };
        let back: Observation = serde_json::from_str(&serde_json::to_string(&obs).unwrap()).unwrap();
        assert_eq!(back.position, RankPosition::Ranked(3));
        assert_eq!(back.delta, Some(2));
        assert_eq!(back.keyword, "Best Robot");
    }
}
