use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Date,
    Time,
    Quantity,
    Vessel,
    Gpe,
}

impl EntityLabel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Quantity => "QUANTITY",
            Self::Vessel => "VESSEL",
            Self::Gpe => "GPE",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(text, label)` as it appears in `ml_entities`.
pub type EntityPair = (String, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

impl EntitySpan {
    #[must_use]
    pub fn to_pair(&self) -> EntityPair {
        (self.text.clone(), self.label.as_str().to_string())
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Named-entity recognizer over a single line of text. Results are ordered
/// by offset and never overlap.
pub trait EntityTagger: Send + Sync {
    fn tag(&self, text: &str) -> Vec<EntitySpan>;

    fn pairs(&self, text: &str) -> Vec<EntityPair> {
        self.tag(text).iter().map(EntitySpan::to_pair).collect()
    }
}

struct Pattern {
    label: EntityLabel,
    regex: Regex,
    /// Skip matches directly following a number (`5000 MT CORN` is cargo, not a ship).
    not_after_number: bool,
}

impl Pattern {
    fn new(label: EntityLabel, pattern: &str) -> Self {
        Self {
            label,
            regex: Regex::new(pattern).expect("valid entity pattern"),
            not_after_number: false,
        }
    }

    fn not_after_number(mut self) -> Self {
        self.not_after_number = true;
        self
    }
}

static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        Pattern::new(EntityLabel::Date, r"\b\d{1,2}[./-]\d{1,2}[./-](?:\d{4}|\d{2})\b"),
        Pattern::new(
            EntityLabel::Date,
            r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?,?\s+\d{2,4}\b",
        ),
        Pattern::new(EntityLabel::Time, r"(?i)\b\d{1,2}:\d{2}(?:\s*hrs|\s*h)?\b"),
        Pattern::new(EntityLabel::Time, r"(?i)\b(?:[01]\d|2[0-3])[0-5]\d(?:\s*hrs?|h)?\b"),
        Pattern::new(
            EntityLabel::Quantity,
            r"(?i)\b\d{1,3}(?:,\d{3})*(?:\.\d+)?\s*(?:mts?|m/t|metric\s+tons?|tonnes?|tons?|cbm|m3|bbls?)\b",
        ),
        Pattern::new(
            EntityLabel::Quantity,
            r"(?i)\b\d+(?:\.\d+)?\s*(?:mts?|m/t|metric\s+tons?|tonnes?|tons?|cbm|m3|bbls?)\b",
        ),
        Pattern::new(
            EntityLabel::Vessel,
            r"\b(?:M/V|M\.V\.|MV|MT|M/T)\s+[A-Z][A-Za-z0-9-]*(?:\s+[A-Z][A-Za-z0-9-]*){0,2}",
        )
        .not_after_number(),
        Pattern::new(
            EntityLabel::Gpe,
            r"\b(?:[Pp]ort\s+of|PORT\s+OF)\s+([A-Z][A-Za-z-]+(?:\s+[A-Z][A-Za-z-]+)?)",
        ),
        Pattern::new(
            EntityLabel::Gpe,
            r"\b(?:[Aa]nchorage|ANCHORAGE)\s+(?:(?:at|of|off)\s+)?([A-Z][A-Za-z-]+(?:\s+[A-Z][A-Za-z-]+)?)",
        ),
    ]
});

/// Pattern and gazetteer tagger for statement-of-facts vocabulary.
///
/// The pattern table is compiled once per process; instances are free to
/// create and share.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedTagger;

impl RuleBasedTagger {
    #[must_use]
    pub fn new() -> Self {
        LazyLock::force(&PATTERNS);
        Self
    }

    fn candidates(text: &str) -> Vec<EntitySpan> {
        let mut found = Vec::new();
        for pattern in PATTERNS.iter() {
            for caps in pattern.regex.captures_iter(text) {
                let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                    continue;
                };
                if pattern.not_after_number
                    && text[..m.start()]
                        .trim_end()
                        .ends_with(|c: char| c.is_ascii_digit())
                {
                    continue;
                }
                let matched = m.as_str().trim_end();
                found.push(EntitySpan {
                    text: matched.to_string(),
                    label: pattern.label,
                    start: m.start(),
                    end: m.start() + matched.len(),
                });
            }
        }
        found
    }
}

impl EntityTagger for RuleBasedTagger {
    fn tag(&self, text: &str) -> Vec<EntitySpan> {
        let mut candidates = Self::candidates(text);
        candidates.sort_by(|a, b| {
            (b.end - b.start)
                .cmp(&(a.end - a.start))
                .then(a.start.cmp(&b.start))
        });

        let mut accepted: Vec<EntitySpan> = Vec::new();
        for candidate in candidates {
            if !accepted.iter().any(|a| a.overlaps(&candidate)) {
                accepted.push(candidate);
            }
        }
        accepted.sort_by_key(|s| s.start);
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(text: &str) -> Vec<(String, &'static str)> {
        RuleBasedTagger::new()
            .tag(text)
            .into_iter()
            .map(|s| (s.text, s.label.as_str()))
            .collect()
    }

    #[test]
    fn test_tags_common_sof_entities() {
        let tagged = labels("MV Ocean Star arrived port of Santos 14/05/2023 at 08:00 hrs");

        assert_eq!(
            tagged,
            vec![
                ("MV Ocean Star".to_string(), "VESSEL"),
                ("Santos".to_string(), "GPE"),
                ("14/05/2023".to_string(), "DATE"),
                ("08:00 hrs".to_string(), "TIME"),
            ]
        );
    }

    #[test]
    fn test_quantity_beats_vessel_prefix() {
        let tagged = labels("Loaded 25,000 MT Soybeans");
        assert_eq!(tagged, vec![("25,000 MT".to_string(), "QUANTITY")]);
    }

    #[test]
    fn test_longest_match_wins() {
        // the year inside the date is also a valid bare time
        let tagged = labels("Completed 14-05-2023");
        assert_eq!(tagged, vec![("14-05-2023".to_string(), "DATE")]);
    }

    #[test]
    fn test_spans_are_ordered_and_disjoint() {
        let spans = RuleBasedTagger::new().tag("0800 anchorage Fujairah 1200 MT 2 cbm 1 Jun 2023");

        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        let labels: Vec<&str> = spans.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["TIME", "GPE", "QUANTITY", "QUANTITY", "DATE"]);
    }

    #[test]
    fn test_pairs() {
        let pairs = RuleBasedTagger::new().pairs("NOR tendered 0900");
        assert_eq!(pairs, vec![("0900".to_string(), "TIME".to_string())]);
    }

    #[test]
    fn test_plain_text_has_no_entities() {
        assert!(labels("Weather fine throughout").is_empty());
    }
}
