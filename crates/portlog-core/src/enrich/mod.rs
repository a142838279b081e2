//! Entity tagging and operation classification over normalized lines.

mod tagger;
mod taxonomy;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::events::{find_date, four_digit_times, mask, NULL};

pub use tagger::{EntityLabel, EntityPair, EntitySpan, EntityTagger, RuleBasedTagger};
pub use taxonomy::{OperationCategory, OperationTaxonomy};

static COLON_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})(?:\s*hrs|\s*h)?\b").expect("valid colon time regex")
});

/// A line the enricher considers operationally relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    pub category: OperationCategory,
    pub start_time: String,
    pub end_time: String,
    pub line: String,
    pub entities: Vec<EntityPair>,
}

/// Time values of a line in order of appearance, as `HH:MM`.
fn line_times(line: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = COLON_TIME
        .captures_iter(line)
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            let hours: u32 = caps[1].parse().ok()?;
            let minutes: u32 = caps[2].parse().ok()?;
            let valid = (hours < 24 && minutes < 60) || (hours == 24 && minutes == 0);
            valid.then(|| (start, format!("{hours:02}:{minutes:02}")))
        })
        .collect();

    let searchable =
        find_date(line).map_or_else(|| line.to_string(), |(span, _)| mask(line, &span));
    found.extend(
        four_digit_times(&searchable)
            .into_iter()
            .map(|t| (t.span.start, t.value)),
    );

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, value)| value).collect()
}

pub struct EntityEnricher {
    tagger: Arc<dyn EntityTagger>,
    taxonomy: OperationTaxonomy,
}

impl EntityEnricher {
    #[must_use]
    pub fn new(tagger: Arc<dyn EntityTagger>) -> Self {
        Self {
            tagger,
            taxonomy: OperationTaxonomy::default(),
        }
    }

    #[must_use]
    pub fn with_taxonomy(mut self, taxonomy: OperationTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    #[must_use]
    pub fn taxonomy(&self) -> &OperationTaxonomy {
        &self.taxonomy
    }

    /// Entity pairs for a single piece of text.
    #[must_use]
    pub fn annotate(&self, text: &str) -> Vec<EntityPair> {
        self.tagger.pairs(text)
    }

    /// Keep every line that carries a time or a known operation keyword.
    pub fn enrich<I, S>(&self, lines: I) -> Vec<EnrichedCandidate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut candidates = Vec::new();
        for line in lines {
            let line = line.as_ref();
            let category = self.taxonomy.classify(line);
            let times = line_times(line);

            if times.is_empty() && category == OperationCategory::Other {
                continue;
            }

            let mut times = times.into_iter();
            candidates.push(EnrichedCandidate {
                category,
                start_time: times.next().unwrap_or_else(|| NULL.to_string()),
                end_time: times.next().unwrap_or_else(|| NULL.to_string()),
                line: line.to_string(),
                entities: self.annotate(line),
            });
        }

        tracing::info!(candidates = candidates.len(), "Entity enrichment complete");
        candidates
    }
}

impl Default for EntityEnricher {
    fn default() -> Self {
        Self::new(Arc::new(RuleBasedTagger::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoEntities;

    impl EntityTagger for NoEntities {
        fn tag(&self, _text: &str) -> Vec<EntitySpan> {
            Vec::new()
        }
    }

    #[test]
    fn test_line_times() {
        assert_eq!(line_times("From 08:00 hrs to 9:30"), vec!["08:00", "09:30"]);
        assert_eq!(line_times("0800-1230 Loading"), vec!["08:00", "12:30"]);
        assert_eq!(line_times("Arrived 14-05-2023 0600"), vec!["06:00"]);
        assert_eq!(line_times("12:00 then 1400"), vec!["12:00", "14:00"]);
        assert!(line_times("Weather fine").is_empty());
    }

    #[test]
    fn test_custom_taxonomy() {
        let enricher = EntityEnricher::new(Arc::new(NoEntities)).with_taxonomy(
            OperationTaxonomy::new(vec![(OperationCategory::Shifting, vec!["Warping".into()])]),
        );
        assert_eq!(enricher.taxonomy().rules().count(), 1);

        let candidates = enricher.enrich(["Warping along berth 3", "Loading commenced"]);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].category, OperationCategory::Shifting);
    }

    #[test]
    fn test_enrich_keeps_timed_or_categorized_lines() {
        let enricher = EntityEnricher::new(Arc::new(NoEntities));
        let candidates = enricher.enrich([
            "Loading commenced",
            "Weather fine throughout",
            "Pilot on board 10:30",
            "Hoses disconnected 1400 1530",
        ]);

        assert_eq!(candidates.len(), 3);

        assert_eq!(candidates[0].category, OperationCategory::Loading);
        assert_eq!(candidates[0].start_time, "NULL");
        assert_eq!(candidates[0].end_time, "NULL");

        assert_eq!(candidates[1].category, OperationCategory::Other);
        assert_eq!(candidates[1].start_time, "10:30");
        assert_eq!(candidates[1].end_time, "NULL");

        assert_eq!(candidates[2].start_time, "14:00");
        assert_eq!(candidates[2].end_time, "15:30");
        assert_eq!(candidates[2].line, "Hoses disconnected 1400 1530");
    }

    #[test]
    fn test_default_enricher_tags_entities() {
        let candidates = EntityEnricher::default().enrich(["MV Ocean Star shifted 0900"]);

        assert_eq!(candidates[0].category, OperationCategory::Shifting);
        assert!(candidates[0]
            .entities
            .contains(&("MV Ocean Star".to_string(), "VESSEL".to_string())));
    }
}
