use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SchemaConfig;
use crate::enrich::{EnrichedCandidate, EntityPair};
use crate::events::Event;

pub const NO_EVENTS_DETAIL: &str = "No specific events found or extracted from SOF document.";
pub const EMPTY_CP_DETAIL: &str = "No extractable content found for CP document.";
pub const EMPTY_ADDITIONAL_DETAIL: &str = "No extractable content found for additional document.";

/// Column order of the unified record in tabular output.
pub const UNIFIED_KEYS: &[&str] = &[
    "id",
    "documentType",
    "event",
    "startTime",
    "endTime",
    "detail",
    "ml_entities",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "SOF Event")]
    SofEvent,
    #[serde(rename = "SOF Report")]
    SofReport,
    #[serde(rename = "CP Detail")]
    CpDetail,
    #[serde(rename = "Additional Document")]
    AdditionalDocument,
}

impl DocumentType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SofEvent => "SOF Event",
            Self::SofReport => "SOF Report",
            Self::CpDetail => "CP Detail",
            Self::AdditionalDocument => "Additional Document",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat output row shared by every document type. String fields that do not
/// apply to a record are empty, never absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub id: String,
    #[serde(rename = "documentType")]
    pub document_type: DocumentType,
    #[serde(default)]
    pub event: String,
    #[serde(rename = "startTime", default)]
    pub start_time: String,
    #[serde(rename = "endTime", default)]
    pub end_time: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub ml_entities: Vec<EntityPair>,
}

impl UnifiedRecord {
    #[must_use]
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_type,
            event: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            detail: String::new(),
            ml_entities: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

pub struct SchemaAssembler {
    excerpt_chars: usize,
}

impl SchemaAssembler {
    #[must_use]
    pub fn new(config: &SchemaConfig) -> Self {
        Self {
            excerpt_chars: config.excerpt_chars,
        }
    }

    /// Event records for a report, or the single placeholder when the report
    /// yielded no events.
    pub fn event_records<F>(&self, events: &[Event], mut entities: F) -> Vec<UnifiedRecord>
    where
        F: FnMut(&Event) -> Vec<EntityPair>,
    {
        if events.is_empty() {
            return vec![Self::placeholder()];
        }

        events
            .iter()
            .map(|event| UnifiedRecord {
                event: event.event_name.clone(),
                start_time: event.start_time.clone(),
                end_time: event.end_time.clone(),
                detail: event.detail.clone(),
                ml_entities: entities(event),
                ..UnifiedRecord::new(DocumentType::SofEvent)
            })
            .collect()
    }

    pub fn candidate_records(&self, candidates: &[EnrichedCandidate]) -> Vec<UnifiedRecord> {
        if candidates.is_empty() {
            return vec![Self::placeholder()];
        }

        candidates
            .iter()
            .map(|candidate| UnifiedRecord {
                event: candidate.category.as_str().to_string(),
                start_time: candidate.start_time.clone(),
                end_time: candidate.end_time.clone(),
                detail: candidate.line.clone(),
                ml_entities: candidate.entities.clone(),
                ..UnifiedRecord::new(DocumentType::SofEvent)
            })
            .collect()
    }

    #[must_use]
    pub fn placeholder() -> UnifiedRecord {
        UnifiedRecord::new(DocumentType::SofReport).with_detail(NO_EVENTS_DETAIL)
    }

    /// Summary record for a charter party, built from its first line.
    #[must_use]
    pub fn cp_record(&self, first_line: Option<&str>) -> UnifiedRecord {
        self.summary(DocumentType::CpDetail, first_line, EMPTY_CP_DETAIL)
    }

    #[must_use]
    pub fn additional_record(&self, first_line: Option<&str>) -> UnifiedRecord {
        self.summary(DocumentType::AdditionalDocument, first_line, EMPTY_ADDITIONAL_DETAIL)
    }

    fn summary(
        &self,
        document_type: DocumentType,
        first_line: Option<&str>,
        empty: &str,
    ) -> UnifiedRecord {
        let detail = first_line.map_or_else(|| empty.to_string(), |line| self.excerpt(line));
        UnifiedRecord::new(document_type).with_detail(detail)
    }

    /// First `excerpt_chars` characters followed by `...`.
    #[must_use]
    pub fn excerpt(&self, line: &str) -> String {
        let mut excerpt: String = line.chars().take(self.excerpt_chars).collect();
        excerpt.push_str("...");
        excerpt
    }
}

impl Default for SchemaAssembler {
    fn default() -> Self {
        Self::new(&SchemaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::OperationCategory;
    use crate::events::EventParser;

    #[test]
    fn test_no_events_yields_single_placeholder() {
        let events = EventParser::default().parse(["Weather fine throughout", "Remarks: none"]);
        let records = SchemaAssembler::default().event_records(&events, |_| Vec::new());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document_type, DocumentType::SofReport);
        assert_eq!(records[0].detail, NO_EVENTS_DETAIL);
        assert_eq!(records[0].event, "");
        assert!(records[0].ml_entities.is_empty());
    }

    #[test]
    fn test_event_records() {
        let events = EventParser::default().parse(["1. Vessel arrived 14/05/23 MON 0800"]);
        let records = SchemaAssembler::default()
            .event_records(&events, |e| vec![(e.end_time.clone(), "TIME".to_string())]);

        let record = &records[0];
        assert_eq!(record.document_type, DocumentType::SofEvent);
        assert_eq!(record.event, "Vessel arrived");
        assert_eq!(record.start_time, "00:00");
        assert_eq!(record.end_time, "08:00");
        assert_eq!(record.detail, "1. Vessel arrived 14/05/23 MON 0800");
        assert_eq!(record.ml_entities, vec![("08:00".to_string(), "TIME".to_string())]);
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_candidate_records_use_category_as_event() {
        let candidates = vec![EnrichedCandidate {
            category: OperationCategory::Loading,
            start_time: "08:00".into(),
            end_time: "NULL".into(),
            line: "Loading commenced 08:00".into(),
            entities: vec![],
        }];
        let records = SchemaAssembler::default().candidate_records(&candidates);

        assert_eq!(records[0].event, "Loading");
        assert_eq!(records[0].detail, "Loading commenced 08:00");

        let empty = SchemaAssembler::default().candidate_records(&[]);
        assert_eq!(empty[0].document_type, DocumentType::SofReport);
    }

    #[test]
    fn test_cp_record() {
        let assembler = SchemaAssembler::new(&SchemaConfig { excerpt_chars: 10 });

        let record = assembler.cp_record(Some("Charter party dated 01/05/2023"));
        assert_eq!(record.document_type, DocumentType::CpDetail);
        assert_eq!(record.detail, "Charter pa...");

        let empty = assembler.cp_record(None);
        assert_eq!(empty.detail, EMPTY_CP_DETAIL);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let assembler = SchemaAssembler::new(&SchemaConfig { excerpt_chars: 3 });
        assert_eq!(assembler.excerpt("Ñandú port"), "Ñan...");
        assert_eq!(assembler.excerpt("ab"), "ab...");
    }

    #[test]
    fn test_additional_record() {
        let record = SchemaAssembler::default().additional_record(Some("Survey report"));
        assert_eq!(record.document_type, DocumentType::AdditionalDocument);
        assert_eq!(record.detail, "Survey report...");

        let empty = SchemaAssembler::default().additional_record(None);
        assert_eq!(empty.detail, EMPTY_ADDITIONAL_DETAIL);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = SchemaAssembler::placeholder();
        let b = SchemaAssembler::placeholder();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_serialized_keys() {
        let record = SchemaAssembler::default().cp_record(Some("Charter"));
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();

        for key in UNIFIED_KEYS {
            assert!(object.contains_key(*key), "missing {key}");
        }
        assert_eq!(object.len(), UNIFIED_KEYS.len());
        assert_eq!(json["documentType"], "CP Detail");
        assert_eq!(json["startTime"], "");
        assert_eq!(json["ml_entities"], serde_json::json!([]));
    }
}
