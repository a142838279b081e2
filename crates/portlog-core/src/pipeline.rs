use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::enrich::{EntityEnricher, EntityTagger, RuleBasedTagger};
use crate::error::{Error, Result};
use crate::events::{Event, EventParser};
use crate::extract::{
    DocumentExtractor, DocumentFormat, ExtractionMethod, ExtractionResult, TextExtractor,
};
use crate::normalize::LineNormalizer;
use crate::schema::{SchemaAssembler, UnifiedRecord};

/// Which stream feeds the report's event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Events from the line parser, optionally tagged with entities.
    #[default]
    Parsed,
    /// Keyword-classified candidate lines from the enricher.
    Classified,
}

impl EventSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Classified => "classified",
        }
    }
}

impl FromStr for EventSource {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parsed" | "parser" => Ok(Self::Parsed),
            "classified" | "classifier" | "enriched" => Ok(Self::Classified),
            other => Err(Error::Config(format!("unknown event source: {other}"))),
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    Sof,
    Cp,
    Additional,
}

impl DocumentRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sof => "sof",
            Self::Cp => "cp",
            Self::Additional => "additional",
        }
    }
}

/// The documents submitted together for one processing run.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    pub sof: PathBuf,
    pub cp: Option<PathBuf>,
    pub additional: Option<PathBuf>,
}

impl DocumentSet {
    #[must_use]
    pub fn new(sof: impl Into<PathBuf>) -> Self {
        Self {
            sof: sof.into(),
            cp: None,
            additional: None,
        }
    }

    #[must_use]
    pub fn with_cp(mut self, cp: impl Into<PathBuf>) -> Self {
        self.cp = Some(cp.into());
        self
    }

    #[must_use]
    pub fn with_additional(mut self, additional: impl Into<PathBuf>) -> Self {
        self.additional = Some(additional.into());
        self
    }

    pub fn documents(&self) -> impl Iterator<Item = (DocumentRole, &Path)> {
        std::iter::once((DocumentRole::Sof, self.sof.as_path()))
            .chain(self.cp.as_deref().map(|p| (DocumentRole::Cp, p)))
            .chain(self.additional.as_deref().map(|p| (DocumentRole::Additional, p)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDiagnostics {
    pub role: DocumentRole,
    pub file_name: String,
    pub format: DocumentFormat,
    pub method: ExtractionMethod,
    pub page_count: usize,
    pub extracted_lines: usize,
    /// Lines after normalization; only reports are normalized.
    pub normalized_lines: Option<usize>,
    pub processed_at: DateTime<Utc>,
}

impl DocumentDiagnostics {
    fn new(role: DocumentRole, extraction: &ExtractionResult) -> Self {
        Self {
            role,
            file_name: extraction.file_name.clone(),
            format: extraction.format,
            method: extraction.method,
            page_count: extraction.page_count,
            extracted_lines: extraction.lines.len(),
            normalized_lines: None,
            processed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocuments {
    pub records: Vec<UnifiedRecord>,
    pub events: Vec<Event>,
    pub diagnostics: Vec<DocumentDiagnostics>,
    pub duration_ms: u64,
}

pub struct Pipeline {
    config: PipelineConfig,
    extractor: Box<dyn TextExtractor>,
    tagger: Arc<dyn EntityTagger>,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            extractor: Box::new(DocumentExtractor::default()),
            tagger: Arc::new(RuleBasedTagger::new()),
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_tagger(mut self, tagger: Arc<dyn EntityTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract and normalize a single report.
    pub fn normalized_lines(&self, path: &Path) -> Result<Vec<String>> {
        let extraction = self.extractor.extract_file(path)?;
        Ok(self.normalize(&extraction))
    }

    /// Extract, normalize and parse a single report.
    pub fn parse_events(&self, path: &Path) -> Result<Vec<Event>> {
        let lines = self.normalized_lines(path)?;
        Ok(EventParser::new(&self.config.parser).parse(&lines))
    }

    fn normalize(&self, extraction: &ExtractionResult) -> Vec<String> {
        LineNormalizer::normalize(&self.config.normalizer, extraction.texts())
    }

    pub fn process(&self, documents: &DocumentSet) -> Result<ProcessedDocuments> {
        let started = std::time::Instant::now();

        // Reject the whole set before touching any file contents.
        let formats = documents
            .documents()
            .map(|(role, path)| Ok((role, path, DocumentFormat::from_path(path)?)))
            .collect::<Result<Vec<_>>>()?;

        let assembler = SchemaAssembler::new(&self.config.schema);
        let mut records = Vec::new();
        let mut events = Vec::new();
        let mut diagnostics = Vec::new();

        for (role, path, format) in formats {
            let extraction = self.extractor.extract(path, format)?;
            let mut diag = DocumentDiagnostics::new(role, &extraction);

            match role {
                DocumentRole::Sof => {
                    let lines = self.normalize(&extraction);
                    diag.normalized_lines = Some(lines.len());
                    events = EventParser::new(&self.config.parser).parse(&lines);
                    records.extend(self.report_records(&assembler, &lines, &events));
                }
                DocumentRole::Cp => {
                    records.push(assembler.cp_record(extraction.texts().next()));
                }
                DocumentRole::Additional => {
                    records.push(assembler.additional_record(extraction.texts().next()));
                }
            }

            tracing::info!(
                role = role.as_str(),
                file = %diag.file_name,
                method = diag.method.as_str(),
                lines = diag.extracted_lines,
                "Document processed"
            );
            diagnostics.push(diag);
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            records = records.len(),
            events = events.len(),
            duration_ms,
            "Document set processed"
        );

        Ok(ProcessedDocuments {
            records,
            events,
            diagnostics,
            duration_ms,
        })
    }

    fn report_records(
        &self,
        assembler: &SchemaAssembler,
        lines: &[String],
        events: &[Event],
    ) -> Vec<UnifiedRecord> {
        let enrichment = &self.config.enrichment;
        let enricher = EntityEnricher::new(Arc::clone(&self.tagger));

        match enrichment.event_source {
            EventSource::Classified => assembler.candidate_records(&enricher.enrich(lines)),
            EventSource::Parsed if enrichment.tag_entities => {
                assembler.event_records(events, |event| enricher.annotate(&event.detail))
            }
            EventSource::Parsed => assembler.event_records(events, |_| Vec::new()),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::enrich::{EntityLabel, EntitySpan};
    use crate::extract::ExtractedLine;
    use crate::schema::DocumentType;

    /// Serves canned lines keyed by file name.
    struct CannedExtractor(HashMap<String, Vec<&'static str>>);

    impl CannedExtractor {
        fn new(docs: &[(&str, Vec<&'static str>)]) -> Self {
            Self(docs.iter().map(|(n, l)| ((*n).to_string(), l.clone())).collect())
        }
    }

    impl TextExtractor for CannedExtractor {
        fn extract(&self, path: &Path, format: DocumentFormat) -> Result<ExtractionResult> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let lines = self
                .0
                .get(&name)
                .ok_or_else(|| Error::extraction(&name, "no such document"))?;

            Ok(ExtractionResult {
                file_name: name,
                format,
                method: ExtractionMethod::Direct,
                page_count: 1,
                lines: lines
                    .iter()
                    .enumerate()
                    .map(|(index, text)| ExtractedLine {
                        text: (*text).to_string(),
                        page: 1,
                        index,
                    })
                    .collect(),
            })
        }
    }

    fn sof_lines() -> Vec<&'static str> {
        vec![
            "STATEMENT OF FACTS",
            "1. Vessel arrived 14/05/23 MON 0800",
            "at outer anchorage",
            "2. NOR tendered 0900",
            "DAILY WORKING HOURS",
            "0800-1230 Loading commenced",
        ]
    }

    #[test]
    fn test_process_report_only() {
        let pipeline = Pipeline::default()
            .with_extractor(Box::new(CannedExtractor::new(&[("sof.pdf", sof_lines())])));

        let out = pipeline.process(&DocumentSet::new("/uploads/sof.pdf")).unwrap();

        let names: Vec<&str> = out.events.iter().map(|e| e.event_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Vessel arrived at outer anchorage", "NOR tendered", "Loading commenced"]
        );
        assert_eq!(out.records.len(), 3);
        assert!(out.records.iter().all(|r| r.document_type == DocumentType::SofEvent));
        assert!(out.records.iter().all(|r| r.ml_entities.is_empty()));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].extracted_lines, 6);
        assert_eq!(out.diagnostics[0].normalized_lines, Some(5));
    }

    #[test]
    fn test_process_full_set() {
        let pipeline = Pipeline::default().with_extractor(Box::new(CannedExtractor::new(&[
            ("sof.txt", vec!["Weather fine throughout"]),
            ("cp.docx", vec!["Charter party dated 01/05/2023", "Clause 1"]),
            ("extra.pdf", vec![]),
        ])));

        let set = DocumentSet::new("sof.txt")
            .with_cp("cp.docx")
            .with_additional("extra.pdf");
        let out = pipeline.process(&set).unwrap();

        let types: Vec<DocumentType> = out.records.iter().map(|r| r.document_type).collect();
        assert_eq!(
            types,
            vec![
                DocumentType::SofReport,
                DocumentType::CpDetail,
                DocumentType::AdditionalDocument
            ]
        );
        assert_eq!(out.records[1].detail, "Charter party dated 01/05/2023...");
        assert!(out.events.is_empty());
        assert_eq!(out.diagnostics.len(), 3);
    }

    #[test]
    fn test_unsupported_format_fails_before_extraction() {
        let pipeline = Pipeline::default()
            .with_extractor(Box::new(CannedExtractor::new(&[("sof.pdf", sof_lines())])));

        let set = DocumentSet::new("sof.pdf").with_cp("cp.xlsx");
        let err = pipeline.process(&set).unwrap_err();

        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert_eq!(err.file_name(), Some("cp.xlsx"));
    }

    #[test]
    fn test_extraction_failure_names_the_file() {
        let pipeline = Pipeline::default()
            .with_extractor(Box::new(CannedExtractor::new(&[("sof.pdf", sof_lines())])));

        let err = pipeline
            .process(&DocumentSet::new("sof.pdf").with_cp("missing.docx"))
            .unwrap_err();
        assert_eq!(err.file_name(), Some("missing.docx"));
    }

    #[test]
    fn test_classified_event_source() {
        let mut config = PipelineConfig::default();
        config.enrichment.event_source = EventSource::Classified;
        let pipeline = Pipeline::new(config).with_extractor(Box::new(CannedExtractor::new(&[(
            "sof.txt",
            vec!["Loading commenced", "Weather fine", "Pilot on board 10:30"],
        )])));

        let out = pipeline.process(&DocumentSet::new("sof.txt")).unwrap();

        let events: Vec<&str> = out.records.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(events, vec!["Loading", "Other"]);
        assert_eq!(out.records[1].start_time, "10:30");
    }

    #[test]
    fn test_entity_tagging_of_parsed_events() {
        let mut config = PipelineConfig::default();
        config.enrichment.tag_entities = true;
        let pipeline = Pipeline::new(config).with_extractor(Box::new(CannedExtractor::new(&[(
            "sof.txt",
            vec!["1. MV Ocean Star arrived 14/05/23 0800"],
        )])));

        let out = pipeline.process(&DocumentSet::new("sof.txt")).unwrap();
        let labels: Vec<&str> = out.records[0]
            .ml_entities
            .iter()
            .map(|(_, label)| label.as_str())
            .collect();

        assert_eq!(labels, vec!["VESSEL", "DATE", "TIME"]);
    }

    /// Tags every text as a single GPE entity.
    struct PortTagger;

    impl EntityTagger for PortTagger {
        fn tag(&self, text: &str) -> Vec<EntitySpan> {
            vec![EntitySpan {
                text: "Santos".into(),
                label: EntityLabel::Gpe,
                start: 0,
                end: text.len(),
            }]
        }
    }

    #[test]
    fn test_custom_tagger_is_used() {
        let mut config = PipelineConfig::default();
        config.enrichment.tag_entities = true;
        let pipeline = Pipeline::new(config)
            .with_tagger(Arc::new(PortTagger))
            .with_extractor(Box::new(CannedExtractor::new(&[(
                "sof.txt",
                vec!["1. Vessel arrived 14/05/23 0800"],
            )])));
        assert!(pipeline.config().enrichment.tag_entities);

        let out = pipeline.process(&DocumentSet::new("sof.txt")).unwrap();

        assert_eq!(
            out.records[0].ml_entities,
            vec![("Santos".to_string(), "GPE".to_string())]
        );
    }

    #[test]
    fn test_event_source_from_str() {
        assert_eq!("Parsed".parse::<EventSource>().unwrap(), EventSource::Parsed);
        assert_eq!("classified".parse::<EventSource>().unwrap(), EventSource::Classified);
        assert!("random".parse::<EventSource>().is_err());
    }

    #[test]
    fn test_document_set_order() {
        let set = DocumentSet::new("a.pdf").with_additional("c.txt").with_cp("b.docx");
        let roles: Vec<DocumentRole> = set.documents().map(|(r, _)| r).collect();
        assert_eq!(roles, vec![DocumentRole::Sof, DocumentRole::Cp, DocumentRole::Additional]);
    }
}
