pub mod config;
pub mod enrich;
pub mod error;
pub mod events;
pub mod export;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod schema;

pub use config::{EnrichmentConfig, NormalizerConfig, ParserConfig, PipelineConfig, SchemaConfig};
pub use enrich::{
    EnrichedCandidate, EntityEnricher, EntityLabel, EntityPair, EntitySpan, EntityTagger,
    OperationCategory, OperationTaxonomy, RuleBasedTagger,
};
pub use error::{Error, Result};
pub use events::{Event, EventParser, ParseContext, SingleTimePolicy};
pub use export::DebugSink;
pub use extract::{
    DocumentExtractor, DocumentFormat, ExtractedLine, ExtractionMethod, ExtractionResult,
    TextExtractor,
};
pub use normalize::{LineNormalizer, MergeState};
pub use pipeline::{DocumentRole, DocumentSet, EventSource, Pipeline, ProcessedDocuments};
pub use schema::{DocumentType, SchemaAssembler, UnifiedRecord};
