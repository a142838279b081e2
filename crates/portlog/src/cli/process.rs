use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use portlog_core::export::{write_csv, write_json};
use portlog_core::{
    DebugSink, DocumentSet, EventSource, Pipeline, PipelineConfig, SingleTimePolicy,
};
use uuid::Uuid;

use super::OutputFormat;

pub struct ProcessArgs {
    pub sof: PathBuf,
    pub cp: Option<PathBuf>,
    pub additional: Option<PathBuf>,
    pub format: OutputFormat,
    pub dump_dir: Option<PathBuf>,
    pub classify: bool,
    pub no_chain: bool,
    pub entities: bool,
}

fn apply_flags(mut config: PipelineConfig, args: &ProcessArgs) -> PipelineConfig {
    if args.classify {
        config.enrichment.event_source = EventSource::Classified;
    }
    if args.no_chain {
        config.parser.single_time_policy = SingleTimePolicy::Unchained;
    }
    if args.entities {
        config.enrichment.tag_entities = true;
    }
    config
}

pub fn run(config: PipelineConfig, args: ProcessArgs) -> Result<()> {
    let config = apply_flags(config, &args);
    let pipeline = Pipeline::new(config);

    let mut set = DocumentSet::new(&args.sof);
    set.cp = args.cp;
    set.additional = args.additional;

    let out = pipeline.process(&set)?;
    for doc in &out.diagnostics {
        tracing::debug!(
            role = ?doc.role,
            file = %doc.file_name,
            method = ?doc.method,
            pages = doc.page_count,
            lines = doc.extracted_lines,
            normalized = ?doc.normalized_lines,
            "Document diagnostics"
        );
    }

    if let Some(dir) = &args.dump_dir {
        let request_id = Uuid::new_v4().to_string();
        tracing::info!(request_id = %request_id, dir = %dir.display(), "Writing dump");
        if let Some(written) = DebugSink::new(dir).dump(&request_id, &out.records) {
            eprintln!("Dump written to {}", written.display());
        }
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        OutputFormat::Json => {
            write_json(&mut handle, &out.records)?;
            writeln!(handle)?;
        }
        OutputFormat::Csv => write_csv(&mut handle, &out.records)?,
    }

    eprintln!(
        "{} records, {} events from {} document(s) in {} ms",
        out.records.len(),
        out.events.len(),
        out.diagnostics.len(),
        out.duration_ms
    );
    Ok(())
}
