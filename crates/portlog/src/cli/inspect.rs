use std::io::Write;
use std::path::Path;

use anyhow::Result;
use portlog_core::{Pipeline, PipelineConfig};

pub fn run_lines(config: PipelineConfig, file: &Path) -> Result<()> {
    let lines = Pipeline::new(config).normalized_lines(file)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for line in &lines {
        writeln!(handle, "{line}")?;
    }
    Ok(())
}

pub fn run_events(config: PipelineConfig, file: &Path) -> Result<()> {
    let events = Pipeline::new(config).parse_events(file)?;
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
