use std::sync::Arc;

use portlog_core::{DebugSink, Pipeline, PipelineConfig};

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<ServerConfig>,
    pub dump: Option<DebugSink>,
}

impl AppState {
    /// Build the shared pipeline, loading the pipeline configuration file
    /// named by the server config when there is one.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let pipeline_config = match &config.pipeline_config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        }
        .with_env_overrides()?;

        Ok(Self::with_pipeline(config, Pipeline::new(pipeline_config)))
    }

    pub fn with_pipeline(config: ServerConfig, pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            dump: config.dump_dir.clone().map(DebugSink::new),
            config: Arc::new(config),
        }
    }
}
