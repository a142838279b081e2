mod cli;

use anyhow::Result;
use clap::Parser;

use cli::process::ProcessArgs;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    dispatch(cli.command, config)
}

fn dispatch(command: Commands, config: portlog_core::PipelineConfig) -> Result<()> {
    match command {
        Commands::Process {
            sof,
            cp,
            additional,
            format,
            dump_dir,
            classify,
            no_chain,
            entities,
        } => cli::process::run(
            config,
            ProcessArgs {
                sof,
                cp,
                additional,
                format,
                dump_dir,
                classify,
                no_chain,
                entities,
            },
        ),
        Commands::Lines { file } => cli::inspect::run_lines(config, &file),
        Commands::Events { file } => cli::inspect::run_events(config, &file),
    }
}
