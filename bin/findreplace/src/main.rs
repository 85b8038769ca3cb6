pub mod cli;
pub mod commands;
pub mod interactive;
pub mod model;
pub mod opts;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.engine.config();

    match cli.subcommand {
        Commands::Find {
            file,
            text,
            match_case,
            json,
        } => commands::find(&config, &file, &text, match_case, json),
        Commands::Replace {
            file,
            text,
            with,
            match_case,
            all,
            output,
            json,
        } => commands::replace(
            &config,
            &file,
            commands::ReplaceArgs {
                text,
                with,
                match_case,
                all,
                output,
                json,
            },
        ),
        Commands::Interactive { file } => interactive::run(&config, &file),
    }
}
