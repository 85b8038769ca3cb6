use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::opts::EngineOpts;

#[derive(Parser, Debug)]
#[clap(
    name = "findreplace",
    version,
    about = "Find and replace text inside a structured document",
    rename_all = "kebab-case",
    rename_all_env = "screaming-snake"
)]
pub struct Cli {
    #[clap(flatten)]
    pub engine: EngineOpts,

    /// Subcommands
    #[clap(subcommand)]
    pub subcommand: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Locate every occurrence of TEXT in a markup document
    Find {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        text: String,

        /// Compare case exactly
        #[arg(long)]
        match_case: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the first occurrence of TEXT, or all of them with --all
    Replace {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        text: String,

        with: String,

        #[arg(long)]
        match_case: bool,

        #[arg(long)]
        all: bool,

        /// Where to write the resulting markup (stdout when omitted)
        #[arg(long, short, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
    /// Drive the find/replace panel from stdin, one command per line
    Interactive {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}
