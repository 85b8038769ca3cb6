use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use findreplace_core::find::status;
use findreplace_core::{ExecuteOptions, FindReplace, FindReplaceConfig, FindResult, Outcome, SearchSession};

use crate::model::{FindReport, ReplaceReport};
use crate::opts::load_document;

pub struct ReplaceArgs {
    pub text: String,
    pub with: String,
    pub match_case: bool,
    pub all: bool,
    pub output: Option<PathBuf>,
    pub json: bool,
}

pub fn find(
    config: &FindReplaceConfig,
    file: &Path,
    text: &str,
    match_case: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut editor = load_document(config, file)?;
    let command = FindReplace::new(config.clone());
    let mut session = SearchSession::new();

    let options = ExecuteOptions::find(text, 1).match_case(match_case);
    let result = match command.execute(&mut editor, &mut session, options)? {
        Some(Outcome::Found(result)) => result,
        _ => empty_result(),
    };

    let report = FindReport {
        info: status::find_info(result.current_index, result.total),
        current_index: result.current_index,
        total: result.total,
        occurrences: result.occurrences,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.info);
    for occurrence in &report.occurrences {
        let range = &occurrence.range;
        println!(
            "  #{} {:?}:{}..{:?}:{} {:?}",
            occurrence.order + 1,
            range.start.path,
            range.start.offset,
            range.end.path,
            range.end.offset,
            occurrence.text,
        );
    }
    Ok(())
}

pub fn replace(config: &FindReplaceConfig, file: &Path, args: ReplaceArgs) -> anyhow::Result<()> {
    let mut editor = load_document(config, file)?;
    let command = FindReplace::new(config.clone());
    let mut session = SearchSession::new();

    let options = ExecuteOptions::find(args.text.as_str(), 1)
        .match_case(args.match_case)
        .replace_with(args.with.as_str());

    let replaced = if args.all {
        match command.execute(&mut editor, &mut session, options.all())? {
            Some(outcome) => outcome.total(),
            None => 0,
        }
    } else {
        // The first request only locates; the second replaces what it found.
        let located = command.execute(&mut editor, &mut session, options.clone())?;
        let before = located.map(|outcome| outcome.total()).unwrap_or_default();
        if before > 0 {
            command.execute(&mut editor, &mut session, options)?;
            1
        } else {
            0
        }
    };

    let report = ReplaceReport {
        info: status::replaced_info(replaced).unwrap_or_else(|| status::NOT_FOUND.to_string()),
        replaced,
        markup: editor.to_markup()?,
    };
    tracing::info!(replaced, file = %file.display(), "replace finished");

    if let Some(output) = &args.output {
        fs::write(output, &report.markup)
            .with_context(|| format!("failed to write {}", output.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("{}", report.info);
        if args.output.is_none() {
            println!("{}", report.markup);
        }
    }
    Ok(())
}

fn empty_result() -> FindResult {
    FindResult {
        current: None,
        occurrences: Vec::new(),
        current_index: 0,
        total: 0,
    }
}
