use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, anyhow, bail};
use findreplace_core::editor::{Editor, get_doc_content};
use findreplace_core::find::{Field, Keystroke};
use findreplace_core::{FindReplace, FindReplaceConfig, FindReplacePanel};

use crate::model::PanelReport;
use crate::opts::load_document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Open(Option<String>),
    Find(String),
    With(String),
    Case(bool),
    Key(Field, Keystroke),
    Next,
    Prev,
    Replace,
    All,
    Show,
    Close,
    Quit,
}

/// Parses one input line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<PanelCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "open" => PanelCommand::Open((!rest.is_empty()).then(|| rest.to_string())),
        "find" => PanelCommand::Find(rest.to_string()),
        "with" => PanelCommand::With(rest.to_string()),
        "case" => match rest {
            "on" => PanelCommand::Case(true),
            "off" => PanelCommand::Case(false),
            other => bail!("expected `case on` or `case off`, got `{other}`"),
        },
        "key" => {
            let (field, key) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("expected `key <find|replace> <keystroke>`"))?;
            let field: Field = field
                .parse()
                .map_err(|_| anyhow!("unknown field `{field}`"))?;
            PanelCommand::Key(field, Keystroke::parse(key)?)
        }
        "next" => PanelCommand::Next,
        "prev" => PanelCommand::Prev,
        "replace" => PanelCommand::Replace,
        "all" => PanelCommand::All,
        "show" => PanelCommand::Show,
        "close" => PanelCommand::Close,
        "quit" | "exit" => PanelCommand::Quit,
        other => bail!("unknown command `{other}`"),
    };
    Ok(Some(command))
}

pub fn run(config: &FindReplaceConfig, file: &Path) -> anyhow::Result<()> {
    let mut editor = load_document(config, file)?;
    let mut panel = FindReplacePanel::new(FindReplace::new(config.clone()));
    panel.open(None);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(stdout, "error: {err}")?;
                continue;
            }
        };

        if command == PanelCommand::Quit {
            break;
        }
        if let Err(err) = apply(&mut panel, &mut editor, &config.fragment, &command, &mut stdout) {
            tracing::warn!(?command, "panel command failed: {err:#}");
            writeln!(stdout, "error: {err:#}")?;
            continue;
        }
        print_report(&panel, &editor, &mut stdout)?;
    }

    panel.close(&mut editor)?;
    Ok(())
}

fn apply(
    panel: &mut FindReplacePanel,
    editor: &mut Editor,
    fragment: &str,
    command: &PanelCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        PanelCommand::Open(selection) => panel.open(selection.as_deref()),
        PanelCommand::Find(text) => {
            panel.set_find_text(text.as_str());
            panel.find(editor, 1)?;
        }
        PanelCommand::With(text) => panel.set_replace_text(text.as_str()),
        PanelCommand::Case(match_case) => panel.set_match_case(*match_case),
        PanelCommand::Key(field, key) => panel.handle_keystroke(editor, *field, *key)?,
        PanelCommand::Next => {
            panel.find(editor, 1)?;
        }
        PanelCommand::Prev => {
            panel.find(editor, -1)?;
        }
        PanelCommand::Replace => {
            panel.replace(editor, 0)?;
        }
        PanelCommand::All => {
            panel.replace_all(editor)?;
        }
        PanelCommand::Show => {
            writeln!(out, "{}", get_doc_content(editor.doc(), fragment))?;
            writeln!(out, "{}", editor.to_markup()?)?;
        }
        PanelCommand::Close => panel.close(editor)?,
        PanelCommand::Quit => {}
    }
    Ok(())
}

fn print_report(panel: &FindReplacePanel, editor: &Editor, out: &mut impl Write) -> anyhow::Result<()> {
    let report = PanelReport {
        find_info: panel.find_info().map(str::to_string),
        replace_info: panel.replace_info().map(str::to_string),
        highlights: editor.read(|txn| editor.markers().highlights(txn))?,
    };

    if let Some(info) = &report.find_info {
        writeln!(out, "find: {info}")?;
    }
    if let Some(info) = &report.replace_info {
        writeln!(out, "replace: {info}")?;
    }
    for highlight in &report.highlights {
        writeln!(
            out,
            "  [{}] {:?}:{}..{}",
            highlight.class, highlight.range.start.path, highlight.range.start.offset, highlight.range.end.offset,
        )?;
    }
    Ok(())
}
