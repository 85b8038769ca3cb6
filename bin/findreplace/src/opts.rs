use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use findreplace_core::FindReplaceConfig;
use findreplace_core::config::{DEFAULT_FRAGMENT, DEFAULT_VIEWPORT_OFFSET};
use findreplace_core::editor::Editor;

#[derive(Debug, Clone, Parser)]
pub struct EngineOpts {
    /// Root XML fragment holding the document
    #[arg(long, global = true, env = "FINDREPLACE_FRAGMENT", default_value = DEFAULT_FRAGMENT)]
    pub fragment: String,

    /// Offset handed to the viewport when scrolling to an occurrence
    #[arg(
        long,
        global = true,
        env = "FINDREPLACE_VIEWPORT_OFFSET",
        default_value_t = DEFAULT_VIEWPORT_OFFSET
    )]
    pub viewport_offset: u32,
}

impl EngineOpts {
    pub fn config(&self) -> FindReplaceConfig {
        FindReplaceConfig {
            fragment: self.fragment.clone(),
            viewport_offset: self.viewport_offset,
        }
    }
}

/// Reads a markup file into a fresh editor.
pub fn load_document(config: &FindReplaceConfig, path: &Path) -> anyhow::Result<Editor> {
    let markup = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut editor = Editor::new(config);
    editor
        .load_markup(&markup)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded document");
    Ok(editor)
}
