use findreplace_core::editor::Highlight;
use findreplace_core::find::OccurrenceInfo;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FindReport {
    pub info: String,
    pub current_index: usize,
    pub total: usize,
    pub occurrences: Vec<OccurrenceInfo>,
}

#[derive(Debug, Serialize)]
pub struct ReplaceReport {
    pub info: String,
    pub replaced: usize,
    pub markup: String,
}

#[derive(Debug, Serialize)]
pub struct PanelReport {
    pub find_info: Option<String>,
    pub replace_info: Option<String>,
    pub highlights: Vec<Highlight>,
}
