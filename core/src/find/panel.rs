//! 無畫面的尋找/取代面板
//!
//! 包含兩個輸入欄位、大小寫切換與提示文字，並以下拉面板的方式驅動指令。

use std::str::FromStr;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

use super::command::FindReplace;
use super::request::{ExecuteOptions, FindResult, Outcome};
use super::session::SearchSession;
use super::status;
use crate::editor::Editor;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Find,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Keystroke {
    #[strum(serialize = "enter")]
    Enter,
    #[strum(serialize = "shift+enter")]
    ShiftEnter,
    #[strum(serialize = "ctrl+enter")]
    CtrlEnter,
    #[strum(serialize = "escape", serialize = "esc")]
    Escape,
}

impl Keystroke {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
        Keystroke::from_str(&normalized).map_err(|_| Error::UnknownKeystroke(raw.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct FindReplacePanel {
    command: FindReplace,
    session: SearchSession,
    find_text: String,
    replace_text: String,
    match_case: bool,
    find_info: Option<String>,
    replace_info: Option<String>,
    open: bool,
}

impl FindReplacePanel {
    pub fn new(command: FindReplace) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn find_text(&self) -> &str {
        &self.find_text
    }

    pub fn replace_text(&self) -> &str {
        &self.replace_text
    }

    pub fn match_case(&self) -> bool {
        self.match_case
    }

    pub fn find_info(&self) -> Option<&str> {
        self.find_info.as_deref()
    }

    pub fn replace_info(&self) -> Option<&str> {
        self.replace_info.as_deref()
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn set_find_text(&mut self, text: impl Into<String>) {
        self.find_text = text.into();
    }

    pub fn set_replace_text(&mut self, text: impl Into<String>) {
        self.replace_text = text.into();
    }

    pub fn set_match_case(&mut self, match_case: bool) {
        self.match_case = match_case;
    }

    /// 開啟面板
    ///
    /// # Arguments
    /// * `selected_text` - 目前選取的文字，非空時成為尋找字詞
    pub fn open(&mut self, selected_text: Option<&str>) {
        self.open = true;
        if let Some(selected) = selected_text.filter(|text| !text.is_empty()) {
            self.find_text = selected.to_string();
        }
    }

    /// 關閉面板，清除所有高亮與提示文字
    pub fn close(&mut self, editor: &mut Editor) -> Result<()> {
        self.open = false;
        self.reset(editor)
    }

    pub fn reset(&mut self, editor: &mut Editor) -> Result<()> {
        self.find_info = None;
        self.replace_info = None;
        self.command.reset(editor, &mut self.session)
    }

    /// 依 `increment` 在匹配之間移動
    ///
    /// 尋找欄位為空時改為重設面板。
    pub fn find(&mut self, editor: &mut Editor, increment: i64) -> Result<Option<FindResult>> {
        if self.find_text.is_empty() {
            self.reset(editor)?;
            return Ok(None);
        }

        let options =
            ExecuteOptions::find(self.find_text.clone(), increment).match_case(self.match_case);
        match self.command.execute(editor, &mut self.session, options)? {
            Some(Outcome::Found(result)) => {
                self.update_find_info(result.current_index, result.total);
                Ok(Some(result))
            }
            _ => Ok(None),
        }
    }

    /// 取代目前的匹配（或先找到第一個），再移動 `increment` 步
    pub fn replace(&mut self, editor: &mut Editor, increment: i64) -> Result<Option<Outcome>> {
        let options = self.options(increment);
        let outcome = self.command.execute(editor, &mut self.session, options)?;
        if let Some(outcome) = &outcome {
            self.update_info(outcome);
        }
        Ok(outcome)
    }

    pub fn replace_all(&mut self, editor: &mut Editor) -> Result<Option<Outcome>> {
        let mut options = self.options(1);
        options.replace_all = true;
        let outcome = self.command.execute(editor, &mut self.session, options)?;
        if let Some(outcome) = &outcome {
            self.update_info(outcome);
        }
        Ok(outcome)
    }

    /// 分派在 `field` 中輸入的按鍵
    ///
    /// | 欄位 | 按鍵 | 動作 |
    /// |---|---|---|
    /// | 任一 | Escape | 關閉 |
    /// | 尋找 | Enter / Shift+Enter | 下一個 / 上一個 |
    /// | 取代 | Enter / Shift+Enter | 取代後停留 / 取代後往回 |
    /// | 取代 | Ctrl+Enter | 全部取代 |
    ///
    /// 沒有綁定的組合會被忽略。
    pub fn handle_keystroke(&mut self, editor: &mut Editor, field: Field, key: Keystroke) -> Result<()> {
        match (field, key) {
            (_, Keystroke::Escape) => self.close(editor)?,
            (Field::Find, Keystroke::Enter) => {
                self.find(editor, 1)?;
            }
            (Field::Find, Keystroke::ShiftEnter) => {
                self.find(editor, -1)?;
            }
            (Field::Replace, Keystroke::Enter) => {
                self.replace(editor, 0)?;
            }
            (Field::Replace, Keystroke::ShiftEnter) => {
                self.replace(editor, -1)?;
            }
            (Field::Replace, Keystroke::CtrlEnter) => {
                self.replace_all(editor)?;
            }
            (Field::Find, Keystroke::CtrlEnter) => {
                tracing::debug!(field = %field, key = %key, "keystroke not bound");
            }
        }
        Ok(())
    }

    fn options(&self, increment: i64) -> ExecuteOptions {
        ExecuteOptions::find(self.find_text.clone(), increment)
            .match_case(self.match_case)
            .replace_with(self.replace_text.clone())
    }

    fn update_info(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Found(result) => self.update_find_info(result.current_index, result.total),
            Outcome::ReplacedAll { total } => self.update_replace_all_info(*total),
        }
    }

    fn update_find_info(&mut self, current_index: usize, total: usize) {
        self.replace_info = None;
        self.find_info = Some(status::find_info(current_index, total));
    }

    fn update_replace_all_info(&mut self, total: usize) {
        self.replace_info = None;
        self.find_info = Some(status::NOT_FOUND.to_string());
        if let Some(info) = status::replaced_info(total) {
            self.replace_info = Some(info);
            self.find_info = None;
        }
    }
}
