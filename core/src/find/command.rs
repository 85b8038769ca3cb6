//! 尋找與取代指令
//!
//! 所有狀態都放在呼叫端的 [`SearchSession`]，指令本身只帶設定，
//! 同一個指令可以服務任意數量的 session。

use yrs::ReadTxn;

use super::occurrences::build_index;
use super::request::{ExecuteOptions, FindResult, Outcome, Request};
use super::session::{SearchKey, SearchSession};
use crate::config::FindReplaceConfig;
use crate::editor::{Editor, replace_range_content};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct FindReplace {
    config: FindReplaceConfig,
}

impl FindReplace {
    pub fn new(config: FindReplaceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FindReplaceConfig {
        &self.config
    }

    /// 執行 `options` 要求的操作
    ///
    /// # Arguments
    /// * `editor` - 要搜尋的編輯器
    /// * `session` - 呼叫端持有的搜尋狀態
    /// * `options` - 尋找字詞、大小寫、步數與取代設定
    ///
    /// # Returns
    /// 尋找字詞為空時回傳 `Ok(None)`，不會動到任何東西
    ///
    /// # Example
    /// ```rust
    /// use findreplace_core::editor::Editor;
    /// use findreplace_core::{ExecuteOptions, FindReplace, FindReplaceConfig, SearchSession};
    ///
    /// let config = FindReplaceConfig::default();
    /// let mut editor = Editor::new(&config);
    /// editor.load_markup("<paragraph>a b a</paragraph>").unwrap();
    ///
    /// let command = FindReplace::new(config);
    /// let mut session = SearchSession::new();
    /// let outcome = command
    ///     .execute(&mut editor, &mut session, ExecuteOptions::find("a", 1))
    ///     .unwrap();
    /// assert_eq!(outcome.map(|o| o.total()), Some(2));
    /// ```
    pub fn execute(
        &self,
        editor: &mut Editor,
        session: &mut SearchSession,
        options: ExecuteOptions,
    ) -> Result<Option<Outcome>> {
        match options.into_request() {
            Some(request) => self.run(editor, session, request).map(Some),
            None => Ok(None),
        }
    }

    /// 執行單一請求
    ///
    /// 遇到失效的匹配範圍時中止請求並丟棄 session，下一次尋找會重建索引。
    pub fn run(&self, editor: &mut Editor, session: &mut SearchSession, request: Request) -> Result<Outcome> {
        let same_search = session.submit(request.key());

        let result = match &request {
            Request::Find(find) => self
                .find(editor, session, &find.key, find.increment, same_search)
                .map(Outcome::Found),
            Request::ReplaceOne(replace) => self
                .replace_one(
                    editor,
                    session,
                    &replace.key,
                    &replace.replacement,
                    replace.increment,
                    same_search,
                )
                .map(Outcome::Found),
            Request::ReplaceAll(replace) => self
                .replace_all(editor, session, &replace.key, &replace.replacement)
                .map(|total| Outcome::ReplacedAll { total }),
        };

        if let Err(Error::StaleRange) = result {
            tracing::warn!(term = %request.key().term, "stale occurrence range, discarding search");
            self.reset(editor, session)?;
        }
        result
    }

    /// 移除所有搜尋標記並清除索引，可重複呼叫
    pub fn reset(&self, editor: &mut Editor, session: &mut SearchSession) -> Result<()> {
        editor.change(|writer| {
            session.discard(&mut writer.markers);
            Ok(())
        })
    }

    fn find(
        &self,
        editor: &mut Editor,
        session: &mut SearchSession,
        key: &SearchKey,
        increment: i64,
        same_search: bool,
    ) -> Result<FindResult> {
        let result = editor.change(|writer| {
            let navigated = if same_search && session.can_navigate(key) {
                session.index_mut().and_then(|index| index.advance(increment))
            } else {
                None
            };

            match navigated {
                Some(cursor) => tracing::debug!(term = %key.term, cursor, "navigated occurrences"),
                None => {
                    session.discard(&mut writer.markers);
                    let index = build_index(writer, key.clone())?;
                    tracing::debug!(term = %key.term, total = index.len(), "rebuilt occurrence index");
                    session.set_index(index);
                }
            }

            let current = session
                .index()
                .and_then(|index| index.current())
                .map(|occurrence| occurrence.range.clone());
            session.set_current_marker(&mut writer.markers, current);

            snapshot(session, &writer.txn)
        })?;

        if let Some(current) = &result.current {
            editor.scroll_to(&current.range, self.config.viewport_offset);
        }
        Ok(result)
    }

    /// 取代游標下的匹配，再依 `increment` 移動
    ///
    /// 只取代同一搜尋先前已找到的匹配，否則只做尋找。
    fn replace_one(
        &self,
        editor: &mut Editor,
        session: &mut SearchSession,
        key: &SearchKey,
        replacement: &str,
        increment: i64,
        same_search: bool,
    ) -> Result<FindResult> {
        let has_current = session
            .index()
            .is_some_and(|index| index.key() == key && index.current().is_some());
        if !(same_search && has_current) {
            return self.find(editor, session, key, 1, same_search);
        }

        editor.change(|writer| {
            let Some(index) = session.index_mut() else {
                return Ok(());
            };
            let Some(occurrence) = index.current() else {
                return Ok(());
            };
            replace_range_content(&mut writer.txn, &occurrence.range, replacement)?;

            if let Some(replaced) = index.remove_current() {
                writer.markers.remove_tag(replaced.tag);
                tracing::debug!(label = %replaced.label, replacement, "replaced occurrence");
            }
            session.set_current_marker(&mut writer.markers, None);
            Ok(())
        })?;

        // 清單少了一個，等於已經往前走了一步
        let increment = if increment > 0 { increment - 1 } else { increment };
        self.find(editor, session, key, increment, same_search)
    }

    /// 取代整份文檔中 `key` 的所有匹配
    ///
    /// 不論游標指向哪裡，都先重建索引。
    fn replace_all(
        &self,
        editor: &mut Editor,
        session: &mut SearchSession,
        key: &SearchKey,
        replacement: &str,
    ) -> Result<usize> {
        self.reset(editor, session)?;
        self.find(editor, session, key, 1, false)?;

        let total = editor.change(|writer| {
            let mut total = 0;
            if let Some(index) = session.index() {
                for occurrence in index.occurrences() {
                    replace_range_content(&mut writer.txn, &occurrence.range, replacement)?;
                    total += 1;
                }
            }
            session.discard(&mut writer.markers);
            Ok(total)
        })?;

        tracing::info!(term = %key.term, total, "replaced all occurrences");
        Ok(total)
    }
}

fn snapshot<T: ReadTxn>(session: &SearchSession, txn: &T) -> Result<FindResult> {
    let Some(index) = session.index() else {
        return Ok(FindResult {
            current: None,
            occurrences: Vec::new(),
            current_index: 0,
            total: 0,
        });
    };

    let occurrences = index
        .occurrences()
        .iter()
        .map(|occurrence| occurrence.info(txn))
        .collect::<Result<Vec<_>>>()?;
    let current = occurrences.get(index.cursor()).cloned();
    Ok(FindResult {
        current,
        current_index: index.cursor(),
        total: occurrences.len(),
        occurrences,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use yrs::Transact;

    use super::*;
    use crate::editor::{MarkerGroup, ResolvedRange, Viewport};

    fn setup(markup: &str) -> (FindReplace, Editor, SearchSession) {
        let config = FindReplaceConfig::default();
        let mut editor = Editor::new(&config);
        editor.load_markup(markup).unwrap();
        (FindReplace::new(config), editor, SearchSession::new())
    }

    fn found(outcome: Option<Outcome>) -> FindResult {
        match outcome {
            Some(Outcome::Found(result)) => result,
            other => panic!("expected a find result, got {other:?}"),
        }
    }

    fn find(
        command: &FindReplace,
        editor: &mut Editor,
        session: &mut SearchSession,
        text: &str,
        increment: i64,
    ) -> FindResult {
        found(
            command
                .execute(editor, session, ExecuteOptions::find(text, increment))
                .unwrap(),
        )
    }

    fn current_marker_offsets(editor: &Editor) -> Vec<(u32, u32)> {
        let highlights = editor.read(|txn| editor.markers().highlights(txn)).unwrap();
        highlights
            .iter()
            .filter(|highlight| highlight.class == "current")
            .map(|highlight| (highlight.range.start.offset, highlight.range.end.offset))
            .collect()
    }

    #[test]
    fn test_empty_find_text_is_a_no_op() {
        let (command, mut editor, mut session) = setup("<paragraph>abc</paragraph>");
        let outcome = command
            .execute(&mut editor, &mut session, ExecuteOptions::find("", 1))
            .unwrap();

        assert!(outcome.is_none());
        assert!(session.last_key().is_none());
        assert!(editor.markers().is_empty());
    }

    #[test]
    fn test_find_builds_index_and_marks_first_occurrence() {
        let (command, mut editor, mut session) = setup("<paragraph>abcabcabc</paragraph>");
        let result = find(&command, &mut editor, &mut session, "abc", 1);

        assert_eq!(result.total, 3);
        assert_eq!(result.current_index, 0);
        let offsets: Vec<u32> = result.occurrences.iter().map(|o| o.range.start.offset).collect();
        assert_eq!(offsets, vec![0, 3, 6]);
        assert_eq!(editor.markers().count(MarkerGroup::Search), 3);
        assert_eq!(current_marker_offsets(&editor), vec![(0, 3)]);
    }

    #[test]
    fn test_forward_navigation_cycles_back_to_start() {
        let (command, mut editor, mut session) = setup("<paragraph>x x x</paragraph>");
        let first = find(&command, &mut editor, &mut session, "x", 1);
        assert_eq!(first.current_index, 0);

        let cursors: Vec<usize> = (0..3)
            .map(|_| find(&command, &mut editor, &mut session, "x", 1).current_index)
            .collect();
        assert_eq!(cursors, vec![1, 2, 0]);
        assert_eq!(editor.markers().count(MarkerGroup::CurrentSearch), 1);
    }

    #[test]
    fn test_backward_navigation_wraps_to_last() {
        let (command, mut editor, mut session) = setup("<paragraph>x x x</paragraph>");
        find(&command, &mut editor, &mut session, "x", 1);

        let result = find(&command, &mut editor, &mut session, "x", -1);
        assert_eq!(result.current_index, 2);
        assert_eq!(current_marker_offsets(&editor), vec![(4, 5)]);
    }

    #[test]
    fn test_changing_case_sensitivity_rebuilds() {
        let (command, mut editor, mut session) = setup("<paragraph>Hello hello</paragraph>");
        let insensitive = find(&command, &mut editor, &mut session, "hello", 1);
        assert_eq!(insensitive.total, 2);

        let sensitive = found(
            command
                .execute(
                    &mut editor,
                    &mut session,
                    ExecuteOptions::find("hello", 1).match_case(true),
                )
                .unwrap(),
        );
        assert_eq!(sensitive.total, 1);
        assert_eq!(sensitive.current_index, 0);
        assert_eq!(sensitive.occurrences[0].range.start.offset, 6);
    }

    #[test]
    fn test_no_match_leaves_no_current_marker() {
        let (command, mut editor, mut session) = setup("<paragraph>abc</paragraph>");
        find(&command, &mut editor, &mut session, "b", 1);
        assert_eq!(editor.markers().count(MarkerGroup::CurrentSearch), 1);

        let result = find(&command, &mut editor, &mut session, "zzz", 1);
        assert_eq!(result.total, 0);
        assert!(result.current.is_none());
        assert!(editor.markers().is_empty());
        assert!(session.current_marker().is_none());
    }

    #[test]
    fn test_inline_object_blocks_match() {
        let (command, mut editor, mut session) =
            setup("<paragraph>fo<image src=\"x.png\"/>o foo</paragraph>");
        let result = find(&command, &mut editor, &mut session, "foo", 1);

        assert_eq!(result.total, 1);
        assert_eq!(result.occurrences[0].range.start.path, vec![0, 2]);
    }

    #[test]
    fn test_first_replace_only_locates() {
        let (command, mut editor, mut session) = setup("<paragraph>ab ab</paragraph>");
        let options = ExecuteOptions::find("ab", 1).replace_with("X");

        let result = found(command.execute(&mut editor, &mut session, options.clone()).unwrap());
        assert_eq!(result.total, 2);
        assert_eq!(editor.content().unwrap(), "ab ab");

        let result = found(command.execute(&mut editor, &mut session, options).unwrap());
        assert_eq!(editor.content().unwrap(), "X ab");
        assert_eq!(result.total, 1);
        assert_eq!(result.current_index, 0);
        assert_eq!(result.current.unwrap().range.start.offset, 2);
    }

    #[test]
    fn test_replace_one_consumes_exactly_one_occurrence() {
        let (command, mut editor, mut session) = setup("<paragraph>a1 a2 a3 a4</paragraph>");
        find(&command, &mut editor, &mut session, "a", 1);
        let before = find(&command, &mut editor, &mut session, "a", 1);
        assert_eq!(before.current_index, 1);
        let labels_before: Vec<String> = before.occurrences.iter().map(|o| o.label.clone()).collect();

        let options = ExecuteOptions::find("a", 0).replace_with("b");
        let after = found(command.execute(&mut editor, &mut session, options).unwrap());

        assert_eq!(editor.content().unwrap(), "a1 b2 a3 a4");
        assert_eq!(after.total, before.total - 1);
        let labels_after: Vec<String> = after.occurrences.iter().map(|o| o.label.clone()).collect();
        let expected: Vec<String> = labels_before
            .iter()
            .filter(|label| **label != labels_before[1])
            .cloned()
            .collect();
        assert_eq!(labels_after, expected);
        // the cursor now sits on what used to be the next occurrence
        assert_eq!(after.current_index, 1);
        assert_eq!(after.current.unwrap().range.start.offset, 6);
        assert_eq!(editor.markers().count(MarkerGroup::Search), 3);
        assert_eq!(editor.markers().count(MarkerGroup::CurrentSearch), 1);
    }

    #[test]
    fn test_replace_one_forward_step_is_compensated() {
        let (command, mut editor, mut session) = setup("<paragraph>a a a</paragraph>");
        find(&command, &mut editor, &mut session, "a", 1);

        let options = ExecuteOptions::find("a", 1).replace_with("b");
        let result = found(command.execute(&mut editor, &mut session, options).unwrap());
        assert_eq!(editor.content().unwrap(), "b a a");
        assert_eq!(result.current_index, 0);
        assert_eq!(result.current.unwrap().range.start.offset, 2);
    }

    #[test]
    fn test_replace_one_backwards_wraps() {
        let (command, mut editor, mut session) = setup("<paragraph>a a a</paragraph>");
        find(&command, &mut editor, &mut session, "a", 1);

        let options = ExecuteOptions::find("a", -1).replace_with("b");
        let result = found(command.execute(&mut editor, &mut session, options).unwrap());
        assert_eq!(editor.content().unwrap(), "b a a");
        assert_eq!(result.total, 2);
        assert_eq!(result.current_index, 1);
        assert_eq!(result.current.unwrap().range.start.offset, 4);
    }

    #[test]
    fn test_replacing_last_occurrence_rebuilds_empty() {
        let (command, mut editor, mut session) = setup("<paragraph>one</paragraph>");
        let options = ExecuteOptions::find("one", 0).replace_with("two");
        command.execute(&mut editor, &mut session, options.clone()).unwrap();

        let result = found(command.execute(&mut editor, &mut session, options).unwrap());
        assert_eq!(editor.content().unwrap(), "two");
        assert_eq!(result.total, 0);
        assert!(editor.markers().is_empty());
    }

    #[test]
    fn test_replace_all_replaces_everything() {
        let (command, mut editor, mut session) = setup("<paragraph>ab ab ab</paragraph>");
        let outcome = command
            .execute(
                &mut editor,
                &mut session,
                ExecuteOptions::find("ab", 1).replace_with("X").all(),
            )
            .unwrap();

        assert_eq!(outcome, Some(Outcome::ReplacedAll { total: 3 }));
        assert_eq!(editor.content().unwrap(), "X X X");
        assert!(editor.markers().is_empty());
        assert!(session.index().is_none());
    }

    #[test]
    fn test_replace_all_ignores_cursor_position() {
        let (command, mut editor, mut session) =
            setup("<paragraph>ab ab</paragraph><paragraph>ab</paragraph>");
        find(&command, &mut editor, &mut session, "ab", 1);
        find(&command, &mut editor, &mut session, "ab", 1);

        let outcome = command
            .execute(
                &mut editor,
                &mut session,
                ExecuteOptions::find("ab", 1).replace_with("abab").all(),
            )
            .unwrap();

        assert_eq!(outcome.map(|o| o.total()), Some(3));
        assert_eq!(editor.content().unwrap(), "abab abab\nabab");
    }

    // 非 ASCII 文字：é 與漢字各佔一個 UTF-16 單位，😀 佔兩個
    const MIXED: &str = "<paragraph>é ab 漢字 ab 😀ab</paragraph>";

    #[test]
    fn test_find_reports_utf16_offsets_in_mixed_text() {
        let (command, mut editor, mut session) = setup(MIXED);
        let result = find(&command, &mut editor, &mut session, "ab", 1);

        assert_eq!(result.total, 3);
        let offsets: Vec<(u32, u32)> = result
            .occurrences
            .iter()
            .map(|o| (o.range.start.offset, o.range.end.offset))
            .collect();
        assert_eq!(offsets, vec![(2, 4), (8, 10), (13, 15)]);
        assert!(result.occurrences.iter().all(|o| o.text == "ab"));

        let last = find(&command, &mut editor, &mut session, "ab", -1);
        assert_eq!(last.current_index, 2);
        assert_eq!(current_marker_offsets(&editor), vec![(13, 15)]);
    }

    #[test]
    fn test_case_insensitive_find_in_accented_text() {
        let (command, mut editor, mut session) = setup("<paragraph>ÉCOLE école</paragraph>");
        let result = find(&command, &mut editor, &mut session, "école", 1);

        assert_eq!(result.total, 2);
        assert_eq!(result.occurrences[0].text, "ÉCOLE");
        assert_eq!(result.occurrences[1].range.start.offset, 6);
    }

    #[test]
    fn test_replace_one_in_mixed_text() {
        let (command, mut editor, mut session) = setup(MIXED);
        let options = ExecuteOptions::find("ab", 1).replace_with("Ω");
        command.execute(&mut editor, &mut session, options.clone()).unwrap();

        let result = found(command.execute(&mut editor, &mut session, options.clone()).unwrap());
        assert_eq!(editor.content().unwrap(), "é Ω 漢字 ab 😀ab");
        assert_eq!(result.total, 2);
        let current = result.current.unwrap();
        assert_eq!(current.text, "ab");
        assert_eq!(current.range.start.offset, 7);

        let result = found(command.execute(&mut editor, &mut session, options).unwrap());
        assert_eq!(editor.content().unwrap(), "é Ω 漢字 Ω 😀ab");
        assert_eq!(result.total, 1);
        let current = result.current.unwrap();
        assert_eq!(current.text, "ab");
        assert_eq!((current.range.start.offset, current.range.end.offset), (11, 13));
    }

    #[test]
    fn test_replace_all_in_mixed_text() {
        let (command, mut editor, mut session) = setup(MIXED);
        let outcome = command
            .execute(
                &mut editor,
                &mut session,
                ExecuteOptions::find("ab", 1).replace_with("😀").all(),
            )
            .unwrap();

        assert_eq!(outcome, Some(Outcome::ReplacedAll { total: 3 }));
        assert_eq!(editor.content().unwrap(), "é 😀 漢字 😀 😀😀");
        assert!(editor.markers().is_empty());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (command, mut editor, mut session) = setup("<paragraph>x x</paragraph>");
        find(&command, &mut editor, &mut session, "x", 1);

        for _ in 0..2 {
            command.reset(&mut editor, &mut session).unwrap();
            assert!(session.index().is_none());
            assert!(session.current_marker().is_none());
            assert!(editor.markers().is_empty());
        }
    }

    #[test]
    fn test_find_after_reset_rebuilds() {
        let (command, mut editor, mut session) = setup("<paragraph>x x</paragraph>");
        find(&command, &mut editor, &mut session, "x", 1);
        find(&command, &mut editor, &mut session, "x", 1);
        command.reset(&mut editor, &mut session).unwrap();

        let result = find(&command, &mut editor, &mut session, "x", 1);
        assert_eq!(result.current_index, 0);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn test_busy_document_is_a_transaction_error() {
        let (command, mut editor, mut session) = setup("<paragraph>x</paragraph>");
        let doc = editor.doc().clone();
        let _reader = doc.transact();

        let result = command.execute(&mut editor, &mut session, ExecuteOptions::find("x", 1));
        assert!(matches!(result, Err(Error::Transaction(_))));
    }

    #[derive(Clone, Default)]
    struct RecordingViewport(Rc<RefCell<Vec<(ResolvedRange, u32)>>>);

    impl Viewport for RecordingViewport {
        fn scroll_to(&mut self, target: &ResolvedRange, offset: u32) {
            self.0.borrow_mut().push((target.clone(), offset));
        }
    }

    #[test]
    fn test_find_scrolls_to_current_occurrence() {
        let viewport = RecordingViewport::default();
        let config = FindReplaceConfig::default();
        let mut editor = Editor::new(&config).with_viewport(viewport.clone());
        editor.load_markup("<paragraph>no yes</paragraph>").unwrap();
        let command = FindReplace::new(config);
        let mut session = SearchSession::new();

        find(&command, &mut editor, &mut session, "yes", 1);
        find(&command, &mut editor, &mut session, "absent", 1);

        let scrolls = viewport.0.borrow();
        assert_eq!(scrolls.len(), 1);
        assert_eq!(scrolls[0].0.start.offset, 3);
        assert_eq!(scrolls[0].1, 130);
    }
}
