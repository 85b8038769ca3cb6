use std::sync::Arc;

use yrs::types::xml::XmlFragmentRef;
use yrs::{Doc, OffsetKind, Options, Transact, Transaction, TransactionMut};

use super::markers::{MarkerBatch, MarkerStore};
use super::position::ResolvedRange;
use super::read::extract_text_from_fragment;
use crate::config::FindReplaceConfig;
use crate::error::{Error, Result};
use crate::helper_utils::xml;

// ============================================================================
// Viewport
// ============================================================================

/// 接收定位到匹配時的捲動請求
pub trait Viewport {
    fn scroll_to(&mut self, target: &ResolvedRange, offset: u32);
}

/// 沒有掛載任何畫面的編輯器所用的 viewport
#[derive(Debug, Default)]
pub struct DetachedViewport;

impl Viewport for DetachedViewport {
    fn scroll_to(&mut self, _target: &ResolvedRange, _offset: u32) {}
}

// ============================================================================
// Editor
// ============================================================================

/// 搜尋引擎操作的文檔
///
/// 包含共享的 `yrs` Doc、其中的根 XML fragment、疊加在上面的標記，
/// 以及顯示它的 viewport。
pub struct Editor {
    doc: Arc<Doc>,
    fragment: XmlFragmentRef,
    markers: MarkerStore,
    viewport: Box<dyn Viewport>,
}

/// 交給 [`Editor::change`] 閉包使用：一個寫入交易加上一批暫存的標記變更
pub struct ChangeWriter<'a> {
    pub txn: TransactionMut<'a>,
    pub fragment: &'a XmlFragmentRef,
    pub markers: MarkerBatch<'a>,
}

impl Editor {
    /// 以新的文檔建立編輯器
    ///
    /// 文檔以 UTF-16 單位計算位置，與 [`StickyIndex`](yrs::StickyIndex) 回報的位置一致。
    ///
    /// # Arguments
    /// * `config` - 提供根 fragment 名稱
    pub fn new(config: &FindReplaceConfig) -> Self {
        let doc = Doc::with_options(Options {
            offset_kind: OffsetKind::Utf16,
            ..Options::default()
        });
        Self::from_doc(Arc::new(doc), &config.fragment)
    }

    /// 包裝既有文檔
    ///
    /// 文檔必須以 [`OffsetKind::Utf16`] 建立，否則非 ASCII 文字的位置會錯亂。
    pub fn from_doc(doc: Arc<Doc>, fragment_name: &str) -> Self {
        let fragment = doc.get_or_insert_xml_fragment(fragment_name);
        Self {
            doc,
            fragment,
            markers: MarkerStore::default(),
            viewport: Box::new(DetachedViewport),
        }
    }

    pub fn with_viewport(mut self, viewport: impl Viewport + 'static) -> Self {
        self.viewport = Box::new(viewport);
        self
    }

    pub fn doc(&self) -> &Arc<Doc> {
        &self.doc
    }

    pub fn fragment(&self) -> &XmlFragmentRef {
        &self.fragment
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    /// 以標記語言內容取代整個 fragment
    pub fn load_markup(&mut self, markup: &str) -> Result<()> {
        self.change(|writer| xml::replace_fragment_markup(&mut writer.txn, writer.fragment, markup))
    }

    pub fn to_markup(&self) -> Result<String> {
        self.read(|txn| Ok(xml::fragment_to_markup(txn, &self.fragment)))
    }

    /// 文檔的純文字內容，每個區塊一行
    pub fn content(&self) -> Result<String> {
        self.read(|txn| Ok(extract_text_from_fragment(&self.fragment, txn)))
    }

    pub fn read<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R>,
    {
        let txn = self
            .doc
            .try_transact()
            .map_err(|e| Error::Transaction(e.to_string()))?;
        f(&txn)
    }

    /// 在單一寫入交易中執行 `f`
    ///
    /// 只有 `f` 回傳 `Ok` 時才發佈標記變更；文檔編輯則在交易結束時一律提交。
    ///
    /// # Returns
    /// 文檔正被其他交易占用時回傳 [`Error::Transaction`]
    pub fn change<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut ChangeWriter<'_>) -> Result<R>,
    {
        let txn = self
            .doc
            .try_transact_mut()
            .map_err(|e| Error::Transaction(e.to_string()))?;
        let mut writer = ChangeWriter {
            txn,
            fragment: &self.fragment,
            markers: self.markers.batch(),
        };

        let result = f(&mut writer)?;

        let ChangeWriter { txn, markers, .. } = writer;
        markers.commit();
        drop(txn);
        Ok(result)
    }

    pub(crate) fn scroll_to(&mut self, target: &ResolvedRange, offset: u32) {
        self.viewport.scroll_to(target, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::markers::MarkerGroup;
    use crate::editor::position::{Range, create_position};
    use yrs::{Assoc, XmlTextRef};

    fn first_text(writer: &ChangeWriter<'_>) -> XmlTextRef {
        use yrs::XmlFragment;
        use yrs::types::xml::XmlOut;

        let Some(XmlOut::Element(para)) = writer.fragment.get(&writer.txn, 0) else {
            panic!("expected a paragraph");
        };
        let Some(XmlOut::Text(text)) = para.get(&writer.txn, 0) else {
            panic!("expected a text node");
        };
        text
    }

    #[test]
    fn test_load_markup_and_read_content() {
        let mut editor = Editor::new(&FindReplaceConfig::default());
        editor
            .load_markup("<paragraph>one</paragraph><paragraph>two</paragraph>")
            .unwrap();

        assert_eq!(editor.content().unwrap(), "one\ntwo");
    }

    #[test]
    fn test_failed_change_discards_staged_markers() {
        let mut editor = Editor::new(&FindReplaceConfig::default());
        editor.load_markup("<paragraph>abc</paragraph>").unwrap();

        let result: Result<()> = editor.change(|writer| {
            let text = first_text(writer);
            let start = create_position(&mut writer.txn, &text, vec![0, 0], 0, Assoc::After)?;
            let end = create_position(&mut writer.txn, &text, vec![0, 0], 1, Assoc::Before)?;
            writer
                .markers
                .add_tag("search:a:0", MarkerGroup::Search, Range::new(start, end));
            Err(Error::StaleRange)
        });

        assert!(matches!(result, Err(Error::StaleRange)));
        assert!(editor.markers().is_empty());
    }

    #[test]
    fn test_positions_count_utf16_units() {
        let mut editor = Editor::new(&FindReplaceConfig::default());
        editor.load_markup("<paragraph>é😀ab</paragraph>").unwrap();

        let text = editor
            .change(|writer| {
                let node = first_text(writer);
                let start = create_position(&mut writer.txn, &node, vec![0, 0], 1, Assoc::After)?;
                let end = create_position(&mut writer.txn, &node, vec![0, 0], 4, Assoc::Before)?;
                let range = Range::new(start, end);
                assert_eq!(range.start().offset(&writer.txn)?, 1);
                assert_eq!(range.end().offset(&writer.txn)?, 4);
                range.text(&writer.txn)
            })
            .unwrap();

        assert_eq!(text, "😀a");
    }

    #[test]
    fn test_committed_change_publishes_markers() {
        let mut editor = Editor::new(&FindReplaceConfig::default());
        editor.load_markup("<paragraph>abc</paragraph>").unwrap();

        editor
            .change(|writer| {
                let text = first_text(writer);
                let start = create_position(&mut writer.txn, &text, vec![0, 0], 1, Assoc::After)?;
                let end = create_position(&mut writer.txn, &text, vec![0, 0], 3, Assoc::Before)?;
                writer
                    .markers
                    .add_tag("search:bc:0", MarkerGroup::Search, Range::new(start, end));
                Ok(())
            })
            .unwrap();

        assert_eq!(editor.markers().count(MarkerGroup::Search), 1);
        let highlights = editor
            .read(|txn| editor.markers().highlights(txn))
            .unwrap();
        assert_eq!(highlights[0].class, "search-item");
        assert_eq!(highlights[0].range.start.offset, 1);
        assert_eq!(highlights[0].range.end.offset, 3);
    }
}
