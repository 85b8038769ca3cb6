use serde::Serialize;
use yrs::{Assoc, ReadTxn};

use super::matcher::find_matches;
use super::session::SearchKey;
use crate::editor::{ChangeWriter, MarkerGroup, Range, TagHandle, create_position, walk};
use crate::editor::position::{ResolvedRange, TextSpan};
use crate::error::Result;

/// 所有匹配標籤共用的標記前綴
pub const SEARCH_MARKER: &str = "search";

/// 一個找到的匹配
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// `search:<term>:<n>`，此匹配繪製時使用的標記名稱
    pub label: String,
    /// 建立索引時的順序
    pub order: usize,
    pub tag: TagHandle,
    pub range: Range,
}

/// 呼叫端看得到的匹配資訊：標籤、目前的文字與位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccurrenceInfo {
    pub label: String,
    pub order: usize,
    pub text: String,
    pub range: ResolvedRange,
}

impl Occurrence {
    pub fn info<T: ReadTxn>(&self, txn: &T) -> Result<OccurrenceInfo> {
        Ok(OccurrenceInfo {
            label: self.label.clone(),
            order: self.order,
            text: self.range.text(txn)?,
            range: self.range.resolve(txn)?,
        })
    }
}

/// 一次搜尋的所有匹配（依文檔順序）以及游標
#[derive(Debug, Clone)]
pub struct OccurrenceIndex {
    key: SearchKey,
    occurrences: Vec<Occurrence>,
    cursor: usize,
}

impl OccurrenceIndex {
    pub fn key(&self) -> &SearchKey {
        &self.key
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Occurrence> {
        self.occurrences.get(self.cursor)
    }

    /// 將游標移動 `increment` 步，兩端皆循環
    ///
    /// # Arguments
    /// * `increment` - 任意步數，包含 `i64::MIN` 與 `i64::MAX`
    ///
    /// # Returns
    /// 新的游標位置；索引為空時回傳 `None` 且游標不動
    pub fn advance(&mut self, increment: i64) -> Option<usize> {
        if self.occurrences.is_empty() {
            return None;
        }
        let len = self.occurrences.len() as i64;
        // 先把步數縮到 [0, len)，相加時才不會溢位
        let step = increment.rem_euclid(len);
        self.cursor = (self.cursor as i64 + step).rem_euclid(len) as usize;
        Some(self.cursor)
    }

    /// 移除游標下的匹配
    ///
    /// 游標數值不變，在下一次 [`OccurrenceIndex::advance`] 之前可能指到結尾之後。
    pub(crate) fn remove_current(&mut self) -> Option<Occurrence> {
        if self.cursor < self.occurrences.len() {
            Some(self.occurrences.remove(self.cursor))
        } else {
            None
        }
    }
}

/// 建立匹配索引
///
/// 走訪整個 fragment，把 `key` 的每個匹配標記為搜尋標記，
/// 回傳游標停在第一個匹配上的新索引。
///
/// # Arguments
/// * `writer` - 目前的寫入交易與暫存標記
/// * `key` - 搜尋字詞與大小寫設定
pub(crate) fn build_index(writer: &mut ChangeWriter<'_>, key: SearchKey) -> Result<OccurrenceIndex> {
    let chunks: Vec<_> = walk(&writer.txn, writer.fragment).text_chunks().collect();

    let mut occurrences = Vec::new();
    for chunk in &chunks {
        for matched in find_matches(&chunk.text, &key.term, key.match_case) {
            let mut spans = Vec::new();
            for slice in chunk.slices(matched) {
                let node = &slice.run.node;
                let path = &slice.run.path;
                spans.push(TextSpan {
                    start: create_position(&mut writer.txn, node, path.clone(), slice.start, Assoc::After)?,
                    end: create_position(&mut writer.txn, node, path.clone(), slice.end, Assoc::Before)?,
                });
            }
            let Some(range) = Range::from_spans(spans) else {
                continue;
            };

            let order = occurrences.len();
            let label = format!("{SEARCH_MARKER}:{}:{order}", key.term);
            let tag = writer
                .markers
                .add_tag(label.clone(), MarkerGroup::Search, range.clone());
            occurrences.push(Occurrence {
                label,
                order,
                tag,
                range,
            });
        }
    }

    Ok(OccurrenceIndex {
        key,
        occurrences,
        cursor: 0,
    })
}
