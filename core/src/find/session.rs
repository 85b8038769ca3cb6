use serde::{Deserialize, Serialize};

use super::occurrences::OccurrenceIndex;
use crate::editor::markers::MarkerBatch;
use crate::editor::{MarkerGroup, Range, TagHandle};

/// 目前匹配高亮所用的標記名稱
pub const CURRENT_SEARCH_MARKER: &str = "current_search";

/// 判斷兩個請求是否為「同一個搜尋」的依據
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchKey {
    pub term: String,
    pub match_case: bool,
}

/// 由呼叫端持有、每次呼叫指令時傳入的搜尋狀態
///
/// 多個 session 可以各自搜尋同一個編輯器，但它們共用編輯器的標記群組，
/// 同一時間只應有一個在繪製。
#[derive(Debug, Default)]
pub struct SearchSession {
    last: Option<SearchKey>,
    index: Option<OccurrenceIndex>,
    current_marker: Option<TagHandle>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次送出的搜尋
    pub fn last_key(&self) -> Option<&SearchKey> {
        self.last.as_ref()
    }

    pub fn index(&self) -> Option<&OccurrenceIndex> {
        self.index.as_ref()
    }

    pub fn current_marker(&self) -> Option<TagHandle> {
        self.current_marker
    }

    /// 記錄 `key` 為最近一次搜尋
    ///
    /// # Returns
    /// `true` 如果與上一次相同
    pub(crate) fn submit(&mut self, key: &SearchKey) -> bool {
        let same = self.last.as_ref() == Some(key);
        self.last = Some(key.clone());
        same
    }

    /// 目前的索引是否屬於 `key` 且不為空
    pub(crate) fn can_navigate(&self, key: &SearchKey) -> bool {
        self.index
            .as_ref()
            .is_some_and(|index| index.key() == key && !index.is_empty())
    }

    pub(crate) fn index_mut(&mut self) -> Option<&mut OccurrenceIndex> {
        self.index.as_mut()
    }

    pub(crate) fn set_index(&mut self, index: OccurrenceIndex) {
        self.index = Some(index);
    }

    /// 將目前匹配的標記移到 `range`
    ///
    /// 先移除舊的標記再加入新的，傳入 `None` 則只移除。
    pub(crate) fn set_current_marker(&mut self, markers: &mut MarkerBatch<'_>, range: Option<Range>) {
        if let Some(previous) = self.current_marker.take() {
            markers.remove_tag(previous);
        }
        self.current_marker =
            range.map(|range| markers.add_tag(CURRENT_SEARCH_MARKER, MarkerGroup::CurrentSearch, range));
    }

    /// 清除索引與所有搜尋標記，保留最近一次的搜尋
    pub(crate) fn discard(&mut self, markers: &mut MarkerBatch<'_>) {
        markers.remove_group(MarkerGroup::Search);
        markers.remove_group(MarkerGroup::CurrentSearch);
        self.index = None;
        self.current_marker = None;
    }
}
