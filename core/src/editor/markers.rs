use serde::Serialize;
use strum::{AsRefStr, Display};
use yrs::ReadTxn;

use super::position::{Range, ResolvedRange};
use crate::error::Result;

/// 編輯器認得的標記群組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MarkerGroup {
    /// 所有找到的匹配
    Search,
    /// 游標目前指向的那一個匹配
    CurrentSearch,
}

impl MarkerGroup {
    /// 畫面層繪製此群組所用的 CSS class
    pub fn highlight_class(self) -> &'static str {
        match self {
            MarkerGroup::Search => "search-item",
            MarkerGroup::CurrentSearch => "current",
        }
    }

    /// 優先度越高越晚繪製（疊在上層）
    pub fn priority(self) -> u8 {
        match self {
            MarkerGroup::Search => 10,
            MarkerGroup::CurrentSearch => 99,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TagHandle(u64);

#[derive(Debug, Clone)]
pub struct Marker {
    pub handle: TagHandle,
    pub name: String,
    pub group: MarkerGroup,
    pub range: Range,
}

#[derive(Debug, Clone, Serialize)]
pub struct Highlight {
    pub name: String,
    pub class: &'static str,
    pub priority: u8,
    pub range: ResolvedRange,
}

/// 疊加在文檔範圍上的具名標記
///
/// 只能透過 [`MarkerBatch`] 修改，批次提交之前暫存的變更都看不到。
#[derive(Debug, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    next_handle: u64,
}

impl MarkerStore {
    pub fn get(&self, handle: TagHandle) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.handle == handle)
    }

    /// 依插入順序列出 `group` 的標記
    pub fn list_group(&self, group: MarkerGroup) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |marker| marker.group == group)
    }

    pub fn count(&self, group: MarkerGroup) -> usize {
        self.list_group(group).count()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// 將所有標記解析成畫面層可以繪製的高亮
    ///
    /// # Returns
    /// 任一標記的錨點失效時回傳 [`crate::Error::StaleRange`]
    pub fn highlights<T: ReadTxn>(&self, txn: &T) -> Result<Vec<Highlight>> {
        self.markers
            .iter()
            .map(|marker| {
                Ok(Highlight {
                    name: marker.name.clone(),
                    class: marker.group.highlight_class(),
                    priority: marker.group.priority(),
                    range: marker.range.resolve(txn)?,
                })
            })
            .collect()
    }

    pub(crate) fn batch(&mut self) -> MarkerBatch<'_> {
        MarkerBatch {
            staged: self.markers.clone(),
            next_handle: self.next_handle,
            store: self,
        }
    }
}

/// 暫存的標記變更，未呼叫 [`MarkerBatch::commit`] 就丟棄即全部作廢
pub struct MarkerBatch<'a> {
    store: &'a mut MarkerStore,
    staged: Vec<Marker>,
    next_handle: u64,
}

impl MarkerBatch<'_> {
    pub fn add_tag(&mut self, name: impl Into<String>, group: MarkerGroup, range: Range) -> TagHandle {
        let handle = TagHandle(self.next_handle);
        self.next_handle += 1;
        self.staged.push(Marker {
            handle,
            name: name.into(),
            group,
            range,
        });
        handle
    }

    /// 找不到 `handle` 對應的標記時回傳 `false`
    pub fn remove_tag(&mut self, handle: TagHandle) -> bool {
        let before = self.staged.len();
        self.staged.retain(|marker| marker.handle != handle);
        self.staged.len() != before
    }

    /// 移除 `group` 的所有標記，回傳移除的數量
    pub fn remove_group(&mut self, group: MarkerGroup) -> usize {
        let before = self.staged.len();
        self.staged.retain(|marker| marker.group != group);
        before - self.staged.len()
    }

    pub fn commit(self) {
        self.store.markers = self.staged;
        self.store.next_handle = self.next_handle;
    }
}
